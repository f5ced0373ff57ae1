//! Engine error types.
//!
//! Every failure the engine can report to its caller is a [`CatError`].
//! Submission failures carry a [`SubmissionRejection`] so the UI layer can
//! tell a stale item apart from an exam that has already ended.

use thiserror::Error;

/// Errors that can occur while configuring or running an exam session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatError {
    /// `submit_response` was called with an item that is not pending, or
    /// after the exam reached a terminal state.
    #[error("invalid submission: {0}")]
    InvalidSubmission(SubmissionRejection),

    /// The selector found no unadministered item.
    #[error("item bank exhausted")]
    ItemBankExhausted,

    /// The configuration is inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An item failed validation when the bank was built.
    #[error("invalid item '{id}': {reason}")]
    InvalidItem { id: String, reason: String },

    /// Two items in the bank share an id.
    #[error("duplicate item id: {0}")]
    DuplicateItemId(String),
}

/// Why a submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionRejection {
    /// No item is pending; `next_item` must be called first.
    #[error("no item is pending, call next_item first")]
    NoPendingItem,

    /// The submitted item is not the one returned by the last `next_item`.
    #[error("expected item '{expected}', got '{submitted}'")]
    ItemMismatch { expected: String, submitted: String },

    /// The exam already has a verdict.
    #[error("exam has already ended")]
    ExamEnded,

    /// Time spent was negative or not a number.
    #[error("time spent must be a finite, non-negative number of seconds")]
    InvalidTimeSpent,
}

impl CatError {
    /// Returns `true` if the caller can recover by re-fetching the next item
    /// or the verdict. Construction-time errors are not recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CatError::InvalidSubmission(_) | CatError::ItemBankExhausted
        )
    }
}

impl From<SubmissionRejection> for CatError {
    fn from(rejection: SubmissionRejection) -> Self {
        CatError::InvalidSubmission(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_errors_are_recoverable() {
        assert!(CatError::from(SubmissionRejection::NoPendingItem).is_recoverable());
        assert!(CatError::ItemBankExhausted.is_recoverable());
        assert!(!CatError::Configuration("bad".into()).is_recoverable());
        assert!(!CatError::DuplicateItemId("x".into()).is_recoverable());
    }

    #[test]
    fn mismatch_message_names_both_items() {
        let err = CatError::from(SubmissionRejection::ItemMismatch {
            expected: "sa-001".into(),
            submitted: "pa-002".into(),
        });
        let msg = err.to_string();
        assert!(msg.contains("sa-001"));
        assert!(msg.contains("pa-002"));
    }
}
