//! The exam session orchestrator.
//!
//! A [`CatSession`] owns the state of exactly one exam attempt and sequences
//! the selector, grader, estimator, and stopping rule. Sessions share nothing
//! mutable; the item bank is read-only behind an `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::bank::ItemBank;
use crate::clock::{Clock, SystemClock};
use crate::config::CatConfig;
use crate::error::{CatError, SubmissionRejection};
use crate::estimator::{AbilityEstimate, AbilityEstimator};
use crate::grader::{KeyGrader, ResponseGrader};
use crate::model::{Answer, Domain, Item, Response};
use crate::report::ExamReport;
use crate::selector::ItemSelector;
use crate::statistics::{compute_stats, domain_breakdown, DomainScore, ExamStats};
use crate::stopping::{ExamStatus, StopContext, StopReason, StoppingRule, Verdict};

/// One adaptive exam attempt.
pub struct CatSession {
    id: Uuid,
    bank: Arc<ItemBank>,
    config: CatConfig,
    selector: ItemSelector,
    stopping: StoppingRule,
    estimator: AbilityEstimator,
    grader: Arc<dyn ResponseGrader>,
    rng: Box<dyn RngCore + Send>,
    clock: Arc<dyn Clock>,
    administered: Vec<Item>,
    responses: Vec<Response>,
    /// Id of the item returned by the last `next_item` and not yet answered.
    pending: Option<String>,
    status: ExamStatus,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl CatSession {
    /// Start an attempt against `bank`. Grades with [`KeyGrader`], reads the
    /// system clock, and seeds the random source from entropy.
    pub fn new(bank: Arc<ItemBank>, config: CatConfig) -> Result<Self, CatError> {
        config.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let started_at = clock.now();

        Ok(Self {
            id: Uuid::new_v4(),
            selector: ItemSelector::from_config(&config),
            stopping: StoppingRule::from_config(&config),
            bank,
            config,
            estimator: AbilityEstimator::new(),
            grader: Arc::new(KeyGrader),
            rng: Box::new(ChaCha8Rng::from_entropy()),
            clock,
            administered: Vec::new(),
            responses: Vec::new(),
            pending: None,
            status: ExamStatus::InProgress,
            started_at,
            ended_at: None,
        })
    }

    /// Use a reproducible random source.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn with_rng<R: RngCore + Send + 'static>(mut self, rng: R) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_grader<G: ResponseGrader + 'static>(mut self, grader: G) -> Self {
        self.grader = Arc::new(grader);
        self
    }

    /// Replace the time source. The attempt's start time is re-read from it.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.started_at = clock.now();
        self.clock = clock;
        self
    }

    /// The next item to present, or `None` once the exam has ended.
    ///
    /// Repeated calls before a submission return the same item. The hard time
    /// limit is re-checked here, and an exhausted bank ends the exam with a
    /// verdict decided on the current ability.
    pub fn next_item(&mut self) -> Option<Item> {
        if self.status.is_terminal() {
            return None;
        }
        if let Some(id) = &self.pending {
            return self.bank.get(id).cloned();
        }

        let status = self.stopping.check_time_limit(&self.stop_context());
        if status.is_terminal() {
            self.finish(status);
            return None;
        }

        let ability = self.estimator.current().ability;
        match self
            .selector
            .select(&self.bank, &self.administered, ability, self.rng.as_mut())
        {
            Ok(item) => {
                let item = item.clone();
                tracing::debug!(
                    session = %self.id,
                    item = %item.id,
                    domain = %item.domain,
                    phase = ?self.selector.phase(self.administered.len()),
                    "item selected"
                );
                self.pending = Some(item.id.clone());
                Some(item)
            }
            Err(err) => {
                tracing::warn!(
                    session = %self.id,
                    administered = self.administered.len(),
                    "{err}, ending exam"
                );
                let termination = self.stopping.forced(StopReason::BankExhausted, ability);
                self.finish(ExamStatus::Ended(termination));
                None
            }
        }
    }

    /// Grade and record an answer to the pending item.
    ///
    /// Nothing is changed if the submission is rejected.
    pub fn submit_response(
        &mut self,
        item: &Item,
        answer: &Answer,
        time_spent_seconds: f64,
    ) -> Result<Response, CatError> {
        if self.status.is_terminal() {
            return Err(SubmissionRejection::ExamEnded.into());
        }
        let banked = match self.pending.as_deref() {
            None => return Err(SubmissionRejection::NoPendingItem.into()),
            Some(expected) if expected != item.id => {
                return Err(SubmissionRejection::ItemMismatch {
                    expected: expected.to_string(),
                    submitted: item.id.clone(),
                }
                .into())
            }
            Some(expected) => self
                .bank
                .get(expected)
                .cloned()
                .ok_or(SubmissionRejection::NoPendingItem)?,
        };
        if !(time_spent_seconds.is_finite() && time_spent_seconds >= 0.0) {
            return Err(SubmissionRejection::InvalidTimeSpent.into());
        }

        let is_correct = self.grader.grade(&banked, answer);
        let response = Response {
            item_id: banked.id.clone(),
            is_correct,
            time_spent_seconds,
            submitted_at: self.clock.now(),
        };

        let scored = !banked.is_pilot;
        self.pending = None;
        self.administered.push(banked);
        self.responses.push(response.clone());
        if scored {
            self.estimator.update(&self.administered, &self.responses);
        }

        tracing::debug!(
            session = %self.id,
            item = %response.item_id,
            correct = is_correct,
            pilot = !scored,
            administered = self.administered.len(),
            "response recorded"
        );

        let status = self.stopping.evaluate(&self.stop_context());
        if status.is_terminal() {
            self.finish(status);
        }

        Ok(response)
    }

    pub fn verdict(&self) -> Verdict {
        self.status.verdict()
    }

    pub fn status(&self) -> ExamStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Scored performance per domain.
    pub fn domain_breakdown(&self) -> BTreeMap<Domain, DomainScore> {
        domain_breakdown(&self.administered, &self.responses)
    }

    pub fn stats(&self) -> ExamStats {
        compute_stats(
            &self.administered,
            &self.responses,
            self.estimator.current(),
            self.elapsed_secs(),
        )
    }

    /// Snapshot of the attempt for persistence.
    pub fn report(&self) -> ExamReport {
        ExamReport::from_session(self)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &CatConfig {
        &self.config
    }

    pub fn estimate(&self) -> AbilityEstimate {
        self.estimator.current()
    }

    pub fn administered(&self) -> &[Item] {
        &self.administered
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Seconds since the start, frozen once the exam has ended.
    pub fn elapsed_secs(&self) -> f64 {
        let until = self.ended_at.unwrap_or_else(|| self.clock.now());
        (until - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    fn stop_context(&self) -> StopContext {
        StopContext {
            administered_count: self.administered.len(),
            estimate: self.estimator.current(),
            elapsed_secs: self.elapsed_secs(),
        }
    }

    fn finish(&mut self, status: ExamStatus) {
        self.status = status;
        self.pending = None;
        self.ended_at = Some(self.clock.now());
        if let Some(termination) = status.termination() {
            let estimate = self.estimator.current();
            tracing::info!(
                session = %self.id,
                verdict = %termination.verdict,
                reason = %termination.reason,
                inconclusive = termination.is_inconclusive(),
                ability = estimate.ability,
                standard_error = estimate.standard_error,
                administered = self.administered.len(),
                "exam ended"
            );
        }
    }
}
