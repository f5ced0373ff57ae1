//! Stopping rule and verdicts.
//!
//! Rules are checked in a fixed order after every response; the first that
//! matches decides:
//!
//! 1. elapsed time at or past the ceiling ends the exam on the threshold test
//! 2. fewer than the minimum items keeps the exam running
//! 3. reaching the item cap ends the exam on the threshold test (inconclusive)
//! 4. a 95% interval strictly above or below the cut ends the exam

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::CatConfig;
use crate::estimator::{score_to_ability, AbilityEstimate};

/// Outcome reported to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    InProgress,
    Pass,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::InProgress => write!(f, "IN_PROGRESS"),
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
        }
    }
}

/// Why an exam ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TimeLimit,
    MaxItems,
    ConfidenceResolved,
    BankExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::TimeLimit => write!(f, "time limit reached"),
            StopReason::MaxItems => write!(f, "maximum items reached"),
            StopReason::ConfidenceResolved => write!(f, "confidence interval resolved"),
            StopReason::BankExhausted => write!(f, "item bank exhausted"),
        }
    }
}

/// A terminal outcome. `verdict` is always `Pass` or `Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Termination {
    pub verdict: Verdict,
    pub reason: StopReason,
}

impl Termination {
    /// The verdict was forced by a hard limit before confidence resolved.
    pub fn is_inconclusive(&self) -> bool {
        matches!(self.reason, StopReason::MaxItems | StopReason::BankExhausted)
    }
}

/// State of an exam attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExamStatus {
    InProgress,
    Ended(Termination),
}

impl ExamStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExamStatus::Ended(_))
    }

    pub fn verdict(&self) -> Verdict {
        match self {
            ExamStatus::InProgress => Verdict::InProgress,
            ExamStatus::Ended(t) => t.verdict,
        }
    }

    pub fn termination(&self) -> Option<Termination> {
        match self {
            ExamStatus::InProgress => None,
            ExamStatus::Ended(t) => Some(*t),
        }
    }

    /// State-machine label.
    pub fn label(&self) -> &'static str {
        match self {
            ExamStatus::InProgress => "IN_PROGRESS",
            ExamStatus::Ended(t) if t.reason == StopReason::MaxItems => {
                "ENDED_INCONCLUSIVE_MAX_ITEMS"
            }
            ExamStatus::Ended(t) if t.verdict == Verdict::Pass => "ENDED_PASS",
            ExamStatus::Ended(_) => "ENDED_FAIL",
        }
    }
}

/// Inputs to one evaluation of the rule.
#[derive(Debug, Clone, Copy)]
pub struct StopContext {
    /// All administered items, pilot items included.
    pub administered_count: usize,
    pub estimate: AbilityEstimate,
    pub elapsed_secs: f64,
}

/// The stopping rule for one exam configuration.
#[derive(Debug, Clone)]
pub struct StoppingRule {
    min_items: usize,
    max_items: usize,
    time_limit_secs: f64,
    /// Passing threshold converted to the ability scale.
    ability_cut: f64,
}

impl StoppingRule {
    pub fn from_config(config: &CatConfig) -> Self {
        Self {
            min_items: config.min_scored_items,
            max_items: config.max_total_items,
            time_limit_secs: config.exam_time_limit_secs as f64,
            ability_cut: score_to_ability(config.passing_threshold),
        }
    }

    pub fn ability_cut(&self) -> f64 {
        self.ability_cut
    }

    /// Pass if ability is at or above the cut.
    pub fn threshold_verdict(&self, ability: f64) -> Verdict {
        if ability >= self.ability_cut {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    /// Termination forced by `reason`, decided on ability alone.
    pub fn forced(&self, reason: StopReason, ability: f64) -> Termination {
        Termination {
            verdict: self.threshold_verdict(ability),
            reason,
        }
    }

    /// Only the time ceiling; used before selecting an item.
    pub fn check_time_limit(&self, ctx: &StopContext) -> ExamStatus {
        if ctx.elapsed_secs >= self.time_limit_secs {
            ExamStatus::Ended(self.forced(StopReason::TimeLimit, ctx.estimate.ability))
        } else {
            ExamStatus::InProgress
        }
    }

    pub fn evaluate(&self, ctx: &StopContext) -> ExamStatus {
        let status = self.check_time_limit(ctx);
        if status.is_terminal() {
            return status;
        }

        if ctx.administered_count < self.min_items {
            return ExamStatus::InProgress;
        }

        let ability = ctx.estimate.ability;
        if ctx.administered_count >= self.max_items {
            return ExamStatus::Ended(self.forced(StopReason::MaxItems, ability));
        }

        let (lower, upper) = ctx.estimate.confidence_interval();
        let verdict = if lower > self.ability_cut {
            Verdict::Pass
        } else if upper < self.ability_cut {
            Verdict::Fail
        } else {
            return ExamStatus::InProgress;
        };

        ExamStatus::Ended(Termination {
            verdict,
            reason: StopReason::ConfidenceResolved,
        })
    }
}
