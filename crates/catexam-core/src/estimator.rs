//! Ability estimation.
//!
//! Uses a difficulty-weighted proportion-correct heuristic rather than
//! maximum-likelihood estimation over the 3PL model. The formula is part of
//! the exam's published scoring rules and must not change:
//!
//! ```text
//! weight_i = 2^b_i
//! p        = Σ(weight_i · correct_i) / Σ(weight_i)     over scored responses
//! θ        = (p − 0.5) · 3
//! SE       = 1 / sqrt(max(n_scored, 1))
//! ```

use serde::{Deserialize, Serialize};

use crate::model::{Item, Response};

/// Ability before any scored response.
pub const PRIOR_ABILITY: f64 = 0.0;
/// Standard error before any scored response.
pub const PRIOR_STANDARD_ERROR: f64 = 1.0;

/// Point estimate of ability and its standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityEstimate {
    pub ability: f64,
    pub standard_error: f64,
    /// Number of scored responses behind the estimate.
    pub scored_count: usize,
}

impl Default for AbilityEstimate {
    fn default() -> Self {
        Self {
            ability: PRIOR_ABILITY,
            standard_error: PRIOR_STANDARD_ERROR,
            scored_count: 0,
        }
    }
}

impl AbilityEstimate {
    /// 95% confidence interval on the ability scale.
    pub fn confidence_interval(&self) -> (f64, f64) {
        let half = 1.96 * self.standard_error;
        (self.ability - half, self.ability + half)
    }
}

/// Maintains the running estimate for a session.
#[derive(Debug, Clone, Default)]
pub struct AbilityEstimator {
    current: AbilityEstimate,
}

impl AbilityEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> AbilityEstimate {
        self.current
    }

    /// Recompute the estimate from the full, index-aligned history.
    pub fn update(&mut self, administered: &[Item], responses: &[Response]) -> AbilityEstimate {
        self.current = estimate(administered, responses);
        tracing::debug!(
            ability = self.current.ability,
            standard_error = self.current.standard_error,
            scored = self.current.scored_count,
            "ability estimate updated"
        );
        self.current
    }
}

/// Estimate ability from an administered history. Pilot items are ignored.
pub fn estimate(administered: &[Item], responses: &[Response]) -> AbilityEstimate {
    debug_assert_eq!(administered.len(), responses.len());

    let mut weighted_correct = 0.0;
    let mut total_weight = 0.0;
    let mut scored = 0usize;

    for (item, response) in administered.iter().zip(responses) {
        if item.is_pilot {
            continue;
        }
        let weight = item.difficulty.exp2();
        total_weight += weight;
        if response.is_correct {
            weighted_correct += weight;
        }
        scored += 1;
    }

    if scored == 0 {
        return AbilityEstimate::default();
    }

    let proportion = weighted_correct / total_weight;
    AbilityEstimate {
        ability: (proportion - 0.5) * 3.0,
        standard_error: 1.0 / (scored.max(1) as f64).sqrt(),
        scored_count: scored,
    }
}

/// Map ability onto the normalized 0-1 score scale used by the passing
/// threshold. Inverse of the θ mapping above, clamped to the scale.
pub fn ability_to_score(ability: f64) -> f64 {
    (ability / 3.0 + 0.5).clamp(0.0, 1.0)
}

/// Map a 0-1 score onto the ability scale.
pub fn score_to_ability(score: f64) -> f64 {
    (score - 0.5) * 3.0
}
