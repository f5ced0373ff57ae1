//! Per-domain breakdown and summary statistics for an attempt.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::estimator::{ability_to_score, AbilityEstimate};
use crate::model::{Domain, Item, Response};

/// Scored performance within one content domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub correct: usize,
    pub total: usize,
    /// `correct / total` as a percentage (0-100).
    pub percentage: f64,
}

/// Summary statistics for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExamStats {
    pub total_items: usize,
    pub pilot_items: usize,
    pub scored_items: usize,
    pub elapsed_seconds: f64,
    /// Mean time spent per administered item, pilot items included.
    pub average_time_per_item: f64,
    pub ability: f64,
    pub standard_error: f64,
    /// Ability on the 0-1 scale of the passing threshold.
    pub score: f64,
    /// 95% interval on the ability scale.
    pub confidence_interval: (f64, f64),
}

/// Break down scored responses by domain. Pilot items are excluded, and
/// domains without scored responses are absent from the map.
pub fn domain_breakdown(administered: &[Item], responses: &[Response]) -> BTreeMap<Domain, DomainScore> {
    let mut tallies: BTreeMap<Domain, (usize, usize)> = BTreeMap::new();
    for (item, response) in administered.iter().zip(responses) {
        if item.is_pilot {
            continue;
        }
        let entry = tallies.entry(item.domain).or_insert((0, 0));
        entry.1 += 1;
        if response.is_correct {
            entry.0 += 1;
        }
    }

    tallies
        .into_iter()
        .map(|(domain, (correct, total))| {
            let percentage = if total == 0 {
                0.0
            } else {
                correct as f64 / total as f64 * 100.0
            };
            (
                domain,
                DomainScore {
                    correct,
                    total,
                    percentage,
                },
            )
        })
        .collect()
}

/// Compute summary statistics.
pub fn compute_stats(
    administered: &[Item],
    responses: &[Response],
    estimate: AbilityEstimate,
    elapsed_seconds: f64,
) -> ExamStats {
    let total_items = administered.len();
    let pilot_items = administered.iter().filter(|item| item.is_pilot).count();
    let total_time: f64 = responses.iter().map(|r| r.time_spent_seconds).sum();
    let average_time_per_item = if total_items == 0 {
        0.0
    } else {
        total_time / total_items as f64
    };

    ExamStats {
        total_items,
        pilot_items,
        scored_items: total_items - pilot_items,
        elapsed_seconds,
        average_time_per_item,
        ability: estimate.ability,
        standard_error: estimate.standard_error,
        score: ability_to_score(estimate.ability),
        confidence_interval: estimate.confidence_interval(),
    }
}
