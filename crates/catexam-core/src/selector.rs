//! Item selection.
//!
//! The first block of the exam samples content domains evenly; after that the
//! selector maximizes 3PL Fisher information at the current ability.

use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::bank::ItemBank;
use crate::config::CatConfig;
use crate::error::CatError;
use crate::model::{Domain, Item};

/// Which strategy picked an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Balanced,
    Adaptive,
}

/// Probability of a correct response under the 3PL model:
/// `P = c + (1 − c) / (1 + e^−a(θ − b))`.
pub fn probability_correct(item: &Item, theta: f64) -> f64 {
    let a = item.discrimination();
    let c = item.guessing();
    let z = a * (theta - item.difficulty);
    c + (1.0 - c) / (1.0 + (-z).exp())
}

/// Fisher information of `item` at ability `theta` under the 3PL model.
///
/// ```text
/// z    = a(θ − b)
/// P    = c + (1 − c) / (1 + e^−z)
/// info = a² · P · (1 − P) / [(1 − c)² · (1 + e^−z)²]
/// ```
pub fn fisher_information(item: &Item, theta: f64) -> f64 {
    let a = item.discrimination();
    let c = item.guessing();

    let z = a * (theta - item.difficulty);
    let e = (-z).exp();
    let p = probability_correct(item, theta);

    a * a * p * (1.0 - p) / ((1.0 - c).powi(2) * (1.0 + e).powi(2))
}

/// Two-phase selector.
#[derive(Debug, Clone)]
pub struct ItemSelector {
    balanced_phase_items: usize,
    domain_priority: Vec<Domain>,
}

impl ItemSelector {
    pub fn new(balanced_phase_items: usize, domain_priority: Vec<Domain>) -> Self {
        Self {
            balanced_phase_items,
            domain_priority,
        }
    }

    pub fn from_config(config: &CatConfig) -> Self {
        Self::new(
            config.balanced_phase_item_count,
            config.domain_priority_order.clone(),
        )
    }

    /// Phase that applies after `administered_count` items.
    pub fn phase(&self, administered_count: usize) -> Phase {
        if administered_count < self.balanced_phase_items {
            Phase::Balanced
        } else {
            Phase::Adaptive
        }
    }

    /// Choose the next item, or [`CatError::ItemBankExhausted`] if every item
    /// has been administered.
    pub fn select<'a, R: Rng + ?Sized>(
        &self,
        bank: &'a ItemBank,
        administered: &[Item],
        theta: f64,
        rng: &mut R,
    ) -> Result<&'a Item, CatError> {
        let administered_ids: HashSet<&str> =
            administered.iter().map(|item| item.id.as_str()).collect();

        let chosen = match self.phase(administered.len()) {
            Phase::Balanced => self.select_balanced(bank, administered, &administered_ids, rng),
            Phase::Adaptive => select_max_information(bank, &administered_ids, theta),
        };
        chosen.ok_or(CatError::ItemBankExhausted)
    }

    /// Domain with the fewest administered items; ties go to the earlier
    /// domain in the priority order.
    pub fn target_domain(&self, administered: &[Item]) -> Option<Domain> {
        let mut counts: BTreeMap<Domain, usize> = BTreeMap::new();
        for item in administered {
            *counts.entry(item.domain).or_insert(0) += 1;
        }

        let mut best: Option<(Domain, usize)> = None;
        for &domain in &self.domain_priority {
            let count = counts.get(&domain).copied().unwrap_or(0);
            if best.map_or(true, |(_, best_count)| count < best_count) {
                best = Some((domain, count));
            }
        }
        best.map(|(domain, _)| domain)
    }

    fn select_balanced<'a, R: Rng + ?Sized>(
        &self,
        bank: &'a ItemBank,
        administered: &[Item],
        administered_ids: &HashSet<&str>,
        rng: &mut R,
    ) -> Option<&'a Item> {
        let remaining: Vec<&Item> = bank
            .iter()
            .filter(|item| !administered_ids.contains(item.id.as_str()))
            .collect();

        if let Some(domain) = self.target_domain(administered) {
            let in_domain: Vec<&Item> = remaining
                .iter()
                .copied()
                .filter(|item| item.domain == domain)
                .collect();
            if let Some(&item) = in_domain.choose(rng) {
                return Some(item);
            }
        }

        remaining.choose(rng).copied()
    }
}

/// Unadministered item with the greatest information at `theta`; ties go to
/// the lowest id.
pub fn select_max_information<'a>(
    bank: &'a ItemBank,
    administered_ids: &HashSet<&str>,
    theta: f64,
) -> Option<&'a Item> {
    let mut best: Option<(&Item, f64)> = None;

    for item in bank.iter() {
        if administered_ids.contains(item.id.as_str()) {
            continue;
        }
        let info = fisher_information(item, theta);
        let better = match best {
            None => true,
            Some((best_item, best_info)) => {
                info > best_info || (info == best_info && item.id < best_item.id)
            }
        };
        if better {
            best = Some((item, info));
        }
    }

    best.map(|(item, _)| item)
}
