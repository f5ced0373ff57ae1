//! Response grading.
//!
//! The session never looks inside a raw answer; it hands the answer to a
//! [`ResponseGrader`] and keeps only the boolean outcome.

use crate::model::{Answer, Item, ItemKind};

/// Maps an item and a submitted answer to correctness.
pub trait ResponseGrader: Send + Sync {
    fn grade(&self, item: &Item, answer: &Answer) -> bool;
}

impl<F> ResponseGrader for F
where
    F: Fn(&Item, &Answer) -> bool + Send + Sync,
{
    fn grade(&self, item: &Item, answer: &Answer) -> bool {
        self(item, answer)
    }
}

/// Grades against the answer key stored on the item. Partial credit is not
/// given: multi-select needs the exact set, ordering the exact sequence,
/// and mapping items every entry in the right place.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyGrader;

impl ResponseGrader for KeyGrader {
    fn grade(&self, item: &Item, answer: &Answer) -> bool {
        match (&item.kind, answer) {
            (ItemKind::SingleSelect { correct, .. }, Answer::Single(chosen)) => chosen == correct,
            (ItemKind::MultiSelect { correct, .. }, Answer::Multiple(chosen)) => chosen == correct,
            (ItemKind::OrderedList { steps }, Answer::Ordered(order)) => order == steps,
            (ItemKind::Categorization { assignments, .. }, Answer::Categorized(given)) => {
                given == assignments
            }
            (ItemKind::RegionPlacement { placements, .. }, Answer::Placed(given)) => {
                given == placements
            }
            _ => false,
        }
    }
}
