//! The item bank: an ordered, validated, read-only collection of items.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::CatError;
use crate::model::{Domain, Item};

/// An ordered collection of items, shared read-only between sessions.
#[derive(Debug, Clone)]
pub struct ItemBank {
    items: Vec<Item>,
    index: HashMap<String, usize>,
}

impl ItemBank {
    /// Build a bank from items in presentation order.
    ///
    /// Fails if any item has invalid parameters or an inconsistent answer key,
    /// or if two items share an id.
    pub fn new(items: Vec<Item>) -> Result<Self, CatError> {
        let mut index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            item.check().map_err(|reason| CatError::InvalidItem {
                id: item.id.clone(),
                reason,
            })?;
            if index.insert(item.id.clone(), pos).is_some() {
                return Err(CatError::DuplicateItemId(item.id.clone()));
            }
        }
        Ok(Self { items, index })
    }

    /// Build a bank after shuffling the items with `rng`.
    pub fn shuffled<R: Rng + ?Sized>(mut items: Vec<Item>, rng: &mut R) -> Result<Self, CatError> {
        items.shuffle(rng);
        Self::new(items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.index.get(id).map(|&pos| &self.items[pos])
    }

    /// Items whose id is not in `administered`, in bank order.
    pub fn remaining<'a>(
        &'a self,
        administered: &'a HashSet<&'a str>,
    ) -> impl Iterator<Item = &'a Item> + 'a {
        self.items
            .iter()
            .filter(move |item| !administered.contains(item.id.as_str()))
    }

    /// Number of items per domain, pilot items included.
    pub fn count_by_domain(&self) -> BTreeMap<Domain, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.domain).or_insert(0) += 1;
        }
        counts
    }

    /// Number of non-pilot items.
    pub fn scored_count(&self) -> usize {
        self.items.iter().filter(|item| !item.is_pilot).count()
    }
}
