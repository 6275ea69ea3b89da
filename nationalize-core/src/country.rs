//! Ordered index over a country-probability list.
//!
//! Entries are keyed by `country_id`. The first occurrence of an id fixes its
//! position; later occurrences only overwrite the probability. This is the
//! merge rule applied by PATCH.

use std::collections::HashMap;

use crate::entities::CountryProbability;

/// A `Vec` of entries plus an id -> position map.
#[derive(Debug, Clone, Default)]
pub struct CountryIndex {
    entries: Vec<CountryProbability>,
    positions: HashMap<String, usize>,
}

impl CountryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from an existing list, collapsing duplicate ids.
    pub fn from_entries(entries: impl IntoIterator<Item = CountryProbability>) -> Self {
        let mut index = Self::new();
        index.extend(entries);
        index
    }

    /// Insert a new entry at the end, or update the probability of an
    /// existing one in place. Returns `true` when the id was new.
    pub fn upsert(&mut self, entry: CountryProbability) -> bool {
        match self.positions.get(&entry.country_id) {
            Some(&pos) => {
                self.entries[pos].probability = entry.probability;
                false
            }
            None => {
                self.positions
                    .insert(entry.country_id.clone(), self.entries.len());
                self.entries.push(entry);
                true
            }
        }
    }

    pub fn get(&self, country_id: &str) -> Option<&CountryProbability> {
        self.positions.get(country_id).map(|&pos| &self.entries[pos])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<CountryProbability> {
        self.entries
    }
}

impl Extend<CountryProbability> for CountryIndex {
    fn extend<I: IntoIterator<Item = CountryProbability>>(&mut self, iter: I) {
        for entry in iter {
            self.upsert(entry);
        }
    }
}

/// Merge `incoming` into `existing` using the PATCH rule.
pub fn merge_countries(
    existing: Vec<CountryProbability>,
    incoming: Vec<CountryProbability>,
) -> Vec<CountryProbability> {
    let mut index = CountryIndex::from_entries(existing);
    index.extend(incoming);
    index.into_vec()
}
