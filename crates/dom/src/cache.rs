//! Generation-checked memo table.

use std::collections::HashMap;
use std::hash::Hash;

/// Entries are dropped wholesale when the observed generation moves.
#[derive(Debug)]
pub struct StyleCache<K, V> {
    generation: Option<u64>,
    entries: HashMap<K, V>,
}

impl<K, V> Default for StyleCache<K, V> {
    fn default() -> Self {
        Self {
            generation: None,
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> StyleCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the table if `generation` differs from the last one seen.
    /// Returns true when entries were discarded.
    pub fn validate(&mut self, generation: u64) -> bool {
        if self.generation == Some(generation) {
            return false;
        }
        let stale = !self.entries.is_empty();
        if stale {
            log::trace!("style cache invalidated at generation {generation}");
        }
        self.entries.clear();
        self.generation = Some(generation);
        stale
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
