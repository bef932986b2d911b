mod bulk;

use crate::config::SearchConfig;
use crate::results::FuzzyMatch;
use dazzle_core::matching;
use dazzle_core::{KeyDictionary, KeyId, Postings};
use std::collections::HashMap;

pub use bulk::BulkInsert;

/// Called exactly once for every value the index lets go of.
pub type FreeFunc<V> = Box<dyn FnMut(V) + Send>;

struct Entry<V> {
    value: V,
    priority: u32,
}

/// In-memory fuzzy index mapping keys to values.
///
/// Keys are deduplicated in the index's case mode; inserting an existing key
/// replaces its value and keeps the text first stored. Values that are
/// replaced, removed or still present when the index drops are handed to the
/// free callback if one is set.
pub struct FuzzyIndex<V> {
    dictionary: KeyDictionary,
    entries: HashMap<KeyId, Entry<V>>,
    free_func: Option<FreeFunc<V>>,
    in_bulk: bool,
}

impl<V> FuzzyIndex<V> {
    pub fn new(case_sensitive: bool) -> Self {
        Self::with_config(SearchConfig {
            case_matching: case_sensitive.into(),
            ..SearchConfig::default()
        })
    }

    pub fn with_free_func(case_sensitive: bool, free_func: impl FnMut(V) + Send + 'static) -> Self {
        let mut index = Self::new(case_sensitive);
        index.set_free_func(free_func);
        index
    }

    pub fn with_config(config: SearchConfig) -> Self {
        Self {
            dictionary: KeyDictionary::with_compact_threshold(
                config.case_matching.is_sensitive(),
                config.compact_threshold,
            ),
            entries: HashMap::new(),
            free_func: None,
            in_bulk: false,
        }
    }

    /// Replaces the free callback. Values released from now on go to it.
    pub fn set_free_func(&mut self, free_func: impl FnMut(V) + Send + 'static) {
        self.free_func = Some(Box::new(free_func));
    }

    pub fn case_sensitive(&self) -> bool {
        self.dictionary.case_sensitive()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn release(&mut self, value: V) {
        match self.free_func.as_mut() {
            Some(free) => free(value),
            None => drop(value),
        }
    }
}

/// Mutation operations.
impl<V> FuzzyIndex<V> {
    /// Inserts `key` with priority 0.
    pub fn insert(&mut self, key: &str, value: V) {
        self.insert_with_priority(key, value, 0);
    }

    /// Inserts or replaces `key`. Lower priority values rank first among
    /// equally scored matches.
    pub fn insert_with_priority(&mut self, key: &str, value: V, priority: u32) {
        let id = self.dictionary.add_key(key);
        if let Some(old) = self.entries.insert(id, Entry { value, priority }) {
            self.release(old.value);
        }
    }

    /// Removes `key` and releases its value. Returns false if it was absent.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(id) = self.dictionary.lookup(key) else {
            return false;
        };
        self.dictionary.remove_key(id);
        match self.entries.remove(&id) {
            Some(entry) => {
                self.release(entry.value);
                true
            }
            None => false,
        }
    }

    /// Purges the postings of removed keys now instead of at the threshold.
    pub fn compact(&mut self) {
        self.dictionary.compact();
    }
}

/// Bulk insert.
impl<V> FuzzyIndex<V> {
    /// Starts a bulk section: postings stay unsorted until
    /// [`end_bulk_insert`](Self::end_bulk_insert).
    ///
    /// # Panics
    ///
    /// If a bulk section is already open.
    pub fn begin_bulk_insert(&mut self) {
        assert!(!self.in_bulk, "bulk insert sections cannot be nested");
        self.in_bulk = true;
        self.dictionary.begin_deferred();
    }

    /// # Panics
    ///
    /// If no bulk section is open.
    pub fn end_bulk_insert(&mut self) {
        assert!(self.in_bulk, "end_bulk_insert without begin_bulk_insert");
        self.in_bulk = false;
        self.dictionary.finish_deferred();
        log::debug!("bulk insert finished with {} keys", self.entries.len());
    }

    /// Scoped bulk section; ends when the guard is finished or dropped.
    pub fn bulk_insert(&mut self) -> BulkInsert<'_, V> {
        BulkInsert::new(self)
    }
}

/// Lookup operations.
impl<V> FuzzyIndex<V> {
    pub fn contains(&self, key: &str) -> bool {
        self.dictionary.contains(key)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let id = self.dictionary.lookup(key)?;
        self.entries.get(&id).map(|entry| &entry.value)
    }

    /// Live keys and values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.dictionary
            .iter()
            .filter_map(|(id, key)| self.entries.get(&id).map(|entry| (key, &entry.value)))
    }

    /// Keys containing `query` as a subsequence, best first.
    ///
    /// An empty query lists keys in insertion order with a zero score.
    /// `max_matches == 0` means no limit.
    pub fn search(&self, query: &str, max_matches: usize) -> Vec<FuzzyMatch<'_, V>> {
        debug_assert!(!self.in_bulk, "search during a bulk insert section");

        if query.is_empty() {
            let limit = if max_matches == 0 { usize::MAX } else { max_matches };
            return self
                .dictionary
                .iter()
                .filter_map(|(id, key)| self.hit(id, key, 0.0))
                .take(limit)
                .collect();
        }

        let tables: Vec<Postings<'_>> = query
            .chars()
            .map(|ch| self.dictionary.get_postings(ch))
            .collect();
        let candidates =
            matching::collect_candidates(&tables, |id| self.dictionary.is_live(id));

        let case_sensitive = self.case_sensitive();
        let mut matches: Vec<_> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let key = self.dictionary.get_text(candidate.key_id)?;
                let score = matching::score(key, query, &candidate.positions, case_sensitive);
                self.hit(candidate.key_id, key, score)
            })
            .collect();

        matching::rank(&mut matches, max_matches);
        log::trace!("query {:?} matched {} keys", query, matches.len());
        matches
    }

    fn hit<'a>(&'a self, id: KeyId, key: &'a str, score: f32) -> Option<FuzzyMatch<'a, V>> {
        let entry = self.entries.get(&id)?;
        Some(FuzzyMatch {
            key,
            value: &entry.value,
            score,
            id,
            priority: entry.priority,
        })
    }
}

impl<V> Drop for FuzzyIndex<V> {
    fn drop(&mut self) {
        let Some(mut free) = self.free_func.take() else {
            return;
        };
        for (_, entry) in self.entries.drain() {
            free(entry.value);
        }
    }
}
