use super::FuzzyIndex;

/// Open bulk insert section on a [`FuzzyIndex`].
///
/// Holds the index mutably, so it cannot be searched or given a second bulk
/// section until the guard is gone.
pub struct BulkInsert<'a, V> {
    index: &'a mut FuzzyIndex<V>,
}

impl<'a, V> BulkInsert<'a, V> {
    pub(super) fn new(index: &'a mut FuzzyIndex<V>) -> Self {
        index.begin_bulk_insert();
        Self { index }
    }

    pub fn insert(&mut self, key: &str, value: V) {
        self.index.insert(key, value);
    }

    pub fn insert_with_priority(&mut self, key: &str, value: V, priority: u32) {
        self.index.insert_with_priority(key, value, priority);
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.index.remove(key)
    }

    /// Ends the section. Same as dropping the guard.
    pub fn finish(self) {}
}

impl<V> Drop for BulkInsert<'_, V> {
    fn drop(&mut self) {
        self.index.end_bulk_insert();
    }
}
