//! Search result types.

use dazzle_core::KeyId;
use dazzle_core::matching::Ranked;

/// One ranked hit from [`FuzzyIndex::search`](crate::FuzzyIndex::search).
///
/// Borrows key text and value from the index.
#[derive(Debug)]
pub struct FuzzyMatch<'a, V> {
    pub key: &'a str,
    pub value: &'a V,
    /// Higher is better; `0.0` for the empty query.
    pub score: f32,
    pub id: KeyId,
    pub priority: u32,
}

impl<V> Clone for FuzzyMatch<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for FuzzyMatch<'_, V> {}

impl<V> Ranked for FuzzyMatch<'_, V> {
    fn score(&self) -> f32 {
        self.score
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn key_id(&self) -> KeyId {
        self.id
    }
}
