//! Mutable fuzzy search over string keys.
//!
//! # Design
//!
//! - [`FuzzyIndex`] keeps a [`KeyDictionary`](dazzle_core::KeyDictionary):
//!   deduplicated key text plus one sorted postings list per character.
//! - A query is matched as a subsequence. Candidates come from the first
//!   character's postings and are extended by binary search through the
//!   postings of the following characters.
//! - Removal tombstones a key; its postings are purged once enough removals
//!   pile up.
//! - Bulk inserts append postings unsorted and sort once at the end.
//!
//! [`highlight`] marks up a key with the same character positions the index
//! used to score it.

mod config;
mod engine;
mod highlight;
mod results;

pub use config::{CaseMatching, SearchConfig};
pub use engine::{BulkInsert, FreeFunc, FuzzyIndex};
pub use highlight::highlight;
pub use results::FuzzyMatch;
