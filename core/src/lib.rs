//! Fuzzy index core: key dictionary, subsequence matching, and the
//! write-once binary index format.

pub mod builder;
pub mod dictionary;
pub(crate) mod format;
pub mod matching;
pub mod reader;
pub mod types;

pub use builder::IndexBuilder;
pub use builder::error::WriteError;
pub use dictionary::{KeyDictionary, Posting, Postings};
pub use reader::error::ReadError;
pub use reader::{IndexFile, IndexMatch};
pub use tokio_util::sync::CancellationToken;
pub use types::{Document, DocumentId, FuzzyConfig, KeyId};
