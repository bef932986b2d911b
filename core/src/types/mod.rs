pub mod config;
pub use config::{ConfigError, FuzzyConfig};

pub(crate) mod key_id;
pub use key_id::{DocumentId, KeyId};

pub(crate) mod document;
pub use document::Document;
