mod fuzzy;

pub use fuzzy::{ConfigError, FuzzyConfig};
