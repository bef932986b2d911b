use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Index settings, persisted as TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Fixed for the lifetime of an index; keys and queries are folded to
    /// lowercase when false.
    pub case_sensitive: bool,
    /// Tombstoned keys tolerated before postings are compacted.
    pub compact_threshold: usize,
    /// Records written between cancellation checks.
    pub write_chunk_size: usize,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            compact_threshold: default_compact_threshold(),
            write_chunk_size: default_write_chunk_size(),
        }
    }
}

fn default_compact_threshold() -> usize {
    100
}

fn default_write_chunk_size() -> usize {
    1024
}

impl FuzzyConfig {
    /// Returns the config file path within the given directory.
    pub fn path(dir: &Path) -> PathBuf {
        dir.join("fuzzy.toml")
    }

    /// Loads config from a TOML file. Returns default config if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the list of validation errors, empty if the config is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.write_chunk_size == 0 {
            errors.push("write_chunk_size must be at least 1".to_string());
        }

        errors
    }

    /// Returns a validated config, replacing invalid values with defaults.
    pub fn with_defaults_for_invalid(&self) -> Self {
        Self {
            case_sensitive: self.case_sensitive,
            compact_threshold: self.compact_threshold,
            write_chunk_size: if self.write_chunk_size == 0 {
                default_write_chunk_size()
            } else {
                self.write_chunk_size
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
