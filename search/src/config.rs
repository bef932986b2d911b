use dazzle_core::FuzzyConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaseMatching {
    Sensitive,
    /// Keys and queries are folded to lowercase.
    #[default]
    Insensitive,
}

impl CaseMatching {
    pub fn is_sensitive(self) -> bool {
        matches!(self, CaseMatching::Sensitive)
    }
}

impl From<bool> for CaseMatching {
    fn from(case_sensitive: bool) -> Self {
        if case_sensitive {
            CaseMatching::Sensitive
        } else {
            CaseMatching::Insensitive
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub case_matching: CaseMatching,
    /// Removed keys tolerated before their postings are purged.
    pub compact_threshold: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::from(&FuzzyConfig::default())
    }
}

impl From<&FuzzyConfig> for SearchConfig {
    fn from(config: &FuzzyConfig) -> Self {
        Self {
            case_matching: config.case_sensitive.into(),
            compact_threshold: config.compact_threshold,
        }
    }
}
