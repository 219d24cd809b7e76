//! Rebase engine configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! Author: Moroya Sakamoto

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bound on ancestry walks
pub const DEFAULT_MAX_ANCESTRY_DEPTH: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RebaseConfig {
    /// Check every already-rebased substitution against the canonical
    /// commit it stands for, failing the reconciliation on mismatch
    pub verify_substitutions: bool,

    /// Longest ancestry chain a single walk may visit
    pub max_ancestry_depth: usize,
}

impl Default for RebaseConfig {
    fn default() -> Self {
        Self {
            verify_substitutions: false,
            max_ancestry_depth: DEFAULT_MAX_ANCESTRY_DEPTH,
        }
    }
}

impl RebaseConfig {
    /// Configuration with substitution verification switched on
    pub fn verifying() -> Self {
        Self {
            verify_substitutions: true,
            ..Self::default()
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = RebaseConfig::from_toml("").unwrap();
        assert_eq!(config, RebaseConfig::default());
        assert!(!config.verify_substitutions);
        assert_eq!(config.max_ancestry_depth, DEFAULT_MAX_ANCESTRY_DEPTH);
    }

    #[test]
    fn test_partial_toml_overrides_one_field() {
        let config = RebaseConfig::from_toml("verify_substitutions = true").unwrap();
        assert_eq!(config, RebaseConfig::verifying());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = RebaseConfig::from_toml("verify = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = RebaseConfig {
            verify_substitutions: true,
            max_ancestry_depth: 16,
        };
        let text = config.to_toml().unwrap();
        assert_eq!(RebaseConfig::from_toml(&text).unwrap(), config);
    }
}
