//! Tracker configuration.
//!
//! Loaded from TOML; every key is optional:
//!
//! ```toml
//! identity_field = "id"
//! reflection = false
//! max_depth = 32
//! ```

use crate::diff::engine::DEFAULT_IDENTITY_FIELD;
use crate::errors::{KronosError, Result};
use serde::Deserialize;
use std::path::Path;

/// Default recursion limit for reflective normalization.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Settings shared by the normalizer, diff engine and tracker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Field holding an entity's identity, in views and in list elements
    pub identity_field: String,
    /// Allow building views from an entity's attribute mapping
    pub reflection: bool,
    /// Maximum nesting depth for reflective normalization
    pub max_depth: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            identity_field: DEFAULT_IDENTITY_FIELD.to_string(),
            reflection: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl TrackerConfig {
    /// Enable or disable reflective normalization.
    pub fn with_reflection(mut self, enabled: bool) -> Self {
        self.reflection = enabled;
        self
    }

    pub fn with_identity_field(mut self, field: impl Into<String>) -> Self {
        self.identity_field = field.into();
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::InvalidConfig` on malformed TOML, unknown keys,
    /// or values that fail validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TrackerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::InvalidConfig` if the file cannot be read or
    /// fails to parse or validate.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| KronosError::InvalidConfig {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }

    /// Check invariants.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::InvalidConfig` if `identity_field` is blank or
    /// `max_depth` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.identity_field.trim().is_empty() {
            return Err(KronosError::InvalidConfig {
                reason: "identity_field must not be empty".to_string(),
            });
        }
        if self.max_depth == 0 {
            return Err(KronosError::InvalidConfig {
                reason: "max_depth must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.identity_field, "id");
        assert!(!config.reflection);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TrackerConfig::from_toml_str("reflection = true").unwrap();
        assert!(config.reflection);
        assert_eq!(config.identity_field, "id");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = TrackerConfig::from_toml_str("identity = \"pk\"").unwrap_err();
        assert!(matches!(err, KronosError::InvalidConfig { .. }));
    }

    #[test]
    fn test_validation() {
        assert!(TrackerConfig::from_toml_str("identity_field = \" \"").is_err());
        assert!(TrackerConfig::from_toml_str("max_depth = 0").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "identity_field = \"pk\"\nmax_depth = 4").unwrap();

        let config = TrackerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.identity_field, "pk");
        assert_eq!(config.max_depth, 4);
    }
}
