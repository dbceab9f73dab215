//! Parser Configuration
//!
//! Limits applied while decoding untrusted blueprint strings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Upper bound on inflated payload size. `None` disables the cap.
    #[serde(default = "default_max_decompressed_bytes")]
    pub max_decompressed_bytes: Option<usize>,
}

fn default_max_decompressed_bytes() -> Option<usize> { Some(64 * 1024 * 1024) }

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_decompressed_bytes: default_max_decompressed_bytes(),
        }
    }
}

impl ParserConfig {
    /// Configuration with no decompression cap.
    pub fn unbounded() -> Self {
        Self { max_decompressed_bytes: None }
    }

    pub fn with_max_decompressed_bytes(limit: usize) -> Self {
        Self { max_decompressed_bytes: Some(limit) }
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_caps_decompression() {
        assert_eq!(ParserConfig::default().max_decompressed_bytes, Some(64 * 1024 * 1024));
    }

    #[test]
    fn test_load_empty_object_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let config = ParserConfig::load(file.path()).unwrap();
        assert_eq!(config, ParserConfig::default());
    }

    #[test]
    fn test_load_null_disables_cap() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_decompressed_bytes": null}}"#).unwrap();

        let config = ParserConfig::load(file.path()).unwrap();
        assert_eq!(config, ParserConfig::unbounded());
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = ParserConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
