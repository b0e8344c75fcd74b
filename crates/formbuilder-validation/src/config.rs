//! # Configuration
//!
//! Tunables of the validation engine. Every field has a default, so a config file
//! only needs to list what it changes.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration parameters for a `ValidationContext`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Longest accepted linkId, in characters. Default: 255.
    pub max_link_id_length: usize,
    /// Units a batch pass processes between two yields to the runtime. Default: 1.
    pub batch_yield_every: usize,
    /// Let batch passes overwrite statuses with clean results too. Default: false,
    /// only errors are recorded, which is enough for a freshly loaded form.
    pub batch_writes_clean_results: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_link_id_length: 255,
            batch_yield_every: 1,
            batch_writes_clean_results: false,
        }
    }
}

impl ValidationConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        tracing::debug!(path = %path.display(), ?config, "Validation config loaded");
        Ok(config)
    }
}
