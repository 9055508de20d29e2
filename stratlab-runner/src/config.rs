//! Serializable run configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::walk_forward::WindowSpec;
use stratlab_core::config::{ConfigError, StrategyParams};

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Everything needed to reproduce a walk-forward run: strategy parameters,
/// capital, and the window layout. Two identical configs hash to the same
/// `run_id`, so results can be compared or cached by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub params: StrategyParams,
    pub initial_capital: f64,
    pub walk_forward: WindowSpec,
}

impl RunConfig {
    /// Parse and validate a TOML config string.
    pub fn from_toml_str(raw: &str) -> Result<Self, RunConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.params.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RunConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Deterministic BLAKE3 hash of the full configuration.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
