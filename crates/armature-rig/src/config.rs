//! Solver configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_max_iterations() -> u32 {
    20
}
const fn default_tolerance() -> f32 {
    1e-2
}
fn default_algorithm() -> String {
    "fabrik".into()
}

// ---------------------------------------------------------------------------
// SolverConfig
// ---------------------------------------------------------------------------

/// Configuration shared by the IK solver family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Upper bound on solve iterations per call (default: 20).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Distance tolerance forming the squared threshold of the convergence
    /// check (default: 0.01).
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    /// Strategy name used by solver dispatch (default: "fabrik").
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            algorithm: default_algorithm(),
        }
    }
}

impl SolverConfig {
    /// Parse and validate a config from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a config from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Check numeric bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(self.max_iterations));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}
