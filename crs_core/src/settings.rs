//! # Engine Settings
//!
//! Tunables for the validator. Settings are plain data, loaded from TOML by
//! the host and passed into the [`Validator`](crate::validation::Validator);
//! nothing in the engine reads ambient configuration.
//!
//! ## TOML Example
//!
//! ```toml
//! broad_range_band_limit = 5
//! reject_broad_ranges = false
//! envelope_warnings = true
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{PlanError, PlanResult};

/// Clause cited when a broad range is rejected rather than warned about
pub const BROAD_RANGE_CLAUSE: &str = "ENGINE broad-range cap";

/// Validator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Warn once a request resolves more distinct bands than this
    pub broad_range_band_limit: usize,

    /// Turn the broad-range warning into an error
    pub reject_broad_ranges: bool,

    /// Warn when the size range leaves the product category's envelope
    pub envelope_warnings: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            broad_range_band_limit: 5,
            reject_broad_ranges: false,
            envelope_warnings: true,
        }
    }
}

impl EngineSettings {
    /// Parse settings from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> PlanResult<Self> {
        let settings: EngineSettings = toml::from_str(source).map_err(|e| PlanError::ConfigError {
            reason: e.to_string(),
        })?;
        if settings.broad_range_band_limit == 0 {
            return Err(PlanError::ConfigError {
                reason: "broad_range_band_limit must be at least 1".to_string(),
            });
        }
        Ok(settings)
    }

    /// Write settings as TOML
    pub fn to_toml_string(&self) -> PlanResult<String> {
        toml::to_string(self).map_err(|e| PlanError::ConfigError { reason: e.to_string() })
    }
}
