//! # Error Types
//!
//! Structured error types for crs_core. These are the failures that stop a
//! call outright. Rule violations and coverage gaps are not errors in this
//! sense; the validator accumulates them as [`ValidationIssue`]s so an
//! engineer sees the complete list in one pass.
//!
//! ## Example
//!
//! ```rust
//! use crs_core::errors::{PlanError, PlanResult};
//!
//! fn check_range(min_cm: f64, max_cm: f64) -> PlanResult<()> {
//!     if min_cm >= max_cm {
//!         return Err(PlanError::structural(
//!             "size_range",
//!             format!("{}-{}", min_cm, max_cm),
//!             "Minimum size must be below maximum size",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`ValidationIssue`]: crate::validation::ValidationIssue

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for crs_core operations
pub type PlanResult<T> = Result<T, PlanError>;

/// Structured error type for planning operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum PlanError {
    /// The request is malformed (inverted range, empty standard set, ...)
    #[error("Structural error in '{field}': {value} - {reason}")]
    Structural {
        field: String,
        value: String,
        reason: String,
    },

    /// No injury-criteria entry exists for a resolved (standard, dummy) pair
    #[error("Threshold not found: no entry for dummy {dummy} under {standard}")]
    ThresholdNotFound { standard: String, dummy: String },

    /// A standard code could not be parsed
    #[error("Unknown standard: {code}")]
    UnknownStandard { code: String },

    /// A reference table failed its load-time invariant checks
    #[error("Registry invalid: {table} - {reason}")]
    RegistryInvalid { table: String, reason: String },

    /// `generate` was handed an outcome that did not pass validation
    #[error("Refusing to generate from an invalid outcome ({error_count} error(s))")]
    InvalidOutcome { error_count: usize },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Engine settings could not be parsed or written
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },
}

impl PlanError {
    /// Create a Structural error
    pub fn structural(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanError::Structural {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a ThresholdNotFound error
    pub fn threshold_not_found(standard: impl Into<String>, dummy: impl Into<String>) -> Self {
        PlanError::ThresholdNotFound {
            standard: standard.into(),
            dummy: dummy.into(),
        }
    }

    /// Create a RegistryInvalid error
    pub fn registry_invalid(table: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanError::RegistryInvalid {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Data-completeness failures point at a registry gap, not at user input
    pub fn is_data_completeness(&self) -> bool {
        matches!(self, PlanError::ThresholdNotFound { .. } | PlanError::RegistryInvalid { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PlanError::Structural { .. } => "STRUCTURAL",
            PlanError::ThresholdNotFound { .. } => "THRESHOLD_NOT_FOUND",
            PlanError::UnknownStandard { .. } => "UNKNOWN_STANDARD",
            PlanError::RegistryInvalid { .. } => "REGISTRY_INVALID",
            PlanError::InvalidOutcome { .. } => "INVALID_OUTCOME",
            PlanError::SerializationError { .. } => "SERIALIZATION_ERROR",
            PlanError::ConfigError { .. } => "CONFIG_ERROR",
        }
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(err: serde_json::Error) -> Self {
        PlanError::SerializationError {
            reason: err.to_string(),
        }
    }
}
