//! # crs_core - Child Restraint Test-Plan Engine
//!
//! `crs_core` maps a requested body-size range and a set of regulatory
//! standards onto the test dummies, installation orientation, anti-rotation
//! hardware and injury-criteria limits a child restraint must be tested
//! against. All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions over read-only reference tables
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Traceable**: Every rejection cites the clause it violates
//! - **Deterministic**: Identical requests produce identical outcomes and rows
//!
//! ## Quick Start
//!
//! ```rust
//! use crs_core::prelude::*;
//!
//! let request = EngineeringRequest::new(
//!     ProductType::ChildRestraintSystem,
//!     [Standard::UnR129, Standard::Gb27887],
//!     SizeRange::new(105.0, 150.0),
//!     InstallMethod::new(Mechanism::Isofix3Pt, RequestedOrientation::Forward, AntiRotation::TopTether),
//! );
//!
//! let outcome = Validator::builtin().validate(&request).unwrap();
//! assert!(outcome.valid);
//!
//! let rows = MatrixGenerator::builtin().generate(&outcome).unwrap();
//! assert_eq!(rows.len(), 6);
//! ```
//!
//! ## Modules
//!
//! - [`dummies`] - Dummy registry and height-band resolver
//! - [`rules`] - Orientation and anti-rotation rule engine
//! - [`validation`] - Request validation
//! - [`matrix`] - Test matrix generation
//! - [`thresholds`] - Injury-criteria limits per (standard, dummy)
//! - [`standards`] - Standard catalogue, product types, test pulses
//! - [`install`] - Installation mechanisms, orientations, devices
//! - [`isofix`] - ISOFIX fixture classes and attachment envelopes
//! - [`settings`] - Validator tunables
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod dummies;
pub mod errors;
pub mod install;
pub mod isofix;
pub mod matrix;
pub mod rules;
pub mod settings;
pub mod standards;
pub mod thresholds;
pub mod units;
pub mod validation;

// Re-export commonly used types at crate root for convenience
pub use errors::{PlanError, PlanResult};
pub use matrix::{MatrixGenerator, TestCaseRow, TestMatrix};
pub use thresholds::{ThresholdSet, ThresholdTable};
pub use validation::{EngineeringRequest, ValidationOutcome, Validator};

/// Everything needed to build a request, validate it and generate rows.
pub mod prelude {
    pub use crate::dummies::{resolve_bands, DummyBand, DummyRegistry, SizeRange};
    pub use crate::errors::{PlanError, PlanResult};
    pub use crate::install::{AntiRotation, InstallMethod, Mechanism, Orientation, RequestedOrientation};
    pub use crate::isofix::{FixtureClass, IsofixEnvelope};
    pub use crate::matrix::{AntiRotationMarker, MatrixGenerator, TestCaseRow, TestMatrix};
    pub use crate::rules::RuleBook;
    pub use crate::settings::EngineSettings;
    pub use crate::standards::{ImpactType, ProductType, Standard};
    pub use crate::thresholds::{ThresholdSet, ThresholdTable};
    pub use crate::validation::{EngineeringRequest, IssueKind, ValidationIssue, ValidationOutcome, Validator};
}
