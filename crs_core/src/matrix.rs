//! # Test Matrix
//!
//! Expands a valid [`ValidationOutcome`] into one [`TestCaseRow`] per
//! (standard, resolved band) pair, annotated with the injury-criteria limits
//! from the [`ThresholdTable`].
//!
//! Rows are ordered standards-outer, bands-inner, both in registry order,
//! and carry nothing time- or id-dependent, so generating twice yields the
//! same sequence. Plan identity and timestamps live in [`MatrixMetadata`].
//!
//! ## Example
//!
//! ```rust
//! use crs_core::dummies::SizeRange;
//! use crs_core::install::{AntiRotation, InstallMethod, Mechanism, RequestedOrientation};
//! use crs_core::matrix::MatrixGenerator;
//! use crs_core::standards::{ProductType, Standard};
//! use crs_core::validation::{EngineeringRequest, Validator};
//!
//! let request = EngineeringRequest::new(
//!     ProductType::ChildRestraintSystem,
//!     [Standard::UnR129],
//!     SizeRange::new(40.0, 105.0),
//!     InstallMethod::new(Mechanism::Isofix3Pt, RequestedOrientation::Rearward, AntiRotation::SupportLeg),
//! );
//! let outcome = Validator::builtin().validate(&request).unwrap();
//!
//! let rows = MatrixGenerator::builtin().generate(&outcome).unwrap();
//! assert_eq!(rows.len(), 5);
//! assert_eq!(rows[0].geometry_code, "RF/ISOFIX-3P/SL");
//! ```

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{PlanError, PlanResult};
use crate::install::{AntiRotation, Mechanism, Orientation};
use crate::isofix::{FixtureClass, IsofixEnvelope};
use crate::standards::{ImpactType, Standard, StandardEdition, TestPulse};
use crate::thresholds::{ThresholdSet, ThresholdTable};
use crate::validation::{StandardResolution, ValidationOutcome};

// ============================================================================
// Rows
// ============================================================================

/// Whether an anti-rotation device is fitted on the test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AntiRotationMarker {
    Yes,
    No,
}

impl From<AntiRotation> for AntiRotationMarker {
    fn from(device: AntiRotation) -> Self {
        if device.is_fitted() {
            AntiRotationMarker::Yes
        } else {
            AntiRotationMarker::No
        }
    }
}

/// One crash-test configuration.
///
/// ## JSON Example
///
/// ```json
/// {
///   "standard_code": "UN R129",
///   "dummy_code": "Q1.5",
///   "orientation": "REARWARD",
///   "mechanism": "ISOFIX_3PT",
///   "anti_rotation": "SUPPORT_LEG",
///   "anti_rotation_marker": "YES",
///   "impact_type": "Frontal",
///   "geometry_code": "RF/ISOFIX-3P/SL",
///   "isofix_fixture": "ISO/R2",
///   "pulse": { "velocity_kmh": 50.0, "deceleration_g": [28.0, 32.0] },
///   "thresholds": { "head_criterion": "HIC15", "...": "..." }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseRow {
    pub standard_code: String,
    pub dummy_code: String,
    pub orientation: Orientation,
    pub mechanism: Mechanism,
    pub anti_rotation: AntiRotation,
    pub anti_rotation_marker: AntiRotationMarker,
    pub impact_type: ImpactType,
    /// Compact installation geometry, `<facing>/<mechanism>/<device>`
    pub geometry_code: String,
    /// Sled fixture for ISOFIX installations; `None` for belt installations
    pub isofix_fixture: Option<FixtureClass>,
    /// Sled pulse for the impact type; `None` if the standard has none
    pub pulse: Option<TestPulse>,
    pub thresholds: ThresholdSet,
}

/// Build the geometry code for a row, e.g. `FF/BELT/TT`.
pub fn geometry_code(orientation: Orientation, mechanism: Mechanism, device: AntiRotation) -> String {
    format!("{}/{}/{}", orientation.code(), mechanism.code(), device.code())
}

// ============================================================================
// Generator
// ============================================================================

/// Generates test-case rows from validated outcomes.
#[derive(Debug, Clone, Copy)]
pub struct MatrixGenerator<'a> {
    thresholds: &'a ThresholdTable,
}

impl MatrixGenerator<'static> {
    /// Generator over the built-in threshold table.
    pub fn builtin() -> Self {
        MatrixGenerator::new(ThresholdTable::builtin())
    }
}

impl<'a> MatrixGenerator<'a> {
    pub fn new(thresholds: &'a ThresholdTable) -> Self {
        MatrixGenerator { thresholds }
    }

    /// Rows for a validated outcome.
    ///
    /// # Errors
    ///
    /// * `InvalidOutcome` if the outcome is not valid or carries errors
    /// * `ThresholdNotFound` if any (standard, band) pair lacks limits;
    ///   no partial row list is returned
    pub fn generate(&self, outcome: &ValidationOutcome) -> PlanResult<Vec<TestCaseRow>> {
        if !outcome.valid || !outcome.errors.is_empty() {
            return Err(PlanError::InvalidOutcome {
                error_count: outcome.errors.len(),
            });
        }
        let request = &outcome.request;
        self.rows(
            &outcome.resolutions,
            request.install_method.mechanism,
            request.product_type.baseline_impact(),
        )
    }

    /// Cross product of resolutions into rows. Only reachable through
    /// [`generate`](Self::generate), which gates on validity.
    fn rows(
        &self,
        resolutions: &[StandardResolution],
        mechanism: Mechanism,
        impact_type: ImpactType,
    ) -> PlanResult<Vec<TestCaseRow>> {
        let capacity = resolutions.iter().map(|r| r.bands.len()).sum();
        let mut rows = Vec::with_capacity(capacity);

        for resolution in resolutions {
            let standard = resolution.standard;
            let pulse = standard.pulse(impact_type);
            for resolved in &resolution.bands {
                let thresholds = self.thresholds.thresholds_for(standard, &resolved.band)?;
                let eval = &resolved.evaluation;
                rows.push(TestCaseRow {
                    standard_code: standard.code().to_string(),
                    dummy_code: resolved.band.code.clone(),
                    orientation: eval.orientation,
                    mechanism,
                    anti_rotation: eval.anti_rotation,
                    anti_rotation_marker: eval.anti_rotation.into(),
                    impact_type,
                    geometry_code: geometry_code(eval.orientation, mechanism, eval.anti_rotation),
                    isofix_fixture: IsofixEnvelope::for_install(mechanism, eval.orientation).map(|e| e.fixture),
                    pulse,
                    thresholds,
                });
            }
            debug!(standard = standard.code(), rows = resolution.bands.len(), "Emitted matrix rows");
        }

        Ok(rows)
    }
}

// ============================================================================
// Assembled Matrix
// ============================================================================

/// Provenance for a generated matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixMetadata {
    pub plan_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub standards: Vec<Standard>,
    /// Catalogue edition of each standard, in `standards` order
    pub editions: Vec<StandardEdition>,
    /// Distinct dummy codes in ascending stature, e.g. `Q0 → Q0+ → Q1`
    pub dummy_coverage: String,
    pub row_count: usize,
    /// Versions of the tables the outcome was validated against
    pub registry_version: Version,
    pub rules_version: Version,
    pub thresholds_version: Version,
}

/// A complete test plan: rows, ISOFIX envelopes and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestMatrix {
    pub metadata: MatrixMetadata,
    pub rows: Vec<TestCaseRow>,
    /// One envelope per installation direction the rows use; empty for belt installations
    pub isofix_envelopes: Vec<IsofixEnvelope>,
}

impl TestMatrix {
    /// Generate rows for `outcome` and stamp them with a fresh plan id.
    ///
    /// Registry and rule versions are taken from the outcome, so they always
    /// name the tables that produced it.
    pub fn assemble(outcome: &ValidationOutcome, thresholds: &ThresholdTable) -> PlanResult<Self> {
        let rows = MatrixGenerator::new(thresholds).generate(outcome)?;
        let coverage: Vec<&str> = outcome.resolved_bands.iter().map(|b| b.code.as_str()).collect();

        let mechanism = outcome.request.install_method.mechanism;
        let mut isofix_envelopes: Vec<IsofixEnvelope> = Vec::new();
        for row in &rows {
            if isofix_envelopes.iter().any(|e| e.orientation == row.orientation) {
                continue;
            }
            if let Some(envelope) = IsofixEnvelope::for_install(mechanism, row.orientation) {
                isofix_envelopes.push(envelope);
            }
        }

        let standards: Vec<Standard> = outcome.request.standards.iter().copied().collect();
        let metadata = MatrixMetadata {
            plan_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            editions: standards.iter().map(|s| s.edition()).collect(),
            standards,
            dummy_coverage: coverage.join(" → "),
            row_count: rows.len(),
            registry_version: outcome.registry_version.clone(),
            rules_version: outcome.rules_version.clone(),
            thresholds_version: thresholds.version.clone(),
        };
        info!(plan_id = %metadata.plan_id, rows = metadata.row_count, "Assembled test matrix");

        Ok(TestMatrix {
            metadata,
            rows,
            isofix_envelopes,
        })
    }

    /// Assemble against the built-in threshold table.
    pub fn assemble_builtin(outcome: &ValidationOutcome) -> PlanResult<Self> {
        TestMatrix::assemble(outcome, ThresholdTable::builtin())
    }

    pub fn to_json(&self) -> PlanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
