//! # Input Validation
//!
//! The validator takes an [`EngineeringRequest`] and produces a
//! [`ValidationOutcome`]: pass/fail, every violated clause, non-fatal
//! warnings, and the dummy bands the request resolves to.
//!
//! ## Step Order
//!
//! 1. Structural checks (range ordering, non-empty standards, product
//!    coverage, mechanism/device compatibility). The first failure ends
//!    validation with a single `Structural` issue.
//! 2. Resolve bands per standard. An empty resolution is a `CoverageGap`.
//! 3. Evaluate every resolved band against the standard's rules,
//!    accumulating all violations. Each violated clause is reported once
//!    per standard with every affected band listed.
//! 4. Warn when the request spans an unusually broad set of bands.
//!
//! Identical requests always produce identical outcomes.
//!
//! ## Example
//!
//! ```rust
//! use crs_core::dummies::SizeRange;
//! use crs_core::install::{AntiRotation, InstallMethod, Mechanism, RequestedOrientation};
//! use crs_core::standards::{ProductType, Standard};
//! use crs_core::validation::{EngineeringRequest, IssueKind, Validator};
//!
//! let request = EngineeringRequest::new(
//!     ProductType::ChildRestraintSystem,
//!     [Standard::UnR129],
//!     SizeRange::new(40.0, 105.0),
//!     InstallMethod::new(Mechanism::Isofix3Pt, RequestedOrientation::Forward, AntiRotation::SupportLeg),
//! );
//!
//! let outcome = Validator::builtin().validate(&request).unwrap();
//! assert!(!outcome.valid);
//! assert_eq!(outcome.errors.len(), 1);
//! assert_eq!(outcome.errors[0].kind, IssueKind::RuleViolation);
//! assert_eq!(outcome.errors[0].clause, "UN R129 §5.1.3");
//! ```

use std::collections::BTreeSet;

use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dummies::{resolve_bands, DummyBand, DummyRegistry, SizeRange};
use crate::errors::{PlanError, PlanResult};
use crate::install::InstallMethod;
use crate::rules::{Evaluation, RuleBook};
use crate::settings::{EngineSettings, BROAD_RANGE_CLAUSE};
use crate::standards::{ProductType, Standard};

// ============================================================================
// Request
// ============================================================================

/// One engineering request, immutable once built.
///
/// ## JSON Example
///
/// ```json
/// {
///   "product_type": "CHILD_RESTRAINT_SYSTEM",
///   "standards": ["UN R129", "GB 27887-2024"],
///   "size_range": { "min_cm": 105.0, "max_cm": 150.0 },
///   "install_method": {
///     "mechanism": "ISOFIX_3PT",
///     "requested_orientation": "FORWARD",
///     "anti_rotation": "TOP_TETHER"
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringRequest {
    pub product_type: ProductType,
    /// Standards to plan against; iteration follows registry order
    pub standards: BTreeSet<Standard>,
    pub size_range: SizeRange,
    pub install_method: InstallMethod,
}

impl EngineeringRequest {
    pub fn new(
        product_type: ProductType,
        standards: impl IntoIterator<Item = Standard>,
        size_range: SizeRange,
        install_method: InstallMethod,
    ) -> Self {
        EngineeringRequest {
            product_type,
            standards: standards.into_iter().collect(),
            size_range,
            install_method,
        }
    }

    /// Parse a request from JSON
    pub fn from_json(json: &str) -> PlanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Category of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    /// Malformed request; always the only issue when present
    Structural,
    /// A mandated clause was contradicted
    RuleViolation,
    /// No dummy band intersects the range under a standard
    CoverageGap,
}

/// One error in a validation outcome, traceable to a clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    /// Standard the issue was raised under (none for structural issues)
    pub standard: Option<Standard>,
    /// Clause (or request field, for structural issues) the issue cites
    pub clause: String,
    pub message: String,
    /// Dummy codes affected, in band order
    pub bands: Vec<String>,
}

/// A resolved band together with its rule evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBand {
    pub band: DummyBand,
    pub evaluation: Evaluation,
}

/// Bands resolved under one standard, in band order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardResolution {
    pub standard: Standard,
    pub bands: Vec<ResolvedBand>,
}

/// Result of validating a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// True iff `errors` is empty
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<String>,
    /// Distinct bands across all standards, ascending by lower bound
    pub resolved_bands: Vec<DummyBand>,
    /// Per-standard resolution, standards in registry order
    pub resolutions: Vec<StandardResolution>,
    /// The request this outcome was produced from
    pub request: EngineeringRequest,
    /// Version of the dummy registry the bands were resolved from
    pub registry_version: Version,
    /// Version of the rule book the bands were evaluated against
    pub rules_version: Version,
}

impl ValidationOutcome {
    fn structural(request: &EngineeringRequest, err: PlanError, registry: &DummyRegistry, rules: &RuleBook) -> Self {
        let (clause, message) = match &err {
            PlanError::Structural { field, .. } => (field.clone(), err.to_string()),
            other => (other.error_code().to_string(), other.to_string()),
        };
        ValidationOutcome {
            valid: false,
            errors: vec![ValidationIssue {
                kind: IssueKind::Structural,
                standard: None,
                clause,
                message,
                bands: Vec::new(),
            }],
            warnings: Vec::new(),
            resolved_bands: Vec::new(),
            resolutions: Vec::new(),
            request: request.clone(),
            registry_version: registry.version.clone(),
            rules_version: rules.version.clone(),
        }
    }

    /// Errors of one kind, in outcome order
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// Number of resolved (standard, band) pairs; equals the matrix row count
    pub fn pair_count(&self) -> usize {
        self.resolutions.iter().map(|r| r.bands.len()).sum()
    }
}

// ============================================================================
// Validator
// ============================================================================

/// Validates requests against injected reference tables.
#[derive(Debug, Clone)]
pub struct Validator<'a> {
    registry: &'a DummyRegistry,
    rules: &'a RuleBook,
    settings: EngineSettings,
}

impl Validator<'static> {
    /// Validator over the built-in tables with default settings.
    pub fn builtin() -> Self {
        Validator::new(DummyRegistry::builtin(), RuleBook::builtin(), EngineSettings::default())
    }
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a DummyRegistry, rules: &'a RuleBook, settings: EngineSettings) -> Self {
        Validator {
            registry,
            rules,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Validate a request.
    ///
    /// Structural problems, coverage gaps and rule violations are reported
    /// inside the outcome.
    ///
    /// # Errors
    ///
    /// * `RegistryInvalid` if a requested standard has no band table or
    ///   rule set; that is a reference-data gap, not a user error.
    pub fn validate(&self, request: &EngineeringRequest) -> PlanResult<ValidationOutcome> {
        if let Err(err) = self.check_structure(request) {
            info!(error = %err, "Request rejected on structure");
            return Ok(ValidationOutcome::structural(request, err, self.registry, self.rules));
        }

        let range = &request.size_range;
        let mut errors: Vec<ValidationIssue> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut resolutions = Vec::with_capacity(request.standards.len());

        if self.settings.envelope_warnings {
            if let Some((lo, hi)) = request.product_type.envelope_cm() {
                if !range.within(lo, hi) {
                    warnings.push(format!(
                        "Size range {} extends beyond the {} envelope ({}-{}cm)",
                        range,
                        request.product_type.display_name().to_lowercase(),
                        lo,
                        hi
                    ));
                }
            }
        }

        for &standard in &request.standards {
            if self.rules.rules(standard).is_none() {
                return Err(PlanError::registry_invalid(
                    "install rules",
                    format!("no rule set registered for {}", standard.code()),
                ));
            }

            let bands = resolve_bands(self.registry, standard, range)?;
            if bands.is_empty() {
                let covered = self
                    .registry
                    .envelope(standard)
                    .map(|(lo, hi)| format!(" (dummy table covers {}-{}cm)", lo, hi))
                    .unwrap_or_default();
                errors.push(ValidationIssue {
                    kind: IssueKind::CoverageGap,
                    standard: Some(standard),
                    clause: format!("{} dummy coverage", standard.code()),
                    message: format!("No applicable dummy for range {} under {}{}", range, standard.code(), covered),
                    bands: Vec::new(),
                });
                resolutions.push(StandardResolution {
                    standard,
                    bands: Vec::new(),
                });
                continue;
            }

            if let Some((lo, hi)) = self.registry.envelope(standard) {
                if range.min_cm < lo || range.max_cm > hi {
                    warnings.push(format!(
                        "{} dummies cover {}-{}cm only; part of {} has no test dummy",
                        standard.code(),
                        lo,
                        hi,
                        range
                    ));
                }
            }

            let mut resolved = Vec::with_capacity(bands.len());
            for band in bands {
                let evaluation = self.rules.evaluate(standard, &band, &request.install_method)?;
                for violation in &evaluation.violations {
                    merge_violation(&mut errors, standard, violation);
                }
                resolved.push(ResolvedBand { band, evaluation });
            }

            debug!(
                standard = standard.code(),
                bands = resolved.len(),
                "Evaluated resolved bands"
            );
            resolutions.push(StandardResolution {
                standard,
                bands: resolved,
            });
        }

        let resolved_bands = distinct_bands(&resolutions);
        if resolved_bands.len() > self.settings.broad_range_band_limit {
            let codes: Vec<&str> = resolved_bands.iter().map(|b| b.code.as_str()).collect();
            let message = format!(
                "Size range {} spans {} dummy bands ({}); an unusually broad population that may need staged outputs",
                range,
                resolved_bands.len(),
                codes.join(" → ")
            );
            warn!(bands = resolved_bands.len(), limit = self.settings.broad_range_band_limit, "Broad size range");
            if self.settings.reject_broad_ranges {
                errors.push(ValidationIssue {
                    kind: IssueKind::RuleViolation,
                    standard: None,
                    clause: BROAD_RANGE_CLAUSE.to_string(),
                    message,
                    bands: codes.iter().map(|c| c.to_string()).collect(),
                });
            } else {
                warnings.push(message);
            }
        }

        let valid = errors.is_empty();
        info!(
            valid,
            errors = errors.len(),
            warnings = warnings.len(),
            bands = resolved_bands.len(),
            "Validation finished"
        );

        Ok(ValidationOutcome {
            valid,
            errors,
            warnings,
            resolved_bands,
            resolutions,
            request: request.clone(),
            registry_version: self.registry.version.clone(),
            rules_version: self.rules.version.clone(),
        })
    }

    /// Like [`validate`](Self::validate), but a structural failure comes back
    /// as `Err(PlanError::Structural)` instead of inside the outcome.
    pub fn validate_strict(&self, request: &EngineeringRequest) -> PlanResult<ValidationOutcome> {
        self.check_structure(request)?;
        self.validate(request)
    }

    /// Structural checks; the first failure wins.
    fn check_structure(&self, request: &EngineeringRequest) -> PlanResult<()> {
        if request.standards.is_empty() {
            return Err(PlanError::structural("standards", "[]", "At least one standard must be selected"));
        }
        request.size_range.check()?;
        request.install_method.check_compatibility()?;
        for standard in &request.standards {
            if !standard.supports_product(request.product_type) {
                return Err(PlanError::structural(
                    "product_type",
                    request.product_type.display_name(),
                    format!("{} does not cover this product type", standard.code()),
                ));
            }
        }
        Ok(())
    }
}

/// Fold a band-level violation into the per-(standard, clause) error list.
fn merge_violation(errors: &mut Vec<ValidationIssue>, standard: Standard, violation: &crate::rules::RuleViolation) {
    if let Some(existing) = errors
        .iter_mut()
        .find(|e| e.kind == IssueKind::RuleViolation && e.standard == Some(standard) && e.clause == violation.clause)
    {
        existing.bands.push(violation.band.clone());
        existing.message.push_str("; ");
        existing.message.push_str(&violation.message);
        return;
    }
    errors.push(ValidationIssue {
        kind: IssueKind::RuleViolation,
        standard: Some(standard),
        clause: violation.clause.clone(),
        message: violation.message.clone(),
        bands: vec![violation.band.clone()],
    });
}

/// Distinct bands across standards, ascending by lower bound, ties in
/// standard-then-table order.
fn distinct_bands(resolutions: &[StandardResolution]) -> Vec<DummyBand> {
    let mut bands: Vec<DummyBand> = Vec::new();
    for resolved in resolutions.iter().flat_map(|r| &r.bands) {
        if !bands.iter().any(|b| b.same_identity(&resolved.band)) {
            bands.push(resolved.band.clone());
        }
    }
    bands.sort_by(|a, b| a.min_size_cm.total_cmp(&b.min_size_cm));
    bands
}
