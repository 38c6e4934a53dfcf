//! # Orientation & Anti-Rotation Rules
//!
//! Installation rules are data, not code: each standard owns a [`RuleSet`]
//! of [`InstallRule`]s, and one evaluator applies them uniformly. Adding a
//! standard means adding rows to the [`RuleBook`].
//!
//! ## Built-in Rules (all three standards)
//!
//! | Predicate          | Rule                                   | Example clause  |
//! |--------------------|----------------------------------------|-----------------|
//! | band max ≤ 105 cm  | forced rearward facing                 | UN R129 §5.1.3  |
//! | band min ≥ 105 cm  | forward facing requires a top tether   | UN R129 §6.1.2  |
//!
//! ## Straddling Bands
//!
//! A band reaching both sides of a rule threshold is split into segments at
//! that threshold. Each segment picks up its own constraints, and all of
//! them stay attached to the one band; no new band is fabricated. The lower
//! segment of a band straddling 105 cm forces rearward facing for the whole
//! band.
//!
//! ## Unspecified Orientation
//!
//! With no request and nothing forced, a band faces the way its device rule
//! is written for (forward at or above 105 cm). A band's own
//! `mandated_orientation` is only consulted when no rule applies at all.
//!
//! ## Example
//!
//! ```rust
//! use crs_core::dummies::DummyRegistry;
//! use crs_core::install::{AntiRotation, InstallMethod, Mechanism, Orientation, RequestedOrientation};
//! use crs_core::rules::RuleBook;
//! use crs_core::standards::Standard;
//!
//! let q1 = DummyRegistry::builtin().find(Standard::UnR129, "Q1").unwrap();
//! let method = InstallMethod::new(Mechanism::Isofix3Pt, RequestedOrientation::Forward, AntiRotation::TopTether);
//!
//! let eval = RuleBook::builtin().evaluate(Standard::UnR129, q1, &method).unwrap();
//! assert_eq!(eval.orientation, Orientation::Rearward);
//! assert_eq!(eval.violations[0].clause, "UN R129 §5.1.3");
//! ```

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::dummies::DummyBand;
use crate::errors::{PlanError, PlanResult};
use crate::install::{AntiRotation, InstallMethod, Orientation};
use crate::standards::Standard;

/// Stature at which forward facing becomes permissible (cm)
pub const REARWARD_MANDATE_CM: f64 = 105.0;

static BUILTIN: Lazy<RuleBook> = Lazy::new(RuleBook::standard_rules);

// ============================================================================
// Rule Table
// ============================================================================

/// Which part of the stature axis a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum BandPredicate {
    /// Segment upper bound at or below `cm`
    MaxAtMost { cm: f64 },
    /// Segment lower bound at or above `cm`
    MinAtLeast { cm: f64 },
}

impl BandPredicate {
    fn threshold(&self) -> f64 {
        match self {
            BandPredicate::MaxAtMost { cm } | BandPredicate::MinAtLeast { cm } => *cm,
        }
    }

    fn matches(&self, min_cm: f64, max_cm: f64) -> bool {
        match self {
            BandPredicate::MaxAtMost { cm } => max_cm <= *cm,
            BandPredicate::MinAtLeast { cm } => min_cm >= *cm,
        }
    }
}

/// What a rule mandates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mandate", rename_all = "snake_case")]
pub enum Mandate {
    /// Installation must face `orientation`; a contrary request violates the clause
    ForceOrientation { orientation: Orientation },
    /// When installed facing `when`, `device` is mandatory
    RequireDevice { when: Orientation, device: AntiRotation },
}

/// One row of the rule table.
///
/// ## JSON Example
///
/// ```json
/// {
///   "predicate": { "when": "min_at_least", "cm": 105.0 },
///   "mandate": { "mandate": "require_device", "when": "FORWARD", "device": "TOP_TETHER" },
///   "clause": "UN R129 §6.1.2"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallRule {
    pub predicate: BandPredicate,
    pub mandate: Mandate,
    pub clause: String,
}

impl InstallRule {
    pub fn new(predicate: BandPredicate, mandate: Mandate, clause: impl Into<String>) -> Self {
        InstallRule {
            predicate,
            mandate,
            clause: clause.into(),
        }
    }
}

/// Rules for a single standard, evaluated in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RuleSet {
    pub rules: Vec<InstallRule>,
}

/// Rule sets for every standard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBook {
    /// Table version, part of any memoization key
    pub version: Version,
    pub sets: BTreeMap<Standard, RuleSet>,
}

// ============================================================================
// Evaluation Results
// ============================================================================

/// A constraint that applies to one stature segment of a band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConstraint {
    pub min_cm: f64,
    pub max_cm: f64,
    /// Orientation forced on the segment, if any
    pub forced_orientation: Option<Orientation>,
    /// Device required on the segment, and the facing that triggers it
    pub required_device: Option<(Orientation, AntiRotation)>,
    pub clause: String,
}

/// A mandated clause the request contradicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub clause: String,
    /// Dummy code of the band the violation was found on
    pub band: String,
    pub message: String,
}

/// Outcome of evaluating one band against one installation method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Effective installation orientation
    pub orientation: Orientation,
    /// Effective anti-rotation device
    pub anti_rotation: AntiRotation,
    /// Every segment constraint attached to the band
    pub constraints: Vec<SegmentConstraint>,
    /// Clauses the request violates; empty when compliant
    pub violations: Vec<RuleViolation>,
}

impl Evaluation {
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }
}

// ============================================================================
// Evaluator
// ============================================================================

impl RuleSet {
    pub fn new(rules: Vec<InstallRule>) -> Self {
        RuleSet { rules }
    }

    /// Split a band at every rule threshold strictly inside it.
    fn segments(&self, band: &DummyBand) -> Vec<(f64, f64)> {
        let mut cuts: Vec<f64> = self
            .rules
            .iter()
            .map(|r| r.predicate.threshold())
            .filter(|cm| band.straddles(*cm))
            .collect();
        cuts.sort_by(f64::total_cmp);
        cuts.dedup();

        let mut segments = Vec::with_capacity(cuts.len() + 1);
        let mut lo = band.min_size_cm;
        for cut in cuts {
            segments.push((lo, cut));
            lo = cut;
        }
        segments.push((lo, band.max_size_cm));
        segments
    }

    /// Evaluate one band against an installation method.
    ///
    /// Pure function: violations are returned, never raised.
    pub fn evaluate(&self, band: &DummyBand, method: &InstallMethod) -> Evaluation {
        let mut constraints = Vec::new();
        for (lo, hi) in self.segments(band) {
            for rule in self.rules.iter().filter(|r| r.predicate.matches(lo, hi)) {
                let (forced_orientation, required_device) = match rule.mandate {
                    Mandate::ForceOrientation { orientation } => (Some(orientation), None),
                    Mandate::RequireDevice { when, device } => (None, Some((when, device))),
                };
                constraints.push(SegmentConstraint {
                    min_cm: lo,
                    max_cm: hi,
                    forced_orientation,
                    required_device,
                    clause: rule.clause.clone(),
                });
            }
        }

        let requested = method.requested_orientation.explicit();
        let forced = constraints.iter().find_map(|c| c.forced_orientation);
        // Unforced and unrequested: face the way the device rule is written for
        let ruled = constraints.iter().find_map(|c| c.required_device.map(|(when, _)| when));
        let orientation = forced
            .or(requested)
            .or(ruled)
            .unwrap_or(band.mandated_orientation);

        let mut violations: Vec<RuleViolation> = Vec::new();
        let mut record = |clause: &str, message: String| {
            if !violations.iter().any(|v| v.clause == clause) {
                violations.push(RuleViolation {
                    clause: clause.to_string(),
                    band: band.code.clone(),
                    message,
                });
            }
        };

        for c in &constraints {
            if let (Some(forced), Some(asked)) = (c.forced_orientation, requested) {
                if forced != asked {
                    record(
                        &c.clause,
                        format!(
                            "{} ({}) must be installed {}; {} was requested",
                            band.code,
                            band.range_label(),
                            forced.to_string().to_lowercase(),
                            asked.to_string().to_lowercase()
                        ),
                    );
                }
            }
            if let Some((when, device)) = c.required_device {
                if orientation == when && method.anti_rotation != device {
                    record(
                        &c.clause,
                        format!(
                            "{} ({}) installed {} requires {}; {} was requested",
                            band.code,
                            band.range_label(),
                            when.to_string().to_lowercase(),
                            device.display_name().to_lowercase(),
                            method.anti_rotation.display_name().to_lowercase()
                        ),
                    );
                }
            }
        }

        Evaluation {
            orientation,
            anti_rotation: method.anti_rotation,
            constraints,
            violations,
        }
    }
}

impl RuleBook {
    /// Shared built-in rule book.
    pub fn builtin() -> &'static RuleBook {
        &BUILTIN
    }

    /// Build a rule book, checking every rule is well-formed.
    pub fn new(version: Version, sets: BTreeMap<Standard, RuleSet>) -> PlanResult<Self> {
        let book = RuleBook { version, sets };
        book.check_invariants()?;
        Ok(book)
    }

    /// Load a rule book from JSON.
    pub fn from_json(json: &str) -> PlanResult<Self> {
        let book: RuleBook = serde_json::from_str(json)?;
        book.check_invariants()?;
        Ok(book)
    }

    pub fn to_json(&self) -> PlanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn rules(&self, standard: Standard) -> Option<&RuleSet> {
        self.sets.get(&standard)
    }

    /// Evaluate a band under a standard's rules.
    ///
    /// # Errors
    ///
    /// * `RegistryInvalid` if the book has no rule set for the standard
    pub fn evaluate(&self, standard: Standard, band: &DummyBand, method: &InstallMethod) -> PlanResult<Evaluation> {
        let set = self.rules(standard).ok_or_else(|| {
            PlanError::registry_invalid("install rules", format!("no rule set registered for {}", standard.code()))
        })?;
        Ok(set.evaluate(band, method))
    }

    pub fn check_invariants(&self) -> PlanResult<()> {
        for (standard, set) in &self.sets {
            let table = format!("install rules ({})", standard.code());
            for rule in &set.rules {
                if !rule.predicate.threshold().is_finite() {
                    return Err(PlanError::registry_invalid(table, "rule threshold must be finite"));
                }
                if rule.clause.trim().is_empty() {
                    return Err(PlanError::registry_invalid(table, "every rule must cite a clause"));
                }
            }
        }
        Ok(())
    }

    fn standard_rules() -> RuleBook {
        let mut sets = BTreeMap::new();
        sets.insert(Standard::UnR129, mandate_pair("UN R129 §5.1.3", "UN R129 §6.1.2"));
        sets.insert(Standard::Gb27887, mandate_pair("GB 27887-2024 §5.1.3", "GB 27887-2024 §6.1.2"));
        sets.insert(Standard::Fmvss213, mandate_pair("FMVSS 213 S5.5.2", "FMVSS 213 S5.9"));
        RuleBook {
            version: Version::new(1, 0, 0),
            sets,
        }
    }
}

/// Rearward mandate below 105 cm plus the top-tether mandate above it.
fn mandate_pair(rearward_clause: &str, tether_clause: &str) -> RuleSet {
    RuleSet::new(vec![
        InstallRule::new(
            BandPredicate::MaxAtMost { cm: REARWARD_MANDATE_CM },
            Mandate::ForceOrientation {
                orientation: Orientation::Rearward,
            },
            rearward_clause,
        ),
        InstallRule::new(
            BandPredicate::MinAtLeast { cm: REARWARD_MANDATE_CM },
            Mandate::RequireDevice {
                when: Orientation::Forward,
                device: AntiRotation::TopTether,
            },
            tether_clause,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummies::DummyRegistry;
    use crate::install::{Mechanism, RequestedOrientation};

    fn band(code: &str) -> DummyBand {
        DummyRegistry::builtin().find(Standard::UnR129, code).unwrap().clone()
    }

    fn method(orientation: RequestedOrientation, device: AntiRotation) -> InstallMethod {
        InstallMethod::new(Mechanism::Isofix3Pt, orientation, device)
    }

    fn r129() -> &'static RuleSet {
        RuleBook::builtin().rules(Standard::UnR129).unwrap()
    }

    #[test]
    fn test_low_band_forces_rearward() {
        let eval = r129().evaluate(&band("Q1.5"), &method(RequestedOrientation::Forward, AntiRotation::TopTether));
        assert_eq!(eval.orientation, Orientation::Rearward);
        assert_eq!(eval.violations.len(), 1);
        assert_eq!(eval.violations[0].clause, "UN R129 §5.1.3");
        assert_eq!(eval.violations[0].band, "Q1.5");
    }

    #[test]
    fn test_low_band_unspecified_defaults_rearward() {
        let eval = r129().evaluate(&band("Q3"), &method(RequestedOrientation::Unspecified, AntiRotation::SupportLeg));
        assert_eq!(eval.orientation, Orientation::Rearward);
        assert!(eval.is_compliant());
    }

    #[test]
    fn test_forward_high_band_needs_tether() {
        let eval = r129().evaluate(&band("Q6"), &method(RequestedOrientation::Forward, AntiRotation::SupportLeg));
        assert_eq!(eval.orientation, Orientation::Forward);
        assert_eq!(eval.violations.len(), 1);
        assert_eq!(eval.violations[0].clause, "UN R129 §6.1.2");

        let eval = r129().evaluate(&band("Q6"), &method(RequestedOrientation::Forward, AntiRotation::TopTether));
        assert!(eval.is_compliant());
        assert_eq!(eval.anti_rotation, AntiRotation::TopTether);
    }

    #[test]
    fn test_default_forward_also_needs_tether() {
        let eval = r129().evaluate(&band("Q10"), &method(RequestedOrientation::Unspecified, AntiRotation::SupportLeg));
        assert_eq!(eval.orientation, Orientation::Forward);
        assert_eq!(eval.violations.len(), 1);
    }

    #[test]
    fn test_unspecified_default_follows_rules_not_band_data() {
        let mut registry = DummyRegistry::builtin().clone();
        if let Some(bands) = registry.tables.get_mut(&Standard::UnR129) {
            for band in bands.iter_mut().filter(|b| b.code == "Q6") {
                band.mandated_orientation = Orientation::Rearward;
            }
        }
        let q6 = registry.find(Standard::UnR129, "Q6").unwrap();
        assert_eq!(q6.mandated_orientation, Orientation::Rearward);

        let eval = r129().evaluate(q6, &method(RequestedOrientation::Unspecified, AntiRotation::SupportLeg));
        assert_eq!(eval.orientation, Orientation::Forward);
        assert_eq!(eval.violations.len(), 1);
        assert_eq!(eval.violations[0].clause, "UN R129 §6.1.2");
    }

    #[test]
    fn test_band_data_used_when_no_rule_applies() {
        let empty = RuleSet::default();
        let eval = empty.evaluate(&band("Q6"), &method(RequestedOrientation::Unspecified, AntiRotation::SupportLeg));
        assert_eq!(eval.orientation, Orientation::Forward);
        assert!(eval.constraints.is_empty());
    }

    #[test]
    fn test_rearward_allowed_above_threshold() {
        let eval = r129().evaluate(&band("Q3s"), &method(RequestedOrientation::Rearward, AntiRotation::SupportLeg));
        assert_eq!(eval.orientation, Orientation::Rearward);
        assert!(eval.is_compliant());
    }

    #[test]
    fn test_straddling_band_gets_two_constraints() {
        let straddler = DummyBand::new("Q3-EXT", 95.0, 115.0, 17.0, Orientation::Rearward, "test");

        let eval = r129().evaluate(&straddler, &method(RequestedOrientation::Unspecified, AntiRotation::SupportLeg));
        assert_eq!(eval.constraints.len(), 2);
        assert_eq!((eval.constraints[0].min_cm, eval.constraints[0].max_cm), (95.0, 105.0));
        assert_eq!(eval.constraints[0].forced_orientation, Some(Orientation::Rearward));
        assert_eq!((eval.constraints[1].min_cm, eval.constraints[1].max_cm), (105.0, 115.0));
        assert_eq!(
            eval.constraints[1].required_device,
            Some((Orientation::Forward, AntiRotation::TopTether))
        );
        assert_eq!(eval.orientation, Orientation::Rearward);
        assert!(eval.is_compliant());

        let eval = r129().evaluate(&straddler, &method(RequestedOrientation::Forward, AntiRotation::TopTether));
        assert_eq!(eval.orientation, Orientation::Rearward);
        assert_eq!(eval.violations.len(), 1);
        assert_eq!(eval.violations[0].clause, "UN R129 §5.1.3");
    }

    #[test]
    fn test_missing_rule_set() {
        let mut book = RuleBook::builtin().clone();
        book.sets.remove(&Standard::Fmvss213);
        let err = book.evaluate(Standard::Fmvss213, &band("Q0"), &method(RequestedOrientation::Rearward, AntiRotation::SupportLeg));
        assert_eq!(err.unwrap_err().error_code(), "REGISTRY_INVALID");
    }

    #[test]
    fn test_json_roundtrip() {
        let json = RuleBook::builtin().to_json().unwrap();
        assert!(json.contains("\"min_at_least\""));
        assert!(json.contains("\"require_device\""));
        let loaded = RuleBook::from_json(&json).unwrap();
        assert_eq!(&loaded, RuleBook::builtin());
    }

    #[test]
    fn test_rule_without_clause_rejected() {
        let mut sets = BTreeMap::new();
        sets.insert(
            Standard::UnR129,
            RuleSet::new(vec![InstallRule::new(
                BandPredicate::MaxAtMost { cm: 105.0 },
                Mandate::ForceOrientation {
                    orientation: Orientation::Rearward,
                },
                "  ",
            )]),
        );
        assert!(RuleBook::new(Version::new(1, 0, 0), sets).is_err());
    }
}
