//! Dummy band tables per standard.
//!
//! The built-in tables are constructed once on first use and shared
//! read-only for the life of the process. Hosts with their own reference
//! data load a registry from JSON instead; either way the table invariants
//! are checked before the registry is handed out.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use semver::Version;
use serde::{Deserialize, Serialize};

use super::DummyBand;
use crate::errors::{PlanError, PlanResult};
use crate::install::Orientation;
use crate::standards::Standard;
use crate::units::{Kilograms, PoundsMass};

static BUILTIN: Lazy<DummyRegistry> = Lazy::new(DummyRegistry::standard_tables);

/// Immutable set of dummy band tables, one per standard.
///
/// ## JSON Format
///
/// ```json
/// {
///   "version": "1.0.0",
///   "tables": {
///     "UN R129": [ { "code": "Q0", "min_size_cm": 40.0, ... } ]
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyRegistry {
    /// Table version, part of any memoization key
    pub version: Version,

    /// Band tables keyed by standard, each sorted by `min_size_cm`
    pub tables: BTreeMap<Standard, Vec<DummyBand>>,
}

impl DummyRegistry {
    /// Shared built-in registry.
    pub fn builtin() -> &'static DummyRegistry {
        &BUILTIN
    }

    /// Build a registry from tables, checking every invariant.
    pub fn new(version: Version, tables: BTreeMap<Standard, Vec<DummyBand>>) -> PlanResult<Self> {
        let registry = DummyRegistry { version, tables };
        registry.check_invariants()?;
        Ok(registry)
    }

    /// Load a registry from JSON.
    pub fn from_json(json: &str) -> PlanResult<Self> {
        let registry: DummyRegistry = serde_json::from_str(json)?;
        registry.check_invariants()?;
        Ok(registry)
    }

    /// Serialize the registry to pretty JSON
    pub fn to_json(&self) -> PlanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Band table for a standard, in registry order
    pub fn bands(&self, standard: Standard) -> Option<&[DummyBand]> {
        self.tables.get(&standard).map(Vec::as_slice)
    }

    /// Find a band by dummy code within a standard
    pub fn find(&self, standard: Standard, code: &str) -> Option<&DummyBand> {
        self.bands(standard)?.iter().find(|b| b.code == code)
    }

    /// Stature range a standard's table covers, `(min, max)` in cm
    pub fn envelope(&self, standard: Standard) -> Option<(f64, f64)> {
        let bands = self.bands(standard)?;
        let min = bands.first()?.min_size_cm;
        let max = bands.iter().map(|b| b.max_size_cm).fold(f64::MIN, f64::max);
        Some((min, max))
    }

    /// Check table invariants: non-empty, well-formed bands, sorted by lower
    /// bound, unique codes, and no gaps across the covered range.
    pub fn check_invariants(&self) -> PlanResult<()> {
        for (standard, bands) in &self.tables {
            let table = format!("dummy bands ({})", standard.code());
            if bands.is_empty() {
                return Err(PlanError::registry_invalid(table, "table is empty"));
            }

            let mut reach = f64::MIN;
            for (i, band) in bands.iter().enumerate() {
                if !band.min_size_cm.is_finite() || !band.max_size_cm.is_finite() {
                    return Err(PlanError::registry_invalid(table, format!("{} has a non-finite bound", band.code)));
                }
                if band.min_size_cm >= band.max_size_cm {
                    return Err(PlanError::registry_invalid(
                        table,
                        format!("{} has min {} >= max {}", band.code, band.min_size_cm, band.max_size_cm),
                    ));
                }
                if band.mass_kg <= 0.0 {
                    return Err(PlanError::registry_invalid(table, format!("{} has non-positive mass", band.code)));
                }
                if bands[..i].iter().any(|b| b.code == band.code) {
                    return Err(PlanError::registry_invalid(table, format!("duplicate dummy code {}", band.code)));
                }
                if i > 0 {
                    let prev = &bands[i - 1];
                    if band.min_size_cm < prev.min_size_cm {
                        return Err(PlanError::registry_invalid(
                            table,
                            format!("{} is not sorted after {}", band.code, prev.code),
                        ));
                    }
                    // Overlap is allowed, a gap is not
                    if band.min_size_cm > reach {
                        return Err(PlanError::registry_invalid(
                            table,
                            format!("gap between {}cm and {}cm before {}", reach, band.min_size_cm, band.code),
                        ));
                    }
                }
                reach = reach.max(band.max_size_cm);
            }
        }
        Ok(())
    }

    /// Built-in tables for the standards catalogue.
    fn standard_tables() -> DummyRegistry {
        let mut tables = BTreeMap::new();
        tables.insert(Standard::UnR129, q_series("UN R129 Annex 8"));
        tables.insert(Standard::Gb27887, q_series("GB 27887-2024 Annex F"));
        tables.insert(Standard::Fmvss213, fmvss_213_dummies());
        DummyRegistry {
            version: Version::new(1, 0, 0),
            tables,
        }
    }
}

/// Q-series dummies as used by R129 and the standards that adopt its bands.
fn q_series(clause: &str) -> Vec<DummyBand> {
    use Orientation::{Forward, Rearward};

    vec![
        DummyBand::new("Q0", 40.0, 50.0, 3.5, Rearward, clause).with_labels("0-6 months", "Group 0+"),
        DummyBand::new("Q0+", 50.0, 60.0, 5.0, Rearward, clause).with_labels("6-12 months", "Group 0+"),
        DummyBand::new("Q1", 60.0, 75.0, 7.5, Rearward, clause).with_labels("1-2 years", "Group 0+/1"),
        DummyBand::new("Q1.5", 75.0, 87.0, 9.5, Rearward, clause).with_labels("2-3 years", "Group 1"),
        DummyBand::new("Q3", 87.0, 105.0, 15.0, Rearward, clause).with_labels("3-4 years", "Group 2"),
        DummyBand::new("Q3s", 105.0, 125.0, 21.0, Forward, clause).with_labels("4-6 years", "Group 2/3"),
        DummyBand::new("Q6", 125.0, 145.0, 29.0, Forward, clause).with_labels("6-10 years", "Group 3"),
        DummyBand::new("Q10", 145.0, 150.0, 36.0, Forward, clause).with_labels("10-12 years", "Group 3"),
    ]
}

/// FMVSS 213 dummy family (49 CFR Part 572). Masses are published in pounds.
fn fmvss_213_dummies() -> Vec<DummyBand> {
    use Orientation::{Forward, Rearward};

    let kg = |lb: f64| Kilograms::from(PoundsMass(lb)).value();
    vec![
        DummyBand::new("CRABI-12MO", 66.0, 87.0, kg(22.0), Rearward, "49 CFR 572 Subpart R")
            .with_labels("12 months", "Infant"),
        DummyBand::new("HIII-3YR", 87.0, 105.0, kg(35.7), Rearward, "49 CFR 572 Subpart P")
            .with_labels("3 years", "Toddler"),
        // Side-impact dummy sharing the 3-year window (FMVSS 213a)
        DummyBand::new("Q3s", 90.0, 105.0, kg(32.0), Rearward, "49 CFR 572 Subpart W")
            .with_labels("3 years", "Toddler"),
        DummyBand::new("HIII-6YR", 105.0, 125.0, kg(51.6), Forward, "49 CFR 572 Subpart N")
            .with_labels("6 years", "Child"),
        DummyBand::new("HIII-10YR", 125.0, 150.0, kg(77.6), Forward, "49 CFR 572 Subpart T")
            .with_labels("10 years", "Child"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_hold_invariants() {
        let registry = DummyRegistry::builtin();
        registry.check_invariants().unwrap();
        for standard in Standard::ALL {
            assert!(registry.bands(standard).is_some(), "missing table for {}", standard);
        }
    }

    #[test]
    fn test_envelopes() {
        let registry = DummyRegistry::builtin();
        assert_eq!(registry.envelope(Standard::UnR129), Some((40.0, 150.0)));
        assert_eq!(registry.envelope(Standard::Fmvss213), Some((66.0, 150.0)));
    }

    #[test]
    fn test_fmvss_dual_dummy_window_is_permitted() {
        let registry = DummyRegistry::builtin();
        let hiii = registry.find(Standard::Fmvss213, "HIII-3YR").unwrap();
        let q3s = registry.find(Standard::Fmvss213, "Q3s").unwrap();
        assert!(hiii.overlaps(q3s.min_size_cm, q3s.max_size_cm));
    }

    #[test]
    fn test_gap_rejected() {
        let mut tables = BTreeMap::new();
        tables.insert(
            Standard::UnR129,
            vec![
                DummyBand::new("A", 40.0, 60.0, 4.0, Orientation::Rearward, "t"),
                DummyBand::new("B", 70.0, 90.0, 9.0, Orientation::Rearward, "t"),
            ],
        );
        let err = DummyRegistry::new(Version::new(0, 1, 0), tables).unwrap_err();
        assert_eq!(err.error_code(), "REGISTRY_INVALID");
        assert!(err.to_string().contains("gap"));
    }

    #[test]
    fn test_unsorted_and_inverted_rejected() {
        let mut tables = BTreeMap::new();
        tables.insert(
            Standard::UnR129,
            vec![
                DummyBand::new("B", 60.0, 90.0, 9.0, Orientation::Rearward, "t"),
                DummyBand::new("A", 40.0, 60.0, 4.0, Orientation::Rearward, "t"),
            ],
        );
        assert!(DummyRegistry::new(Version::new(0, 1, 0), tables).is_err());

        let mut tables = BTreeMap::new();
        tables.insert(
            Standard::UnR129,
            vec![DummyBand::new("A", 60.0, 40.0, 4.0, Orientation::Rearward, "t")],
        );
        assert!(DummyRegistry::new(Version::new(0, 1, 0), tables).is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_tables() {
        let registry = DummyRegistry::builtin();
        let json = registry.to_json().unwrap();
        assert!(json.contains("\"UN R129\""));
        let loaded = DummyRegistry::from_json(&json).unwrap();
        assert_eq!(loaded.version, registry.version);
        for standard in Standard::ALL {
            let original = registry.bands(standard).unwrap();
            let reloaded = loaded.bands(standard).unwrap();
            assert_eq!(original.len(), reloaded.len());
            assert!(original.iter().zip(reloaded).all(|(a, b)| a.same_identity(b)));
        }
    }

    #[test]
    fn test_json_loader_checks_invariants() {
        let json = r#"{
            "version": "2.0.0",
            "tables": {
                "FMVSS 213": [
                    { "code": "X", "min_size_cm": 80.0, "max_size_cm": 70.0, "mass_kg": 10.0,
                      "mandated_orientation": "REARWARD", "source_clause": "t" }
                ]
            }
        }"#;
        assert!(DummyRegistry::from_json(json).is_err());
    }
}
