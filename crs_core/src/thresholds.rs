//! # Safety Thresholds
//!
//! Injury-criteria limits per (standard, dummy). Values are looked up,
//! never computed or interpolated. A missing entry is a data-completeness
//! failure ([`PlanError::ThresholdNotFound`]) and is never papered over
//! with a default.
//!
//! ## Example
//!
//! ```rust
//! use crs_core::dummies::DummyRegistry;
//! use crs_core::standards::Standard;
//! use crs_core::thresholds::ThresholdTable;
//!
//! let q0 = DummyRegistry::builtin().find(Standard::UnR129, "Q0").unwrap();
//! let limits = ThresholdTable::builtin().thresholds_for(Standard::UnR129, q0).unwrap();
//! assert_eq!(limits.head_criterion, "HIC15");
//! assert_eq!(limits.head_injury_limit.value, 390.0);
//! ```

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dummies::DummyBand;
use crate::errors::{PlanError, PlanResult};
use crate::standards::Standard;
use crate::units::{Limit, LimitUnit};

static BUILTIN: Lazy<ThresholdTable> = Lazy::new(ThresholdTable::standard_limits);

/// Injury-criteria limits for one dummy under one standard.
///
/// ## JSON Example
///
/// ```json
/// {
///   "head_criterion": "HIC15",
///   "head_injury_limit": { "value": 390.0, "unit": "HIC" },
///   "chest_acceleration_limit": { "value": 55.0, "unit": "g" },
///   "neck_tension_limit": { "value": 1800.0, "unit": "N" },
///   "neck_compression_limit": { "value": 2200.0, "unit": "N" },
///   "head_excursion_limit": { "value": 550.0, "unit": "mm" },
///   "clause": "UN R129 §7.1.2"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    /// Head criterion the limit is expressed in (HIC15 or HIC36)
    pub head_criterion: String,
    pub head_injury_limit: Limit,
    /// 3 ms resultant chest acceleration
    pub chest_acceleration_limit: Limit,
    pub neck_tension_limit: Limit,
    pub neck_compression_limit: Limit,
    pub head_excursion_limit: Limit,
    /// Clause the limits are published in
    pub clause: String,
}

impl ThresholdSet {
    /// All five limits with their names, in report order
    pub fn limits(&self) -> [(&'static str, &Limit); 5] {
        [
            ("head", &self.head_injury_limit),
            ("chest", &self.chest_acceleration_limit),
            ("neck_tension", &self.neck_tension_limit),
            ("neck_compression", &self.neck_compression_limit),
            ("head_excursion", &self.head_excursion_limit),
        ]
    }
}

/// Threshold entries keyed by standard, then dummy code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    /// Table version, part of any memoization key
    pub version: Version,
    pub entries: BTreeMap<Standard, BTreeMap<String, ThresholdSet>>,
}

impl ThresholdTable {
    /// Shared built-in table.
    pub fn builtin() -> &'static ThresholdTable {
        &BUILTIN
    }

    pub fn new(version: Version, entries: BTreeMap<Standard, BTreeMap<String, ThresholdSet>>) -> PlanResult<Self> {
        let table = ThresholdTable { version, entries };
        table.check_invariants()?;
        Ok(table)
    }

    /// Load a table from JSON.
    pub fn from_json(json: &str) -> PlanResult<Self> {
        let table: ThresholdTable = serde_json::from_str(json)?;
        table.check_invariants()?;
        Ok(table)
    }

    pub fn to_json(&self) -> PlanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Limits for a resolved (standard, band) pair.
    ///
    /// # Errors
    ///
    /// * `ThresholdNotFound` if the table has no entry for the pair
    pub fn thresholds_for(&self, standard: Standard, band: &DummyBand) -> PlanResult<ThresholdSet> {
        self.entries
            .get(&standard)
            .and_then(|by_dummy| by_dummy.get(&band.code))
            .cloned()
            .ok_or_else(|| {
                warn!(standard = standard.code(), dummy = %band.code, "Threshold table has no entry");
                PlanError::threshold_not_found(standard.code(), band.code.clone())
            })
    }

    /// Every limit must be positive and carry the unit of its criterion.
    pub fn check_invariants(&self) -> PlanResult<()> {
        let expected = [LimitUnit::Hic, LimitUnit::G, LimitUnit::Newtons, LimitUnit::Newtons, LimitUnit::Millimeters];
        for (standard, by_dummy) in &self.entries {
            for (dummy, set) in by_dummy {
                for ((name, limit), unit) in set.limits().into_iter().zip(expected) {
                    if !(limit.value.is_finite() && limit.value > 0.0) {
                        return Err(PlanError::registry_invalid(
                            format!("thresholds ({})", standard.code()),
                            format!("{} {} limit must be positive", dummy, name),
                        ));
                    }
                    if limit.unit != unit {
                        return Err(PlanError::registry_invalid(
                            format!("thresholds ({})", standard.code()),
                            format!("{} {} limit has unit {:?}, expected {:?}", dummy, name, limit.unit, unit),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn standard_limits() -> ThresholdTable {
        let mut entries = BTreeMap::new();

        let r129 = "UN R129 §7.1.2";
        entries.insert(
            Standard::UnR129,
            dummy_map(&[
                ("Q0", limits("HIC15", 390.0, 55.0, 1800.0, 2200.0, 550.0, r129)),
                ("Q0+", limits("HIC15", 390.0, 55.0, 1800.0, 2200.0, 550.0, r129)),
                ("Q1", limits("HIC15", 390.0, 55.0, 1800.0, 2200.0, 550.0, r129)),
                ("Q1.5", limits("HIC15", 390.0, 55.0, 1800.0, 2200.0, 550.0, r129)),
                ("Q3", limits("HIC15", 390.0, 60.0, 2000.0, 2500.0, 650.0, r129)),
                ("Q3s", limits("HIC36", 1000.0, 60.0, 2000.0, 2500.0, 550.0, r129)),
                ("Q6", limits("HIC36", 1000.0, 60.0, 2000.0, 2500.0, 550.0, r129)),
                ("Q10", limits("HIC36", 1000.0, 60.0, 2000.0, 2500.0, 550.0, r129)),
            ]),
        );

        let gb = "GB 27887-2024 §6.4";
        entries.insert(
            Standard::Gb27887,
            dummy_map(&[
                ("Q0", limits("HIC15", 324.0, 55.0, 1800.0, 2200.0, 650.0, gb)),
                ("Q0+", limits("HIC15", 324.0, 55.0, 1800.0, 2200.0, 650.0, gb)),
                ("Q1", limits("HIC15", 324.0, 55.0, 1800.0, 2200.0, 650.0, gb)),
                ("Q1.5", limits("HIC15", 324.0, 55.0, 1800.0, 2200.0, 650.0, gb)),
                ("Q3", limits("HIC15", 324.0, 55.0, 2000.0, 2500.0, 720.0, gb)),
                ("Q3s", limits("HIC15", 324.0, 55.0, 2000.0, 2500.0, 720.0, gb)),
                ("Q6", limits("HIC15", 324.0, 55.0, 2000.0, 2500.0, 720.0, gb)),
                ("Q10", limits("HIC15", 324.0, 55.0, 2000.0, 2500.0, 720.0, gb)),
            ]),
        );

        let fmvss = "FMVSS 213 S5.1.2";
        entries.insert(
            Standard::Fmvss213,
            dummy_map(&[
                ("CRABI-12MO", limits("HIC36", 1000.0, 60.0, 1800.0, 2200.0, 813.0, fmvss)),
                ("HIII-3YR", limits("HIC36", 1000.0, 60.0, 1800.0, 2200.0, 813.0, fmvss)),
                ("Q3s", limits("HIC15", 570.0, 60.0, 1800.0, 2200.0, 813.0, "FMVSS 213a S5.1")),
                ("HIII-6YR", limits("HIC36", 1000.0, 60.0, 2000.0, 2500.0, 720.0, fmvss)),
                ("HIII-10YR", limits("HIC36", 1000.0, 60.0, 2000.0, 2500.0, 720.0, fmvss)),
            ]),
        );

        ThresholdTable {
            version: Version::new(1, 0, 0),
            entries,
        }
    }
}

fn limits(
    head_criterion: &str,
    hic: f64,
    chest_g: f64,
    tension_n: f64,
    compression_n: f64,
    excursion_mm: f64,
    clause: &str,
) -> ThresholdSet {
    ThresholdSet {
        head_criterion: head_criterion.to_string(),
        head_injury_limit: Limit::new(hic, LimitUnit::Hic),
        chest_acceleration_limit: Limit::new(chest_g, LimitUnit::G),
        neck_tension_limit: Limit::new(tension_n, LimitUnit::Newtons),
        neck_compression_limit: Limit::new(compression_n, LimitUnit::Newtons),
        head_excursion_limit: Limit::new(excursion_mm, LimitUnit::Millimeters),
        clause: clause.to_string(),
    }
}

fn dummy_map(rows: &[(&str, ThresholdSet)]) -> BTreeMap<String, ThresholdSet> {
    rows.iter()
        .map(|(code, set)| (code.to_string(), set.clone()))
        .collect()
}
