//! # Standards Catalogue
//!
//! Regulatory standards the engine can plan against, the product categories
//! they cover, and the dynamic test pulses each one prescribes.
//!
//! Each standard is isolated: it owns its own dummy band table, rule table
//! and injury-criteria table. GB 27887-2024 adopts the UN R129 dummy bands
//! but publishes its own limits, so the two never share threshold rows.
//!
//! ## Example
//!
//! ```rust
//! use crs_core::standards::{ImpactType, ProductType, Standard};
//!
//! let std: Standard = "UN R129".parse().unwrap();
//! assert!(std.supports_product(ProductType::ChildRestraintSystem));
//!
//! let pulse = std.pulse(ImpactType::Frontal).unwrap();
//! assert_eq!(pulse.velocity_kmh, 50.0);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PlanError;

// ============================================================================
// Standards
// ============================================================================

/// A regulatory standard with a registered dummy band table.
///
/// Declaration order is the registry order used for every deterministic
/// ordering in the engine (standards outer loop in the test matrix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Standard {
    /// UN Regulation No. 129 (i-Size)
    #[serde(rename = "UN R129")]
    UnR129,
    /// GB 27887-2024, Chinese national standard aligned with R129
    #[serde(rename = "GB 27887-2024")]
    Gb27887,
    /// US Federal Motor Vehicle Safety Standard 213
    #[serde(rename = "FMVSS 213")]
    Fmvss213,
}

impl Standard {
    /// All standards in registry order
    pub const ALL: [Standard; 3] = [Standard::UnR129, Standard::Gb27887, Standard::Fmvss213];

    /// Short code used in test matrices and clause citations
    pub fn code(&self) -> &'static str {
        match self {
            Standard::UnR129 => "UN R129",
            Standard::Gb27887 => "GB 27887-2024",
            Standard::Fmvss213 => "FMVSS 213",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Standard::UnR129 => "UN R129 (i-Size)",
            Standard::Gb27887 => "GB 27887-2024 (i-Size equivalent)",
            Standard::Fmvss213 => "FMVSS 213",
        }
    }

    /// Region the standard applies in
    pub fn region(&self) -> &'static str {
        match self {
            Standard::UnR129 => "ECE",
            Standard::Gb27887 => "CN",
            Standard::Fmvss213 => "USA",
        }
    }

    /// Revision the built-in tables were taken from
    pub fn revision(&self) -> &'static str {
        match self {
            Standard::UnR129 => "Rev.4",
            Standard::Gb27887 => "2024",
            Standard::Fmvss213 => "Rev.8",
        }
    }

    /// Effective date of that revision (ISO 8601)
    pub fn effective_date(&self) -> &'static str {
        match self {
            Standard::UnR129 => "2018-12-29",
            Standard::Gb27887 => "2024-05-28",
            Standard::Fmvss213 => "2023-03-15",
        }
    }

    /// Catalogue entry recorded with every generated matrix
    pub fn edition(&self) -> StandardEdition {
        StandardEdition {
            code: self.code().to_string(),
            name: self.display_name().to_string(),
            region: self.region().to_string(),
            revision: self.revision().to_string(),
            effective_date: self.effective_date().to_string(),
        }
    }

    /// Product categories the standard covers
    pub fn supported_products(&self) -> &'static [ProductType] {
        // All three are vehicle restraint regulations with identical scope
        const RESTRAINTS: &[ProductType] = &[
            ProductType::ChildRestraintSystem,
            ProductType::InfantCarrier,
            ProductType::BoosterSeat,
        ];
        match self {
            Standard::UnR129 | Standard::Gb27887 | Standard::Fmvss213 => RESTRAINTS,
        }
    }

    /// Check if the standard covers a product category
    pub fn supports_product(&self, product: ProductType) -> bool {
        self.supported_products().contains(&product)
    }

    /// Dynamic test pulse prescribed for an impact type, if the standard
    /// has one.
    pub fn pulse(&self, impact: ImpactType) -> Option<TestPulse> {
        match (self, impact) {
            (Standard::UnR129 | Standard::Gb27887, ImpactType::Frontal) => {
                Some(TestPulse::new(50.0, Some((28.0, 32.0))))
            }
            (Standard::UnR129 | Standard::Gb27887, ImpactType::Lateral) => Some(TestPulse::new(24.0, None)),
            (Standard::UnR129 | Standard::Gb27887, ImpactType::Rear) => {
                Some(TestPulse::new(30.0, Some((20.0, 25.0))))
            }
            (Standard::Fmvss213, ImpactType::Frontal) => Some(TestPulse::new(48.0, Some((28.0, 32.0)))),
            (Standard::Fmvss213, _) => None,
        }
    }

    /// Look up a standard by its code (case-insensitive, whitespace tolerant)
    pub fn from_code(code: &str) -> Option<Standard> {
        let wanted = normalize_code(code);
        Standard::ALL
            .into_iter()
            .find(|s| normalize_code(s.code()) == wanted)
    }
}

fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Standard {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Standard::from_code(s).ok_or_else(|| PlanError::UnknownStandard { code: s.to_string() })
    }
}

// ============================================================================
// Product Types
// ============================================================================

/// Product category being designed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    /// Integral child restraint system (convertible / all-in-one)
    #[default]
    ChildRestraintSystem,
    /// Rearward-facing infant carrier
    InfantCarrier,
    /// High-back booster seat
    BoosterSeat,
    /// Pushchair; no dynamic sled test in the catalogue
    Stroller,
}

impl ProductType {
    /// Supported body-size envelope in cm, `None` for non-restraint products
    pub fn envelope_cm(&self) -> Option<(f64, f64)> {
        match self {
            ProductType::ChildRestraintSystem => Some((40.0, 150.0)),
            ProductType::InfantCarrier => Some((40.0, 87.0)),
            ProductType::BoosterSeat => Some((100.0, 150.0)),
            ProductType::Stroller => None,
        }
    }

    /// Baseline impact designation for the category's test matrix.
    ///
    /// Lateral and rear variants are an extension point; every category
    /// currently plans frontal sled tests only.
    pub fn baseline_impact(&self) -> ImpactType {
        ImpactType::Frontal
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ProductType::ChildRestraintSystem => "Child restraint system",
            ProductType::InfantCarrier => "Infant carrier",
            ProductType::BoosterSeat => "Booster seat",
            ProductType::Stroller => "Stroller",
        }
    }
}

/// Which edition of a standard a plan was produced against.
///
/// ## JSON Example
///
/// ```json
/// {
///   "code": "UN R129",
///   "name": "UN R129 (i-Size)",
///   "region": "ECE",
///   "revision": "Rev.4",
///   "effective_date": "2018-12-29"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardEdition {
    pub code: String,
    pub name: String,
    pub region: String,
    pub revision: String,
    /// ISO 8601 date
    pub effective_date: String,
}

// ============================================================================
// Impact Types and Pulses
// ============================================================================

/// Sled test impact direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImpactType {
    Frontal,
    Rear,
    Lateral,
}

/// Sled pulse definition: impact velocity and deceleration corridor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestPulse {
    /// Impact velocity (km/h)
    pub velocity_kmh: f64,
    /// Deceleration corridor (g), `None` where the standard defines none
    pub deceleration_g: Option<(f64, f64)>,
}

impl TestPulse {
    pub const fn new(velocity_kmh: f64, deceleration_g: Option<(f64, f64)>) -> Self {
        TestPulse {
            velocity_kmh,
            deceleration_g,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_is_lenient() {
        assert_eq!(Standard::from_code("un r129"), Some(Standard::UnR129));
        assert_eq!(Standard::from_code("FMVSS213"), Some(Standard::Fmvss213));
        assert_eq!(Standard::from_code("GB 27887-2024"), Some(Standard::Gb27887));
        assert_eq!(Standard::from_code("EN 1888"), None);
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "ECE R44".parse::<Standard>().unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_STANDARD");
    }

    #[test]
    fn test_registry_order() {
        let mut shuffled = vec![Standard::Fmvss213, Standard::UnR129, Standard::Gb27887];
        shuffled.sort();
        assert_eq!(shuffled, Standard::ALL.to_vec());
    }

    #[test]
    fn test_stroller_not_covered() {
        for std in Standard::ALL {
            assert!(!std.supports_product(ProductType::Stroller));
            assert!(std.supports_product(ProductType::ChildRestraintSystem));
        }
        assert!(ProductType::Stroller.envelope_cm().is_none());
    }

    #[test]
    fn test_edition() {
        let edition = Standard::Gb27887.edition();
        assert_eq!(edition.code, "GB 27887-2024");
        assert_eq!(edition.region, "CN");
        assert_eq!(edition.effective_date, "2024-05-28");
    }

    #[test]
    fn test_pulses() {
        let frontal = Standard::Fmvss213.pulse(ImpactType::Frontal).unwrap();
        assert_eq!(frontal.velocity_kmh, 48.0);
        assert!(Standard::Fmvss213.pulse(ImpactType::Lateral).is_none());
        assert_eq!(Standard::Gb27887.pulse(ImpactType::Rear), Standard::UnR129.pulse(ImpactType::Rear));
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&Standard::Gb27887).unwrap();
        assert_eq!(json, "\"GB 27887-2024\"");
        let product: ProductType = serde_json::from_str("\"INFANT_CARRIER\"").unwrap();
        assert_eq!(product, ProductType::InfantCarrier);
    }
}
