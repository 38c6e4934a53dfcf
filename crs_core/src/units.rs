//! # Unit Types
//!
//! Type-safe wrappers for the units that appear in dummy definitions,
//! fixture envelopes and injury-criteria tables. Lightweight `f64` newtypes
//! that serialize as bare numbers.
//!
//! Body size is carried as plain centimetres throughout the engine, since
//! every supported standard defines its bands in stature. FMVSS 213 dummy
//! masses are published in pounds and converted when the table is built.
//!
//! ## Example
//!
//! ```rust
//! use crs_core::units::{Kilograms, PoundsMass};
//!
//! let crabi: Kilograms = PoundsMass(22.0).into();
//! assert!((crabi.value() - 9.979).abs() < 1e-3);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Quantities
// ============================================================================

/// Length in millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

/// Mass in pounds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoundsMass(pub f64);

impl From<PoundsMass> for Kilograms {
    fn from(lb: PoundsMass) -> Self {
        Kilograms(lb.0 * 0.453_592_37)
    }
}

macro_rules! impl_quantity {
    ($type:ty, $symbol:literal) => {
        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }
        }

        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", self.0, $symbol)
            }
        }
    };
}

impl_quantity!(Millimeters, "mm");
impl_quantity!(Kilograms, "kg");
impl_quantity!(PoundsMass, "lb");

// ============================================================================
// Injury-Criteria Units
// ============================================================================

/// Unit attached to an injury-criteria limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitUnit {
    /// Dimensionless head injury criterion (HIC15 / HIC36)
    #[serde(rename = "HIC")]
    Hic,
    /// Resultant acceleration in multiples of g (3 ms clip)
    #[serde(rename = "g")]
    G,
    /// Force in newtons
    #[serde(rename = "N")]
    Newtons,
    /// Displacement in millimetres
    #[serde(rename = "mm")]
    Millimeters,
}

impl LimitUnit {
    /// Symbol used in tables and reports
    pub fn symbol(&self) -> &'static str {
        match self {
            LimitUnit::Hic => "",
            LimitUnit::G => "g",
            LimitUnit::Newtons => "N",
            LimitUnit::Millimeters => "mm",
        }
    }
}

/// A numeric upper limit plus its unit, e.g. `≤ 60 g`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    pub value: f64,
    pub unit: LimitUnit,
}

impl Limit {
    pub const fn new(value: f64, unit: LimitUnit) -> Self {
        Limit { value, unit }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "≤{}{}", self.value, self.unit.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pounds_to_kilograms() {
        let kg: Kilograms = PoundsMass(40.0).into();
        assert!((kg.value() - 18.14).abs() < 0.01);
    }

    #[test]
    fn test_quantity_display() {
        assert_eq!(Millimeters(280.0).to_string(), "280mm");
        assert_eq!(Kilograms(9.5).to_string(), "9.5kg");
    }

    #[test]
    fn test_limit_display() {
        assert_eq!(Limit::new(55.0, LimitUnit::G).to_string(), "≤55g");
        assert_eq!(Limit::new(390.0, LimitUnit::Hic).to_string(), "≤390");
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&Millimeters(87.5)).unwrap();
        assert_eq!(json, "87.5");

        let limit = Limit::new(1800.0, LimitUnit::Newtons);
        let json = serde_json::to_string(&limit).unwrap();
        assert_eq!(json, r#"{"value":1800.0,"unit":"N"}"#);
    }
}
