//! # Dummy Registry
//!
//! Anthropomorphic test-dummy definitions and the height-band resolver.
//!
//! ## Bands
//!
//! Every standard owns an ordered table of [`DummyBand`]s. A band covers the
//! half-open stature interval `[min_size_cm, max_size_cm)`. Within a table
//! bands are sorted by `min_size_cm` and leave no gaps across the supported
//! range; neighbouring bands may overlap where the standard runs two
//! dummies over the same window (FMVSS 213 tests both the Hybrid III 3-year
//! and the Q3s between 90 and 105 cm). Overlap is permitted data, not an
//! error.
//!
//! ## Example
//!
//! ```rust
//! use crs_core::dummies::{resolve_bands, DummyRegistry, SizeRange};
//! use crs_core::standards::Standard;
//!
//! let registry = DummyRegistry::builtin();
//! let bands = resolve_bands(registry, Standard::UnR129, &SizeRange::new(40.0, 105.0)).unwrap();
//! let codes: Vec<&str> = bands.iter().map(|b| b.code.as_str()).collect();
//! assert_eq!(codes, ["Q0", "Q0+", "Q1", "Q1.5", "Q3"]);
//! ```

pub mod registry;
pub mod resolver;

pub use registry::DummyRegistry;
pub use resolver::{resolve_bands, SizeRange};

use serde::{Deserialize, Serialize};

use crate::install::Orientation;

/// A registered test-dummy definition tied to a stature interval.
///
/// ## JSON Example
///
/// ```json
/// {
///   "code": "Q1.5",
///   "min_size_cm": 75.0,
///   "max_size_cm": 87.0,
///   "mass_kg": 9.5,
///   "mandated_orientation": "REARWARD",
///   "source_clause": "UN R129 Annex 8",
///   "age_range": "2-3 years",
///   "product_group": "Group 1"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyBand {
    /// Dummy identifier (e.g., "Q0", "Q1.5", "HIII-6YR")
    pub code: String,

    /// Inclusive lower stature bound (cm)
    pub min_size_cm: f64,

    /// Exclusive upper stature bound (cm)
    pub max_size_cm: f64,

    /// Dummy mass (kg)
    pub mass_kg: f64,

    /// Orientation the standard mandates for this dummy
    pub mandated_orientation: Orientation,

    /// Clause the band is defined in
    pub source_clause: String,

    /// Approximate child age the dummy represents
    #[serde(default)]
    pub age_range: String,

    /// Product group label used on approval documents
    #[serde(default)]
    pub product_group: String,
}

impl DummyBand {
    /// Create a band with no age or product-group labels.
    pub fn new(
        code: impl Into<String>,
        min_size_cm: f64,
        max_size_cm: f64,
        mass_kg: f64,
        mandated_orientation: Orientation,
        source_clause: impl Into<String>,
    ) -> Self {
        DummyBand {
            code: code.into(),
            min_size_cm,
            max_size_cm,
            mass_kg,
            mandated_orientation,
            source_clause: source_clause.into(),
            age_range: String::new(),
            product_group: String::new(),
        }
    }

    /// Attach age and product-group labels (builder pattern)
    pub fn with_labels(mut self, age_range: impl Into<String>, product_group: impl Into<String>) -> Self {
        self.age_range = age_range.into();
        self.product_group = product_group.into();
        self
    }

    /// Strict interval overlap with `[min_cm, max_cm)`
    pub fn overlaps(&self, min_cm: f64, max_cm: f64) -> bool {
        self.min_size_cm < max_cm && self.max_size_cm > min_cm
    }

    /// Does a stature fall inside the band?
    pub fn contains(&self, size_cm: f64) -> bool {
        size_cm >= self.min_size_cm && size_cm < self.max_size_cm
    }

    /// Does the band reach both sides of `threshold_cm`?
    pub fn straddles(&self, threshold_cm: f64) -> bool {
        self.min_size_cm < threshold_cm && self.max_size_cm > threshold_cm
    }

    /// Human-readable stature range, e.g. "87-105cm"
    pub fn range_label(&self) -> String {
        format!("{}-{}cm", self.min_size_cm, self.max_size_cm)
    }

    /// Same dummy over the same interval, regardless of which table it came from.
    pub(crate) fn same_identity(&self, other: &DummyBand) -> bool {
        self.code == other.code
            && self.min_size_cm == other.min_size_cm
            && self.max_size_cm == other.max_size_cm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q3() -> DummyBand {
        DummyBand::new("Q3", 87.0, 105.0, 15.0, Orientation::Rearward, "UN R129 Annex 8")
    }

    #[test]
    fn test_half_open_bounds() {
        let band = q3();
        assert!(band.contains(87.0));
        assert!(band.contains(104.9));
        assert!(!band.contains(105.0));
    }

    #[test]
    fn test_strict_overlap() {
        let band = q3();
        assert!(band.overlaps(100.0, 110.0));
        assert!(band.overlaps(40.0, 88.0));
        // Touching at a boundary is not overlap
        assert!(!band.overlaps(105.0, 150.0));
        assert!(!band.overlaps(40.0, 87.0));
    }

    #[test]
    fn test_straddles() {
        let band = DummyBand::new("X", 100.0, 110.0, 18.0, Orientation::Rearward, "test");
        assert!(band.straddles(105.0));
        assert!(!q3().straddles(105.0));
    }

    #[test]
    fn test_labels_default_on_deserialize() {
        let json = r#"{
            "code": "Q6",
            "min_size_cm": 125.0,
            "max_size_cm": 145.0,
            "mass_kg": 23.0,
            "mandated_orientation": "FORWARD",
            "source_clause": "UN R129 Annex 8"
        }"#;
        let band: DummyBand = serde_json::from_str(json).unwrap();
        assert_eq!(band.mandated_orientation, Orientation::Forward);
        assert!(band.age_range.is_empty());
        assert_eq!(band.range_label(), "125-145cm");
    }
}
