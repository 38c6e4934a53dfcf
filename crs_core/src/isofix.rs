//! # ISOFIX Envelope
//!
//! Rigid-attachment dimensions an ISOFIX restraint must fit, per installation
//! direction (UN R129 Annex 17). The fixture class selects the test fixture
//! used on the sled; the remaining constraints bound the product geometry.
//!
//! | Direction | Fixture  | Anchor spacing | Third point                   |
//! |-----------|----------|----------------|-------------------------------|
//! | Rearward  | ISO/R2   | 280 ±10 mm     | support leg 285-540 mm        |
//! | Forward   | ISO/F2X  | 280 ±10 mm     | top-tether anchor 500-700 mm  |
//!
//! Both directions share fore/aft travel, lateral travel and an 8 kN static
//! strength requirement.
//!
//! ## Example
//!
//! ```rust
//! use crs_core::install::{Mechanism, Orientation};
//! use crs_core::isofix::{FixtureClass, IsofixEnvelope};
//!
//! let envelope = IsofixEnvelope::for_install(Mechanism::Isofix3Pt, Orientation::Forward).unwrap();
//! assert_eq!(envelope.fixture, FixtureClass::IsoF2x);
//! assert!(envelope.support_leg_length.is_none());
//!
//! assert!(IsofixEnvelope::for_install(Mechanism::VehicleBelt, Orientation::Forward).is_none());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::install::{Mechanism, Orientation};
use crate::units::Millimeters;

/// Sled fixture an ISOFIX restraint is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixtureClass {
    #[serde(rename = "ISO/R2")]
    IsoR2,
    #[serde(rename = "ISO/F2X")]
    IsoF2x,
}

impl FixtureClass {
    pub fn code(&self) -> &'static str {
        match self {
            FixtureClass::IsoR2 => "ISO/R2",
            FixtureClass::IsoF2x => "ISO/F2X",
        }
    }

    /// Fixture for an installation direction
    pub fn for_orientation(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Rearward => FixtureClass::IsoR2,
            Orientation::Forward => FixtureClass::IsoF2x,
        }
    }
}

impl fmt::Display for FixtureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A bounded dimension with the clause that sets it. `max` is open when `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRange {
    pub min: Millimeters,
    pub max: Option<Millimeters>,
    pub clause: String,
}

impl DimensionRange {
    fn new(min_mm: f64, max_mm: Option<f64>, clause: &str) -> Self {
        DimensionRange {
            min: Millimeters(min_mm),
            max: max_mm.map(Millimeters),
            clause: clause.to_string(),
        }
    }
}

/// ISOFIX geometry and strength requirements for one installation direction.
///
/// ## JSON Example
///
/// ```json
/// {
///   "orientation": "REARWARD",
///   "fixture": "ISO/R2",
///   "anchor_spacing": { "min": 270.0, "max": 290.0, "clause": "UN R129 Annex 17 §4.1" },
///   "fore_aft_travel": { "min": 79.0, "max": 81.0, "clause": "UN R129 Annex 17 §4.2" },
///   "lateral_travel": { "min": 200.0, "max": null, "clause": "UN R129 Annex 17 §4.3" },
///   "support_leg_length": { "min": 285.0, "max": 540.0, "clause": "UN R129 §6.1.2.4" },
///   "top_tether_anchor": null,
///   "static_strength_kn": 8.0,
///   "static_strength_clause": "UN R129 Annex 17 §5"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsofixEnvelope {
    pub orientation: Orientation,
    pub fixture: FixtureClass,
    pub anchor_spacing: DimensionRange,
    pub fore_aft_travel: DimensionRange,
    /// Per side
    pub lateral_travel: DimensionRange,
    /// Rearward only
    pub support_leg_length: Option<DimensionRange>,
    /// Distance behind the seat; forward only
    pub top_tether_anchor: Option<DimensionRange>,
    pub static_strength_kn: f64,
    pub static_strength_clause: String,
}

impl IsofixEnvelope {
    /// Envelope for an installation, or `None` for belt installations.
    pub fn for_install(mechanism: Mechanism, orientation: Orientation) -> Option<Self> {
        match mechanism {
            Mechanism::Isofix3Pt | Mechanism::Isofix2Pt => Some(IsofixEnvelope::for_orientation(orientation)),
            Mechanism::VehicleBelt => None,
        }
    }

    /// Envelope for an installation direction.
    pub fn for_orientation(orientation: Orientation) -> Self {
        let (support_leg_length, top_tether_anchor) = match orientation {
            Orientation::Rearward => (Some(DimensionRange::new(285.0, Some(540.0), "UN R129 §6.1.2.4")), None),
            Orientation::Forward => (None, Some(DimensionRange::new(500.0, Some(700.0), "UN R129 §6.1.2.3"))),
        };

        IsofixEnvelope {
            orientation,
            fixture: FixtureClass::for_orientation(orientation),
            anchor_spacing: DimensionRange::new(270.0, Some(290.0), "UN R129 Annex 17 §4.1"),
            fore_aft_travel: DimensionRange::new(79.0, Some(81.0), "UN R129 Annex 17 §4.2"),
            lateral_travel: DimensionRange::new(200.0, None, "UN R129 Annex 17 §4.3"),
            support_leg_length,
            top_tether_anchor,
            static_strength_kn: 8.0,
            static_strength_clause: "UN R129 Annex 17 §5".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rearward_envelope() {
        let envelope = IsofixEnvelope::for_orientation(Orientation::Rearward);
        assert_eq!(envelope.fixture, FixtureClass::IsoR2);
        let leg = envelope.support_leg_length.as_ref().unwrap();
        assert_eq!((leg.min, leg.max), (Millimeters(285.0), Some(Millimeters(540.0))));
        assert!(envelope.top_tether_anchor.is_none());
        assert_eq!(envelope.static_strength_kn, 8.0);
    }

    #[test]
    fn test_forward_envelope() {
        let envelope = IsofixEnvelope::for_orientation(Orientation::Forward);
        assert_eq!(envelope.fixture.to_string(), "ISO/F2X");
        assert_eq!(envelope.top_tether_anchor.unwrap().clause, "UN R129 §6.1.2.3");
    }

    #[test]
    fn test_belt_has_no_envelope() {
        assert!(IsofixEnvelope::for_install(Mechanism::VehicleBelt, Orientation::Rearward).is_none());
        assert!(IsofixEnvelope::for_install(Mechanism::Isofix2Pt, Orientation::Rearward).is_some());
    }

    #[test]
    fn test_shared_dimensions() {
        let rear = IsofixEnvelope::for_orientation(Orientation::Rearward);
        let fwd = IsofixEnvelope::for_orientation(Orientation::Forward);
        assert_eq!(rear.anchor_spacing, fwd.anchor_spacing);
        assert_eq!(rear.lateral_travel.max, None);

        let json = serde_json::to_value(&rear).unwrap();
        assert_eq!(json["fixture"], "ISO/R2");
        assert_eq!(json["anchor_spacing"]["min"], 270.0);
    }
}
