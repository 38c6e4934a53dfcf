//! # Installation Method
//!
//! How the restraint is attached to the vehicle: the attachment mechanism,
//! the requested facing direction, and the anti-rotation device.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "mechanism": "ISOFIX_3PT",
//!   "requested_orientation": "REARWARD",
//!   "anti_rotation": "SUPPORT_LEG"
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{PlanError, PlanResult};

/// Vehicle attachment mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mechanism {
    /// Two ISOFIX anchors plus an anti-rotation third point
    #[serde(rename = "ISOFIX_3PT")]
    Isofix3Pt,
    /// Two ISOFIX anchors, no third point
    #[serde(rename = "ISOFIX_2PT")]
    Isofix2Pt,
    /// Vehicle adult belt routed through the restraint
    VehicleBelt,
}

impl Mechanism {
    /// Segment used in installation geometry codes
    pub fn code(&self) -> &'static str {
        match self {
            Mechanism::Isofix3Pt => "ISOFIX-3P",
            Mechanism::Isofix2Pt => "ISOFIX-2P",
            Mechanism::VehicleBelt => "BELT",
        }
    }

    /// Get display name (e.g., "Isofix 3 pts")
    pub fn display_name(&self) -> &'static str {
        match self {
            Mechanism::Isofix3Pt => "Isofix 3 pts",
            Mechanism::Isofix2Pt => "Isofix 2 pts",
            Mechanism::VehicleBelt => "Vehicle belt",
        }
    }
}

/// Effective installation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    Rearward,
    Forward,
}

impl Orientation {
    /// Segment used in installation geometry codes
    pub fn code(&self) -> &'static str {
        match self {
            Orientation::Rearward => "RF",
            Orientation::Forward => "FF",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Rearward => "Rearward facing",
            Orientation::Forward => "Forward facing",
        })
    }
}

/// Direction asked for by the engineer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestedOrientation {
    Rearward,
    Forward,
    #[default]
    Unspecified,
}

impl RequestedOrientation {
    /// The explicit orientation, if one was requested
    pub fn explicit(&self) -> Option<Orientation> {
        match self {
            RequestedOrientation::Rearward => Some(Orientation::Rearward),
            RequestedOrientation::Forward => Some(Orientation::Forward),
            RequestedOrientation::Unspecified => None,
        }
    }
}

/// Anti-rotation device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AntiRotation {
    SupportLeg,
    TopTether,
    #[default]
    None,
}

impl AntiRotation {
    /// Segment used in installation geometry codes
    pub fn code(&self) -> &'static str {
        match self {
            AntiRotation::SupportLeg => "SL",
            AntiRotation::TopTether => "TT",
            AntiRotation::None => "-",
        }
    }

    pub fn is_fitted(&self) -> bool {
        !matches!(self, AntiRotation::None)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AntiRotation::SupportLeg => "Support leg",
            AntiRotation::TopTether => "Top tether",
            AntiRotation::None => "None",
        }
    }
}

/// Installation method requested for the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstallMethod {
    pub mechanism: Mechanism,
    #[serde(default)]
    pub requested_orientation: RequestedOrientation,
    #[serde(default)]
    pub anti_rotation: AntiRotation,
}

impl InstallMethod {
    pub fn new(mechanism: Mechanism, requested_orientation: RequestedOrientation, anti_rotation: AntiRotation) -> Self {
        InstallMethod {
            mechanism,
            requested_orientation,
            anti_rotation,
        }
    }

    /// Check that the anti-rotation device is one the mechanism can carry.
    ///
    /// A three-point ISOFIX installation needs its third point; a two-point
    /// installation by definition has none. Belt installations accept any
    /// device.
    pub fn check_compatibility(&self) -> PlanResult<()> {
        match (self.mechanism, self.anti_rotation) {
            (Mechanism::Isofix3Pt, AntiRotation::None) => Err(PlanError::structural(
                "install_method.anti_rotation",
                "NONE",
                format!("{} installation requires a support leg or top tether", self.mechanism.display_name()),
            )),
            (Mechanism::Isofix2Pt, device @ (AntiRotation::SupportLeg | AntiRotation::TopTether)) => {
                Err(PlanError::structural(
                    "install_method.anti_rotation",
                    device.display_name(),
                    format!(
                        "{} installation cannot carry an anti-rotation device; use ISOFIX_3PT",
                        self.mechanism.display_name()
                    ),
                ))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isofix_3pt_needs_third_point() {
        let method = InstallMethod::new(Mechanism::Isofix3Pt, RequestedOrientation::Rearward, AntiRotation::None);
        let err = method.check_compatibility().unwrap_err();
        assert!(err.to_string().contains("Isofix 3 pts installation requires"));

        let method = InstallMethod::new(Mechanism::Isofix3Pt, RequestedOrientation::Rearward, AntiRotation::SupportLeg);
        assert!(method.check_compatibility().is_ok());
    }

    #[test]
    fn test_isofix_2pt_rejects_device() {
        let method = InstallMethod::new(Mechanism::Isofix2Pt, RequestedOrientation::Forward, AntiRotation::TopTether);
        let err = method.check_compatibility().unwrap_err();
        assert_eq!(err.error_code(), "STRUCTURAL");
    }

    #[test]
    fn test_belt_accepts_anything() {
        for device in [AntiRotation::None, AntiRotation::SupportLeg, AntiRotation::TopTether] {
            let method = InstallMethod::new(Mechanism::VehicleBelt, RequestedOrientation::Unspecified, device);
            assert!(method.check_compatibility().is_ok());
        }
    }

    #[test]
    fn test_json_defaults() {
        let method: InstallMethod = serde_json::from_str(r#"{"mechanism":"VEHICLE_BELT"}"#).unwrap();
        assert_eq!(method.requested_orientation, RequestedOrientation::Unspecified);
        assert_eq!(method.anti_rotation, AntiRotation::None);

        let method: InstallMethod = serde_json::from_str(
            r#"{"mechanism":"ISOFIX_3PT","requested_orientation":"FORWARD","anti_rotation":"TOP_TETHER"}"#,
        )
        .unwrap();
        assert_eq!(method.mechanism, Mechanism::Isofix3Pt);
        assert_eq!(method.requested_orientation.explicit(), Some(Orientation::Forward));
    }
}
