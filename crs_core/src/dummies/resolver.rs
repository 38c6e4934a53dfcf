//! Height-band resolver.
//!
//! Maps a requested stature range onto the dummy bands that intersect it.
//! Selection is strict interval overlap, not containment: a request that
//! only partially covers a band still pulls that band in, so the resulting
//! test plan covers every child the product claims to fit.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DummyBand, DummyRegistry};
use crate::errors::{PlanError, PlanResult};
use crate::standards::Standard;

/// Requested body-size range in cm.
///
/// ## JSON Example
///
/// ```json
/// { "min_cm": 40.0, "max_cm": 105.0 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min_cm: f64,
    pub max_cm: f64,
}

impl SizeRange {
    pub fn new(min_cm: f64, max_cm: f64) -> Self {
        SizeRange { min_cm, max_cm }
    }

    /// Check ordering and finiteness.
    pub fn check(&self) -> PlanResult<()> {
        if !self.min_cm.is_finite() || !self.max_cm.is_finite() {
            return Err(PlanError::structural(
                "size_range",
                self.to_string(),
                "Size bounds must be finite numbers",
            ));
        }
        if self.min_cm < 0.0 {
            return Err(PlanError::structural(
                "size_range.min_cm",
                self.min_cm.to_string(),
                "Size cannot be negative",
            ));
        }
        if self.min_cm >= self.max_cm {
            return Err(PlanError::structural(
                "size_range",
                self.to_string(),
                "Minimum size must be below maximum size",
            ));
        }
        Ok(())
    }

    /// Is the range fully inside `[lo, hi]`?
    pub fn within(&self, lo: f64, hi: f64) -> bool {
        self.min_cm >= lo && self.max_cm <= hi
    }
}

impl std::fmt::Display for SizeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}cm", self.min_cm, self.max_cm)
    }
}

/// Resolve the bands of `standard` that intersect `range`.
///
/// Bands come back ascending by `min_size_cm`, ties in registry order. A
/// range entirely outside the table yields an empty list; deciding that
/// this is a coverage gap is the validator's job.
///
/// # Errors
///
/// * `Structural` if the range is malformed
/// * `RegistryInvalid` if the registry has no table for the standard
pub fn resolve_bands(registry: &DummyRegistry, standard: Standard, range: &SizeRange) -> PlanResult<Vec<DummyBand>> {
    range.check()?;

    let table = registry.bands(standard).ok_or_else(|| {
        PlanError::registry_invalid("dummy bands", format!("no band table registered for {}", standard.code()))
    })?;

    let mut bands: Vec<DummyBand> = table
        .iter()
        .filter(|band| band.overlaps(range.min_cm, range.max_cm))
        .cloned()
        .collect();
    // Stable sort keeps registry order for equal lower bounds
    bands.sort_by(|a, b| a.min_size_cm.total_cmp(&b.min_size_cm));

    debug!(
        standard = standard.code(),
        range = %range,
        count = bands.len(),
        "Resolved dummy bands"
    );
    Ok(bands)
}
