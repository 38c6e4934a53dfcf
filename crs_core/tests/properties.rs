//! Property tests for band resolution, rule evaluation and matrix laws.

use std::collections::BTreeMap;

use crs_core::prelude::*;
use crs_core::rules::REARWARD_MANDATE_CM;
use proptest::prelude::*;
use semver::Version;

fn arb_standards() -> impl Strategy<Value = Vec<Standard>> {
    prop::sample::subsequence(Standard::ALL.to_vec(), 1..=3)
}

fn arb_standard() -> impl Strategy<Value = Standard> {
    prop::sample::select(Standard::ALL.to_vec())
}

fn arb_range() -> impl Strategy<Value = SizeRange> {
    (0.0f64..180.0, 0.5f64..120.0).prop_map(|(min, span)| SizeRange::new(min, min + span))
}

fn arb_orientation() -> impl Strategy<Value = RequestedOrientation> {
    prop_oneof![
        Just(RequestedOrientation::Rearward),
        Just(RequestedOrientation::Forward),
        Just(RequestedOrientation::Unspecified),
    ]
}

fn arb_device() -> impl Strategy<Value = AntiRotation> {
    prop_oneof![
        Just(AntiRotation::SupportLeg),
        Just(AntiRotation::TopTether),
        Just(AntiRotation::None),
    ]
}

fn arb_mechanism() -> impl Strategy<Value = Mechanism> {
    prop_oneof![
        Just(Mechanism::Isofix3Pt),
        Just(Mechanism::Isofix2Pt),
        Just(Mechanism::VehicleBelt),
    ]
}

fn arb_method() -> impl Strategy<Value = InstallMethod> {
    (arb_mechanism(), arb_orientation(), arb_device()).prop_map(|(m, o, d)| InstallMethod::new(m, o, d))
}

fn arb_request() -> impl Strategy<Value = EngineeringRequest> {
    (arb_standards(), arb_range(), arb_method()).prop_map(|(standards, range, method)| {
        EngineeringRequest::new(ProductType::ChildRestraintSystem, standards, range, method)
    })
}

fn arb_band() -> impl Strategy<Value = (Standard, DummyBand)> {
    arb_standard().prop_flat_map(|standard| {
        let bands = DummyRegistry::builtin().bands(standard).unwrap_or_default().to_vec();
        prop::sample::select(bands).prop_map(move |band| (standard, band))
    })
}

/// Sorted, gap-free band table. Each band starts somewhere inside the
/// previous one (or at its end), so neighbours may overlap.
fn arb_table() -> impl Strategy<Value = Vec<DummyBand>> {
    (
        0.0f64..60.0,
        prop::collection::vec((0.05f64..=1.0, 1.0f64..40.0), 1..8),
    )
        .prop_map(|(start, steps)| {
            let mut bands: Vec<DummyBand> = Vec::with_capacity(steps.len());
            for (i, (advance, width)) in steps.into_iter().enumerate() {
                let min = match bands.last() {
                    Some(prev) => prev.min_size_cm + advance * (prev.max_size_cm - prev.min_size_cm),
                    None => start,
                };
                let mass = 1.0 + i as f64;
                bands.push(DummyBand::new(format!("B{i}"), min, min + width, mass, Orientation::Rearward, "test table"));
            }
            bands
        })
}

proptest! {
    // =================================================================
    // Height-band resolution
    // =================================================================

    #[test]
    fn resolved_bands_strictly_overlap(standard in arb_standard(), range in arb_range()) {
        let bands = resolve_bands(DummyRegistry::builtin(), standard, &range).unwrap();
        for band in &bands {
            prop_assert!(band.min_size_cm < range.max_cm && band.max_size_cm > range.min_cm);
        }
        for pair in bands.windows(2) {
            prop_assert!(pair[0].min_size_cm <= pair[1].min_size_cm);
        }
    }

    #[test]
    fn no_overlapping_band_is_missed(standard in arb_standard(), range in arb_range()) {
        let bands = resolve_bands(DummyRegistry::builtin(), standard, &range).unwrap();
        let table = DummyRegistry::builtin().bands(standard).unwrap_or_default();
        let expected = table
            .iter()
            .filter(|b| b.min_size_cm < range.max_cm && b.max_size_cm > range.min_cm)
            .count();
        prop_assert_eq!(bands.len(), expected);
    }

    #[test]
    fn random_tables_resolve_exactly_the_intersecting_bands(table in arb_table(), range in arb_range()) {
        let registry = DummyRegistry::new(Version::new(1, 0, 0), BTreeMap::from([(Standard::UnR129, table.clone())]))
            .unwrap();
        let resolved = resolve_bands(&registry, Standard::UnR129, &range).unwrap();
        let codes: Vec<&str> = resolved.iter().map(|b| b.code.as_str()).collect();

        // Half-open intersection, counted by hand
        let expected: Vec<&str> = table
            .iter()
            .filter(|b| b.min_size_cm < range.max_cm && b.max_size_cm > range.min_cm)
            .map(|b| b.code.as_str())
            .collect();
        prop_assert_eq!(codes, expected);
    }

    #[test]
    fn touching_intervals_do_not_overlap(lo in 0.0f64..150.0, width in 0.5f64..50.0, gap in 0.0f64..20.0) {
        let band = DummyBand::new("X", lo, lo + width, 1.0, Orientation::Rearward, "test table");
        let after = lo + width + gap;
        prop_assert!(!band.overlaps(after, after + 10.0));
        prop_assert!(!band.overlaps(lo - 10.0, lo));
        prop_assert!(band.overlaps(lo, lo + width));
    }

    // =================================================================
    // Rule evaluation
    // =================================================================

    #[test]
    fn low_bands_always_face_rearward((standard, band) in arb_band(), method in arb_method()) {
        prop_assume!(band.max_size_cm <= REARWARD_MANDATE_CM);
        let eval = RuleBook::builtin().evaluate(standard, &band, &method).unwrap();
        prop_assert_eq!(eval.orientation, Orientation::Rearward);
        let forward_asked = method.requested_orientation == RequestedOrientation::Forward;
        prop_assert_eq!(!eval.is_compliant(), forward_asked);
    }

    #[test]
    fn forward_high_bands_need_top_tether((standard, band) in arb_band(), method in arb_method()) {
        prop_assume!(band.min_size_cm >= REARWARD_MANDATE_CM);
        let eval = RuleBook::builtin().evaluate(standard, &band, &method).unwrap();
        if eval.orientation == Orientation::Forward && method.anti_rotation != AntiRotation::TopTether {
            prop_assert_eq!(eval.violations.len(), 1);
        } else {
            prop_assert!(eval.is_compliant());
        }
    }

    // =================================================================
    // Validation and matrix laws
    // =================================================================

    #[test]
    fn row_count_law(request in arb_request()) {
        let outcome = Validator::builtin().validate(&request).unwrap();
        prop_assert_eq!(outcome.valid, outcome.errors.is_empty());
        if outcome.valid {
            let rows = MatrixGenerator::builtin().generate(&outcome).unwrap();
            let expected: usize = outcome.resolutions.iter().map(|r| r.bands.len()).sum();
            prop_assert_eq!(rows.len(), expected);
        }
    }

    #[test]
    fn validation_is_deterministic(request in arb_request()) {
        let first = serde_json::to_string(&Validator::builtin().validate(&request).unwrap()).unwrap();
        let second = serde_json::to_string(&Validator::builtin().validate(&request).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn generation_is_idempotent(request in arb_request()) {
        let outcome = Validator::builtin().validate(&request).unwrap();
        if outcome.valid {
            let first = serde_json::to_string(&MatrixGenerator::builtin().generate(&outcome).unwrap()).unwrap();
            let second = serde_json::to_string(&MatrixGenerator::builtin().generate(&outcome).unwrap()).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn structural_issue_stands_alone(request in arb_request()) {
        let outcome = Validator::builtin().validate(&request).unwrap();
        if outcome.errors.iter().any(|e| e.kind == IssueKind::Structural) {
            prop_assert_eq!(outcome.errors.len(), 1);
            prop_assert!(outcome.resolved_bands.is_empty());
        }
    }
}
