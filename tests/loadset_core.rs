//! Integration tests for reading, converting and scaling LoadSets.
//!
//! These tests use the JSON fixtures under `tests/data/` and check the
//! numeric contracts of the transformation pipeline.

use std::path::PathBuf;

use loadset_engine::loads::units::convert;
use loadset_engine::loads::{
    Component, ForceMoment, ForceUnit, LoadCase, LoadError, LoadSet, MomentUnit, Units, Version,
};
use tempfile::TempDir;

/// Creates a temporary directory inside `.tmp/` for test isolation.
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
fn test_temp_dir() -> TempDir {
    let tmp_root = std::path::Path::new(".tmp");
    std::fs::create_dir_all(tmp_root).expect("Failed to create .tmp directory");
    let tmp_root = tmp_root
        .canonicalize()
        .expect("Failed to canonicalize .tmp path");
    tempfile::tempdir_in(&tmp_root).expect("Failed to create temp dir")
}

/// Helper to compare floats with a relative tolerance.
///
/// Magnitudes below 1 fall back to an absolute comparison.
fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0)
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn new_loads() -> LoadSet {
    LoadSet::read_json(fixture("new_loads.json")).expect("fixture should load")
}

fn all_values(loadset: &LoadSet) -> Vec<f64> {
    loadset
        .load_cases
        .iter()
        .flat_map(|c| &c.point_loads)
        .flat_map(|p| p.force_moment.components().map(|(_, v)| v).collect::<Vec<_>>())
        .collect()
}

// =============================================================================
// Reading
// =============================================================================

#[test]
fn test_read_current_schema() {
    let ls = new_loads();
    assert_eq!(ls.name, "Flight Loads Rev B");
    assert_eq!(ls.version, Version::Number(2));
    assert_eq!(ls.units, Units::new(ForceUnit::Newton, MomentUnit::NewtonMetre));
    assert_eq!(ls.load_cases.len(), 4);
    assert_eq!(ls.point_names(), ["Point A", "Point B"]);
    assert_eq!(ls.total_point_loads(), 8);

    let case = ls.case("Take_off_004").unwrap();
    assert_eq!(case.category.as_deref(), Some("takeoff"));
    let a = case.point("Point A").unwrap();
    assert!(approx_eq(a.force_moment.fz, -3.0, 1e-12));
    assert!(ls.metadata.as_ref().unwrap().contains_key("coordinate_system"));
}

#[test]
fn test_missing_file_is_file_not_found() {
    let err = LoadSet::read_json(fixture("does_not_exist.json")).unwrap_err();
    assert!(matches!(err, LoadError::FileNotFound { .. }));
}

#[test]
fn test_invalid_json_is_malformed() {
    let dir = test_temp_dir();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"name\": ").unwrap();
    let err = LoadSet::read_json(&path).unwrap_err();
    assert!(matches!(err, LoadError::MalformedInput { .. }));
}

#[test]
fn test_load_cases_not_a_list() {
    let json = r#"{
        "name": "Bad",
        "version": 1,
        "units": { "forces": "N", "moments": "Nm" },
        "load_cases": { "name": "oops" }
    }"#;
    let err = LoadSet::from_json_str(json).unwrap_err();
    assert!(matches!(err, LoadError::MalformedInput { .. }));
    assert!(err.to_string().contains("'load_cases' must be a list"));
}

#[test]
fn test_duplicate_point_rejected_on_load() {
    let json = r#"{
        "name": "Dup",
        "version": 1,
        "units": { "forces": "N", "moments": "Nm" },
        "load_cases": [
            { "name": "A", "point_loads": [
                { "name": "P", "force_moment": { "fx": 1.0 } },
                { "name": "P", "force_moment": { "fx": 2.0 } }
            ] }
        ]
    }"#;
    let err = LoadSet::from_json_str(json).unwrap_err();
    assert!(err.to_string().contains("duplicate point 'P'"));
}

#[test]
fn test_write_then_read_preserves_everything() {
    let dir = test_temp_dir();
    let path = dir.path().join("copy.json");
    let ls = new_loads();
    ls.write_json(&path).unwrap();
    let back = LoadSet::read_json(&path).unwrap();
    assert_eq!(back, ls);
}

// =============================================================================
// Unit conversion
// =============================================================================

#[test]
fn test_round_trip_conversion_within_tolerance() {
    let original = new_loads();
    let mut ls = original.clone();
    ls.convert_to(Units::new(ForceUnit::KiloPoundForce, MomentUnit::KiloPoundForceFoot));
    ls.convert_to(Units::new(ForceUnit::PoundForce, MomentUnit::NewtonMillimetre));
    ls.convert_to(original.units);
    for (a, b) in all_values(&ls).into_iter().zip(all_values(&original)) {
        assert!(approx_eq(a, b, 1e-9), "{a} != {b}");
    }
}

#[test]
fn test_convert_to_current_units_is_identity() {
    let mut ls = new_loads();
    ls.scale(0.3).unwrap();
    let before: Vec<u64> = all_values(&ls).iter().map(|v| v.to_bits()).collect();
    ls.convert_to(ls.units);
    let after: Vec<u64> = all_values(&ls).iter().map(|v| v.to_bits()).collect();
    assert_eq!(before, after);
}

#[test]
fn test_conversion_symmetry() {
    for (a, b) in [("N", "klbf"), ("kN", "lbf"), ("Nm", "lbf-ft"), ("kNm", "Nmm")] {
        let x = 123.456;
        let forward = convert(x, a, b).unwrap();
        let unit_back = convert(1.0, b, a).unwrap();
        assert!(approx_eq(forward, x / unit_back, 1e-9), "{a} -> {b}");
    }
}

#[test]
fn test_unrecognized_unit_fails_without_mutation() {
    let mut ls = new_loads();
    let before = ls.clone();
    let err = ls.convert_to_named("klbf", Some("furlong-stone")).unwrap_err();
    assert!(matches!(err, LoadError::UnrecognizedUnit { .. }));
    assert_eq!(ls, before);
}

// =============================================================================
// Scaling
// =============================================================================

#[test]
fn test_scaling_is_associative() {
    let ls = new_loads();
    let twice = ls.scaled(1.7).unwrap().scaled(-0.4).unwrap();
    let once = ls.scaled(1.7 * -0.4).unwrap();
    for (a, b) in all_values(&twice).into_iter().zip(all_values(&once)) {
        assert!(approx_eq(a, b, 1e-9));
    }
    assert_eq!(twice.units, ls.units);
}

#[test]
fn test_invalid_scale_factors() {
    let mut ls = new_loads();
    for factor in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = ls.scale(factor).unwrap_err();
        assert!(matches!(err, LoadError::InvalidScaleFactor { .. }));
    }
    assert_eq!(ls, new_loads());
}

#[test]
fn test_scale_overflow_rejected() {
    let mut ls = LoadSet::new(
        "Huge",
        Units::default(),
        vec![LoadCase::new("X").with_point(
            "P",
            ForceMoment::new(1e300, 0.0, 0.0, 0.0, 0.0, 0.0),
        )],
    );
    let before = ls.clone();
    let err = ls.scale(1e10).unwrap_err();
    assert!(matches!(err, LoadError::InvalidScaleFactor { .. }));
    assert_eq!(ls, before);
    assert!(all_values(&ls).iter().all(|v| v.is_finite()));
}

#[test]
fn test_scale_then_convert_to_klbf() {
    let mut ls = LoadSet::new(
        "Scenario",
        Units::default(),
        vec![LoadCase::new("X").with_point(
            "Point A",
            ForceMoment::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0),
        )],
    );
    ls.scale(1.5).unwrap();
    let units = ls.convert_to_named("klbf", None).unwrap();
    assert_eq!(units.moments, MomentUnit::PoundForceFoot);

    let fm = ls.case("X").unwrap().point("Point A").unwrap().force_moment;
    assert!(approx_eq(fm.get(Component::Fx), 1.0 * 1.5 / 4448.222, 1e-15));
    assert!(approx_eq(fm.get(Component::Mx), 1.0 * 1.5 / 1.355_818, 1e-12));
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn test_summary_and_categories() {
    let ls = new_loads();
    let summary = ls.summary();
    assert_eq!(summary.num_load_cases, 4);
    assert_eq!(summary.categories, ["takeoff", "cruise", "landing"]);
    assert_eq!(ls.cases_by_category("cruise").count(), 2);
}
