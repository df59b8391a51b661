//! Integration tests for extremes and envelope reduction.

use std::path::PathBuf;

use loadset_engine::loads::{Component, LoadError, LoadSet};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn new_loads() -> LoadSet {
    LoadSet::read_json(fixture("new_loads.json")).expect("fixture should load")
}

// =============================================================================
// Extremes
// =============================================================================

#[test]
fn test_extremes_are_owned_by_their_cases() {
    let ls = new_loads();
    let extremes = ls.extremes().unwrap();
    assert_eq!(extremes.len(), 2);

    for (point, components) in extremes.iter() {
        for (&component, ext) in components {
            assert!(ext.max.value >= ext.min.value);
            for owner in [&ext.max, &ext.min] {
                let case = ls.case(&owner.loadcase).unwrap();
                let value = case.point(point).unwrap().force_moment.get(component);
                assert_eq!(value.to_bits(), owner.value.to_bits(), "{point} {component}");
            }
        }
    }
}

#[test]
fn test_known_extremes() {
    let extremes = new_loads().extremes().unwrap();

    let fx = extremes.get("Point A", Component::Fx).unwrap();
    assert_eq!(fx.max.loadcase, "Cruise_001");
    assert_eq!(fx.min.loadcase, "Landing_002");

    // Take_off_004 and Cruise_001 both have mz = 5.0; the earlier case wins.
    let mz = extremes.get("Point A", Component::Mz).unwrap();
    assert_eq!(mz.max.loadcase, "Take_off_004");

    let my = extremes.get("Point B", Component::My).unwrap();
    assert_eq!(my.max.loadcase, "Cruise_001");
    assert_eq!(my.min.loadcase, "Landing_002");
}

#[test]
fn test_extremes_json_shape() {
    let json = serde_json::to_value(new_loads().extremes().unwrap()).unwrap();
    assert_eq!(json["Point A"]["fx"]["max"]["value"], 4.0);
    assert_eq!(json["Point A"]["fx"]["max"]["loadcase"], "Cruise_001");
    assert_eq!(json["Point B"]["my"]["min"]["value"], -3.0);
}

#[test]
fn test_inconsistent_point_sets_fail() {
    let mut ls = new_loads();
    ls.load_cases[2].point_loads.pop();
    let err = ls.extremes().unwrap_err();
    assert!(matches!(err, LoadError::InconsistentPointSet { .. }));
    assert!(err.to_string().contains("Cruise_002"));
    assert!(ls.envelope().is_err());
}

// =============================================================================
// Envelope
// =============================================================================

#[test]
fn test_envelope_drops_dominated_cases() {
    let ls = new_loads();
    let envelope = ls.envelope().unwrap();
    let names: Vec<_> = envelope.load_cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Take_off_004", "Cruise_001", "Landing_002"]);
    assert_eq!(envelope.units, ls.units);
    assert_eq!(envelope.metadata, ls.metadata);
    assert_eq!(envelope.description, ls.description);
}

#[test]
fn test_envelope_preserves_extremes() {
    let ls = new_loads();
    let original = ls.extremes().unwrap();
    let reduced = ls.envelope().unwrap().extremes().unwrap();
    for (point, components) in original.iter() {
        for (&component, ext) in components {
            let after = reduced.get(point, component).unwrap();
            assert_eq!(after.max.value.to_bits(), ext.max.value.to_bits());
            if ext.min.value < 0.0 {
                assert_eq!(after.min.value.to_bits(), ext.min.value.to_bits());
            }
        }
    }
}

#[test]
fn test_envelope_is_idempotent() {
    let once = new_loads().envelope().unwrap();
    let twice = once.envelope().unwrap();
    assert_eq!(once, twice);
}
