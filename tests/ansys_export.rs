//! Integration tests for ANSYS deck export.
//!
//! Decks are written to temporary folders and read back with
//! [`AnsysDeck`] to check values, file naming and folder cleanup.

use std::path::{Path, PathBuf};

use loadset_engine::loads::{
    AnsysDeck, AnsysExporter, Component, ExportOptions, ForceMoment, LoadCase, LoadError, LoadSet,
    Units,
};
use tempfile::TempDir;

/// Creates a temporary directory inside `.tmp/` for test isolation.
fn test_temp_dir() -> TempDir {
    let tmp_root = std::path::Path::new(".tmp");
    std::fs::create_dir_all(tmp_root).expect("Failed to create .tmp directory");
    let tmp_root = tmp_root
        .canonicalize()
        .expect("Failed to canonicalize .tmp path");
    tempfile::tempdir_in(&tmp_root).expect("Failed to create temp dir")
}

/// Helper to compare floats with a relative tolerance.
fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0)
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn inp_files(folder: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(folder)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".inp"))
        .collect();
    names.sort();
    names
}

/// A LoadSet with `count` cases over two points, every value distinct.
fn many_cases(count: usize) -> LoadSet {
    let cases = (0..count)
        .map(|i| {
            let k = i as f64 + 1.0;
            LoadCase::new(format!("Case_{i:03}"))
                .with_point(
                    "Point A",
                    ForceMoment::new(k * 1.25, -k * 3.5, k * 1e4, k * 0.125, 7.0 / k, -k),
                )
                .with_point(
                    "Point B",
                    ForceMoment::new(-k * 2.0, 0.0, k * 1e-3, 11.0 * k, 0.0, k * 0.5),
                )
        })
        .collect();
    LoadSet::new("Many", Units::default(), cases)
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn test_one_file_per_load_case() {
    let dir = test_temp_dir();
    let ls = many_cases(25);
    let summary = ls.to_ansys(dir.path(), "run").unwrap();

    assert_eq!(summary.files.len(), 25);
    assert_eq!(summary.removed, 0);
    let names = inp_files(dir.path());
    assert_eq!(names.len(), 25);
    assert_eq!(names[0], "run_Case_000.inp");

    for file in &summary.files {
        let text = std::fs::read_to_string(file).unwrap();
        assert!(text.contains("f,all,"), "{} has no force command", file.display());
        assert!(text.starts_with("/TITLE,Case_"));
        assert!(text.ends_with("alls\n"));
    }
}

#[test]
fn test_export_creates_missing_folder() {
    let dir = test_temp_dir();
    let folder = dir.path().join("nested").join("decks");
    let ls = LoadSet::read_json(fixture("new_loads.json")).unwrap();
    let summary = ls.to_ansys(&folder, "flight").unwrap();
    assert_eq!(summary.folder, folder);
    assert_eq!(
        inp_files(&folder),
        [
            "flight_Cruise_001.inp",
            "flight_Cruise_002.inp",
            "flight_Landing_002.inp",
            "flight_Take_off_004.inp"
        ]
    );
}

#[test]
fn test_export_is_deterministic() {
    let first = test_temp_dir();
    let second = test_temp_dir();
    let ls = many_cases(5);
    ls.to_ansys(first.path(), "det").unwrap();
    ls.to_ansys(second.path(), "det").unwrap();

    for name in inp_files(first.path()) {
        let a = std::fs::read(first.path().join(&name)).unwrap();
        let b = std::fs::read(second.path().join(&name)).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }
}

#[test]
fn test_known_deck_layout() {
    let dir = test_temp_dir();
    let ls = LoadSet::new(
        "Layout",
        Units::default(),
        vec![LoadCase::new("Gust").with_point(
            "Point A",
            ForceMoment::new(1500.0, 0.0, -0.25, 0.0, 0.0, 0.0),
        )],
    );
    ls.to_ansys(dir.path(), "deck").unwrap();
    let text = std::fs::read_to_string(dir.path().join("deck_Gust.inp")).unwrap();
    assert_eq!(
        text,
        "/TITLE,Gust\n\
         nsel,u,,,all\n\
         \n\
         cmsel,s,pilot_Point_A\n\
         f,all,fx,1.500e+03\n\
         nsel,u,,,all\n\
         \n\
         cmsel,s,pilot_Point_A\n\
         f,all,fz,-2.500e-01\n\
         nsel,u,,,all\n\
         \n\
         \n\
         alls\n"
    );
}

// =============================================================================
// Values
// =============================================================================

#[test]
fn test_deck_values_read_back() {
    let dir = test_temp_dir();
    let ls = many_cases(3);
    let exporter = AnsysExporter::new(ExportOptions {
        precision: 9,
        ..ExportOptions::default()
    });
    let summary = exporter.export(&ls, dir.path(), "precise").unwrap();

    for (case, file) in ls.load_cases.iter().zip(&summary.files) {
        let deck = AnsysDeck::read(file).unwrap();
        assert_eq!(deck.title.as_deref(), Some(case.name.as_str()));
        for point in &case.point_loads {
            let pilot = point.name.replace(' ', "_");
            for (component, expected) in point.force_moment.components() {
                match deck.value(&pilot, component) {
                    Some(actual) => assert!(
                        approx_eq(actual, expected, 1e-9),
                        "{} {} {component}: {actual} != {expected}",
                        case.name,
                        point.name
                    ),
                    None => assert_eq!(expected, 0.0, "missing {component}"),
                }
            }
        }
    }
}

#[test]
fn test_default_precision_rounds() {
    let dir = test_temp_dir();
    let ls = LoadSet::new(
        "Rounding",
        Units::default(),
        vec![LoadCase::new("R").with_point(
            "P",
            ForceMoment::new(1.23456, 0.0, 0.0, 0.0, 0.0, 0.0),
        )],
    );
    let summary = ls.to_ansys(dir.path(), "r").unwrap();
    let deck = AnsysDeck::read(&summary.files[0]).unwrap();
    assert_eq!(deck.value("P", Component::Fx), Some(1.235));
}

// =============================================================================
// Cleanup and naming
// =============================================================================

#[test]
fn test_stale_files_removed() {
    let dir = test_temp_dir();
    std::fs::write(dir.path().join("run_Old_case.inp"), "stale").unwrap();
    std::fs::write(dir.path().join("other_Old_case.inp"), "keep").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

    let summary = many_cases(2).to_ansys(dir.path(), "run").unwrap();
    assert_eq!(summary.removed, 1);
    assert!(!dir.path().join("run_Old_case.inp").exists());
    assert!(dir.path().join("other_Old_case.inp").exists());
    assert!(dir.path().join("notes.txt").exists());
}

#[test]
fn test_stale_files_kept_when_cleanup_disabled() {
    let dir = test_temp_dir();
    std::fs::write(dir.path().join("run_Old_case.inp"), "stale").unwrap();

    let exporter = AnsysExporter::new(ExportOptions {
        clean_existing: false,
        ..ExportOptions::default()
    });
    let summary = exporter.export(&many_cases(2), dir.path(), "run").unwrap();
    assert_eq!(summary.removed, 0);
    assert!(dir.path().join("run_Old_case.inp").exists());
    assert_eq!(inp_files(dir.path()).len(), 3);
}

#[test]
fn test_colliding_names_fail_before_writing() {
    let dir = test_temp_dir();
    std::fs::write(dir.path().join("run_Old_case.inp"), "stale").unwrap();
    let ls = LoadSet::new(
        "Collide",
        Units::default(),
        vec![
            LoadCase::new("Case 1").with_point("P", ForceMoment::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0)),
            LoadCase::new("Case/1").with_point("P", ForceMoment::new(2.0, 0.0, 0.0, 0.0, 0.0, 0.0)),
        ],
    );
    let err = ls.to_ansys(dir.path(), "run").unwrap_err();
    assert!(matches!(err, LoadError::MalformedInput { .. }));
    assert!(err.to_string().contains("run_Case_1.inp"));
    assert_eq!(inp_files(dir.path()), ["run_Old_case.inp"]);
}

#[test]
fn test_unusable_stem_rejected() {
    let dir = test_temp_dir();
    let err = many_cases(1).to_ansys(dir.path(), "///").unwrap_err();
    assert!(matches!(err, LoadError::MalformedInput { .. }));
    assert!(inp_files(dir.path()).is_empty());
}

#[test]
fn test_colliding_pilots_fail_before_writing() {
    let dir = test_temp_dir();
    let ls = LoadSet::new(
        "Pilots",
        Units::default(),
        vec![LoadCase::new("Gust")
            .with_point("Point A", ForceMoment::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0))
            .with_point("Point/A", ForceMoment::new(2.0, 0.0, 0.0, 0.0, 0.0, 0.0))],
    );
    let err = ls.to_ansys(dir.path(), "run").unwrap_err();
    assert!(matches!(err, LoadError::MalformedInput { .. }));
    assert!(err.to_string().contains("pilot_Point_A"));
    assert!(inp_files(dir.path()).is_empty());
}
