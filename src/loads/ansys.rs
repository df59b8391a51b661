//! ANSYS input deck export.
//!
//! One `.inp` file is written per load case. Each file selects the pilot
//! node component of every point and applies one `f,all,<component>,<value>`
//! command per non-zero component:
//!
//! ```text
//! /TITLE,Take_off_004
//! nsel,u,,,all
//!
//! cmsel,s,pilot_Point_A
//! f,all,fx,2.567e-04
//! nsel,u,,,all
//!
//! alls
//! ```
//!
//! Output is byte-for-byte deterministic for a given LoadSet and name stem.
//! Export is not atomic: an I/O failure partway leaves the files written so
//! far on disk.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{LoadError, LoadResult};
use super::force_moment::Component;
use super::load_case::LoadCase;
use super::loadset::LoadSet;

/// Default digits after the decimal point.
pub const DEFAULT_PRECISION: usize = 3;

/// Largest accepted precision.
pub const MAX_PRECISION: usize = 15;

/// Export settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportOptions {
    /// Digits after the decimal point in exponential notation.
    #[serde(default = "default_precision")]
    pub precision: usize,

    /// Remove stale `{name_stem}_*.inp` files before writing.
    #[serde(default = "default_clean_existing")]
    pub clean_existing: bool,
}

const fn default_precision() -> usize {
    DEFAULT_PRECISION
}

const fn default_clean_existing() -> bool {
    true
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            clean_existing: true,
        }
    }
}

/// Files produced by one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Target folder.
    pub folder: PathBuf,
    /// Files written, in load case order.
    pub files: Vec<PathBuf>,
    /// Stale files removed before writing.
    pub removed: usize,
}

/// Writes LoadSets as ANSYS input decks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsysExporter {
    options: ExportOptions,
}

impl AnsysExporter {
    /// Creates an exporter. Precision is capped at [`MAX_PRECISION`].
    #[must_use]
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options: ExportOptions {
                precision: options.precision.min(MAX_PRECISION),
                ..options
            },
        }
    }

    /// The active options.
    #[must_use]
    pub const fn options(&self) -> ExportOptions {
        self.options
    }

    /// Writes one deck per load case into `folder`, creating it if needed.
    ///
    /// File names are checked for collisions before anything is touched.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedInput`] if the stem is empty, two cases
    /// map to the same file name or two points of a case map to the same
    /// pilot component, and [`LoadError::ExportIoFailure`] if the folder or a
    /// file cannot be written.
    pub fn export(
        &self,
        loadset: &LoadSet,
        folder: &Path,
        name_stem: &str,
    ) -> LoadResult<ExportSummary> {
        let stem = sanitize_filename(name_stem);
        if stem.is_empty() {
            return Err(LoadError::malformed(format!(
                "name stem '{name_stem}' has no characters usable in a file name"
            )));
        }
        let targets = plan_files(loadset, folder, &stem)?;

        std::fs::create_dir_all(folder).map_err(|e| LoadError::export_io(folder, e))?;

        let removed = if self.options.clean_existing {
            remove_stale(folder, &stem)?
        } else {
            0
        };

        let mut files = Vec::with_capacity(targets.len());
        for (case, path) in loadset.load_cases.iter().zip(targets) {
            std::fs::write(&path, self.render_case(case))
                .map_err(|e| LoadError::export_io(&path, e))?;
            tracing::debug!(path = %path.display(), load_case = %case.name, "Wrote ANSYS deck");
            files.push(path);
        }

        tracing::info!(
            folder = %folder.display(),
            files = files.len(),
            removed,
            units = %loadset.units,
            "Exported LoadSet to ANSYS"
        );

        Ok(ExportSummary {
            folder: folder.to_path_buf(),
            files,
            removed,
        })
    }

    /// Renders the deck of a single load case.
    #[must_use]
    pub fn render_case(&self, case: &LoadCase) -> String {
        let mut deck = String::new();
        let _ = writeln!(deck, "/TITLE,{}", case.name);
        deck.push_str("nsel,u,,,all\n\n");

        for point in &case.point_loads {
            let pilot = sanitize_filename(&point.name);
            for (component, value) in point.force_moment.components() {
                if value == 0.0 {
                    continue;
                }
                let _ = writeln!(deck, "cmsel,s,pilot_{pilot}");
                let _ = writeln!(
                    deck,
                    "f,all,{component},{}",
                    format_real(value, self.options.precision)
                );
                deck.push_str("nsel,u,,,all\n\n");
            }
        }

        deck.push_str("\nalls\n");
        deck
    }
}

fn plan_files(loadset: &LoadSet, folder: &Path, stem: &str) -> LoadResult<Vec<PathBuf>> {
    let mut owners: HashMap<String, &str> = HashMap::new();
    let mut targets = Vec::with_capacity(loadset.load_cases.len());
    for case in &loadset.load_cases {
        let suffix = sanitize_filename(&case.name);
        if suffix.is_empty() {
            return Err(LoadError::malformed(format!(
                "load case '{}' has no characters usable in a file name",
                case.name
            )));
        }
        let file_name = format!("{stem}_{suffix}.inp");
        if let Some(previous) = owners.insert(file_name.clone(), &case.name) {
            return Err(LoadError::malformed(format!(
                "load cases '{previous}' and '{}' both export to {file_name}",
                case.name
            )));
        }
        check_pilots(case)?;
        targets.push(folder.join(file_name));
    }
    Ok(targets)
}

fn check_pilots(case: &LoadCase) -> LoadResult<()> {
    let mut owners: HashMap<String, &str> = HashMap::new();
    for point in &case.point_loads {
        let pilot = sanitize_filename(&point.name);
        if pilot.is_empty() {
            return Err(LoadError::malformed(format!(
                "point '{}' of load case '{}' has no characters usable in a component name",
                point.name, case.name
            )));
        }
        if let Some(previous) = owners.insert(format!("pilot_{pilot}"), &point.name) {
            return Err(LoadError::malformed(format!(
                "points '{previous}' and '{}' of load case '{}' both select pilot_{pilot}",
                point.name, case.name
            )));
        }
    }
    Ok(())
}

fn remove_stale(folder: &Path, stem: &str) -> LoadResult<usize> {
    let pattern = format!(
        "{}/{}_*.inp",
        glob::Pattern::escape(&folder.to_string_lossy()),
        glob::Pattern::escape(stem)
    );
    let paths = glob::glob(&pattern)
        .map_err(|e| LoadError::malformed(format!("invalid export pattern: {e}")))?;

    let mut removed = 0;
    for path in paths.flatten().filter(|p| p.is_file()) {
        std::fs::remove_file(&path).map_err(|e| LoadError::export_io(&path, e))?;
        tracing::debug!(path = %path.display(), "Removed stale ANSYS deck");
        removed += 1;
    }
    Ok(removed)
}

/// Maps a name to a safe file name or ANSYS component suffix.
///
/// Characters outside `[A-Za-z0-9_-]` become `_`, runs of `_` collapse, and
/// leading/trailing `_` are trimmed: `"Point A"` becomes `"Point_A"`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('_').to_string()
}

/// Formats a value in exponential notation with a signed two-digit exponent,
/// e.g. `1500.0` at precision 3 becomes `1.500e+03`.
#[must_use]
pub fn format_real(value: f64, precision: usize) -> String {
    let raw = format!("{value:.precision$e}");
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

/// One force command read back from a deck.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckLoad {
    /// Point name as it appears in the pilot component (sanitised).
    pub point: String,
    /// Component.
    pub component: Component,
    /// Value as written.
    pub value: f64,
}

/// A parsed ANSYS deck, used to verify exports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnsysDeck {
    /// `/TITLE` text, if present.
    pub title: Option<String>,
    /// Force commands in file order.
    pub loads: Vec<DeckLoad>,
}

const DECK_LINE: &str = concat!(
    r"(?i)^\s*(?:/title,(?P<title>.*)",
    r"|cmsel,s,pilot_(?P<pilot>\S+)",
    r"|f,all,(?P<comp>fx|fy|fz|mx|my|mz),(?P<value>[+-]?\d*\.?\d+(?:e[+-]?\d+)?))\s*$",
);

impl AnsysDeck {
    /// Extracts the title and every `f,all` command.
    ///
    /// A force command is attributed to the most recent `cmsel,s,pilot_`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedInput`] if a force command precedes any
    /// pilot selection.
    pub fn parse(text: &str) -> LoadResult<Self> {
        let line_re = Regex::new(DECK_LINE)
            .map_err(|e| LoadError::malformed(format!("invalid deck pattern: {e}")))?;
        let mut deck = Self::default();
        let mut pilot: Option<String> = None;

        for (number, line) in text.lines().enumerate() {
            let Some(caps) = line_re.captures(line) else {
                continue;
            };
            if let Some(title) = caps.name("title") {
                deck.title = Some(title.as_str().trim().to_string());
            } else if let Some(name) = caps.name("pilot") {
                pilot = Some(name.as_str().to_string());
            } else if let (Some(comp), Some(value)) = (caps.name("comp"), caps.name("value")) {
                let Some(point) = pilot.clone() else {
                    return Err(LoadError::malformed(format!(
                        "line {}: force command without a pilot selection",
                        number + 1
                    )));
                };
                let value = value.as_str().parse::<f64>().map_err(|e| {
                    LoadError::malformed(format!("line {}: bad value: {e}", number + 1))
                })?;
                deck.loads.push(DeckLoad {
                    point,
                    component: comp.as_str().parse()?,
                    value,
                });
            }
        }
        Ok(deck)
    }

    /// Reads and parses a deck file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::FileNotFound`] or [`LoadError::FileRead`] if the
    /// file cannot be read, and [`LoadError::MalformedInput`] as for
    /// [`AnsysDeck::parse`].
    pub fn read(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::file_read(path, e))?;
        Self::parse(&text)
    }

    /// The value of one component at one point, if it was written.
    #[must_use]
    pub fn value(&self, point: &str, component: Component) -> Option<f64> {
        self.loads
            .iter()
            .find(|l| l.point == point && l.component == component)
            .map(|l| l.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::ForceMoment;

    #[test]
    fn format_real_uses_signed_two_digit_exponent() {
        assert_eq!(format_real(1500.0, 3), "1.500e+03");
        assert_eq!(format_real(0.000_256_7, 3), "2.567e-04");
        assert_eq!(format_real(-0.9856, 3), "-9.856e-01");
        assert_eq!(format_real(1.0, 1), "1.0e+00");
        assert_eq!(format_real(1.0e120, 2), "1.00e+120");
    }

    #[test]
    fn sanitize_examples() {
        assert_eq!(sanitize_filename("Point A"), "Point_A");
        assert_eq!(sanitize_filename("Take_off_004"), "Take_off_004");
        assert_eq!(sanitize_filename("  a//b  "), "a_b");
        assert_eq!(sanitize_filename("///"), "");
    }

    #[test]
    fn render_omits_zero_components() {
        let case = LoadCase::new("Take_off_004")
            .with_point("Point A", ForceMoment::new(2.567e-4, 0.0, 0.0, 0.9856, 0.0, 0.0));
        let deck = AnsysExporter::default().render_case(&case);
        assert_eq!(
            deck,
            "/TITLE,Take_off_004\nnsel,u,,,all\n\n\
             cmsel,s,pilot_Point_A\nf,all,fx,2.567e-04\nnsel,u,,,all\n\n\
             cmsel,s,pilot_Point_A\nf,all,mx,9.856e-01\nnsel,u,,,all\n\n\
             \nalls\n"
        );
    }

    #[test]
    fn parse_reads_back_rendered_deck() {
        let case = LoadCase::new("C")
            .with_point("Point A", ForceMoment::new(1.0, -2.0, 0.0, 0.0, 0.0, 3.5))
            .with_point("Point B", ForceMoment::new(0.0, 0.0, 7.25, 0.0, 0.0, 0.0));
        let deck = AnsysDeck::parse(&AnsysExporter::default().render_case(&case)).unwrap();
        assert_eq!(deck.title.as_deref(), Some("C"));
        assert_eq!(deck.loads.len(), 4);
        assert_eq!(deck.value("Point_A", Component::Fy), Some(-2.0));
        assert_eq!(deck.value("Point_B", Component::Fz), Some(7.25));
        assert_eq!(deck.value("Point_B", Component::Fx), None);
    }

    #[test]
    fn parse_is_case_insensitive_and_rejects_orphans() {
        let deck = AnsysDeck::parse("CMSEL,S,PILOT_X\nF,ALL,FX,1.5E+02\n").unwrap();
        assert_eq!(deck.value("X", Component::Fx), Some(150.0));
        assert!(AnsysDeck::parse("f,all,fx,1.0\n").is_err());
    }

    #[test]
    fn colliding_pilots_rejected() {
        let case = LoadCase::new("C")
            .with_point("Point A", ForceMoment::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0))
            .with_point("Point/A", ForceMoment::new(2.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        let err = check_pilots(&case).unwrap_err();
        assert!(err.to_string().contains("pilot_Point_A"));

        let case = LoadCase::new("C").with_point("??", ForceMoment::default());
        assert!(check_pilots(&case).is_err());
    }

    #[test]
    fn precision_is_capped() {
        let exporter = AnsysExporter::new(ExportOptions {
            precision: 40,
            clean_existing: false,
        });
        assert_eq!(exporter.options().precision, MAX_PRECISION);
    }
}
