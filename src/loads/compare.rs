//! Comparison of two LoadSets.
//!
//! Load cases and point loads are paired by exact name. Any name present in
//! one LoadSet but not the other makes the comparison fail. The previous
//! LoadSet is converted to the current LoadSet's units before differencing.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use super::error::{LoadError, LoadResult};
use super::force_moment::Component;
use super::load_case::{LoadCase, PointLoad};
use super::loadset::{LoadSet, Version};
use super::units::Units;

/// Relative difference in percent.
///
/// A change away from zero has no finite percentage and is reported as
/// `"infinite"` rather than NaN or 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PercentDiff {
    /// A finite percentage.
    Finite(f64),
    /// Previous value was zero and current value is not.
    Infinite,
}

impl PercentDiff {
    /// `|current - previous| / |previous| * 100`.
    #[must_use]
    pub fn between(current: f64, previous: f64) -> Self {
        let abs = (current - previous).abs();
        if previous == 0.0 {
            if abs == 0.0 {
                Self::Finite(0.0)
            } else {
                Self::Infinite
            }
        } else {
            Self::Finite(abs / previous.abs() * 100.0)
        }
    }

    /// Whether the percentage is infinite.
    #[must_use]
    pub const fn is_infinite(self) -> bool {
        matches!(self, Self::Infinite)
    }

    fn max(self, other: Self) -> Self {
        match (self, other) {
            (Self::Infinite, _) | (_, Self::Infinite) => Self::Infinite,
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a.max(b)),
        }
    }
}

impl Serialize for PercentDiff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Finite(v) => serializer.serialize_f64(*v),
            Self::Infinite => serializer.serialize_str("infinite"),
        }
    }
}

/// Difference of one component at one point in one load case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDiff {
    /// Value in the current LoadSet.
    pub current: f64,
    /// Value in the previous LoadSet, in the current units.
    pub previous: f64,
    /// `|current - previous|`.
    pub abs_diff: f64,
    /// Relative to the previous value.
    pub pct_diff: PercentDiff,
}

impl ComponentDiff {
    fn new(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            abs_diff: (current - previous).abs(),
            pct_diff: PercentDiff::between(current, previous),
        }
    }
}

/// Differences of all six components at one point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointDiff {
    /// Point name.
    pub point_name: String,
    /// One entry per component in canonical order.
    pub components: IndexMap<Component, ComponentDiff>,
}

/// Differences of one load case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseDiff {
    /// Load case name.
    pub load_case: String,
    /// Points in the current LoadSet's order.
    pub points: Vec<PointDiff>,
}

/// Which extreme a comparison row refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremeKind {
    /// Highest signed value.
    Max,
    /// Lowest signed value.
    Min,
}

/// Extreme of one point/component in both LoadSets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    /// Point name.
    pub point_name: String,
    /// Component.
    pub component: Component,
    /// Max or min.
    #[serde(rename = "type")]
    pub kind: ExtremeKind,
    /// Extreme in the current LoadSet.
    pub loadset1_value: f64,
    /// Extreme in the previous LoadSet.
    pub loadset2_value: f64,
    /// Case owning the current extreme.
    pub loadset1_loadcase: String,
    /// Case owning the previous extreme.
    pub loadset2_loadcase: String,
    /// `|loadset1_value - loadset2_value|`.
    pub abs_diff: f64,
    /// Relative to `loadset2_value`.
    pub pct_diff: PercentDiff,
}

/// Identity of one compared LoadSet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSetInfo {
    /// LoadSet name.
    pub name: String,
    /// Document version.
    pub version: Version,
    /// Units the LoadSet was in before comparison.
    pub units: Units,
    /// Number of load cases.
    pub num_load_cases: usize,
}

impl LoadSetInfo {
    fn of(loadset: &LoadSet) -> Self {
        Self {
            name: loadset.name.clone(),
            version: loadset.version.clone(),
            units: loadset.units,
            num_load_cases: loadset.load_cases.len(),
        }
    }
}

/// Both sides of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonMetadata {
    /// The current LoadSet.
    pub loadset1: LoadSetInfo,
    /// The previous LoadSet.
    pub loadset2: LoadSetInfo,
}

/// Headline numbers of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    /// Current LoadSet name.
    pub loadset1_name: String,
    /// Previous LoadSet name.
    pub loadset2_name: String,
    /// Units all differences are expressed in.
    pub units: Units,
    /// Paired load cases.
    pub compared_load_cases: usize,
    /// Points per load case.
    pub compared_points: usize,
    /// Extreme comparison rows.
    pub comparison_rows: usize,
    /// Rows whose current extreme is larger in magnitude than the previous one.
    pub exceeding_rows: usize,
    /// Largest absolute difference over all cases, points and components.
    pub max_abs_difference: f64,
    /// Largest percentage difference.
    pub max_difference_percent: PercentDiff,
}

/// Result of comparing a current LoadSet against a previous one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSetComparison {
    /// Both LoadSets as they were before unit alignment.
    pub metadata: ComparisonMetadata,
    /// Units of every value in this report.
    pub units: Units,
    /// Case-by-case differences in the current LoadSet's order.
    pub case_diffs: Vec<CaseDiff>,
    /// Per-point extreme comparison.
    pub comparison_rows: Vec<ComparisonRow>,
    /// Largest absolute case-by-case difference.
    pub max_abs_difference: f64,
    /// Largest case-by-case percentage difference.
    pub max_difference_percent: PercentDiff,
}

impl LoadSetComparison {
    /// Compares `current` against `previous`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::IncompatibleLoadSets`] if load case or point names
    /// differ, and [`LoadError::InconsistentPointSet`] if either LoadSet's cases
    /// do not share one point set.
    pub fn compute(current: &LoadSet, previous: &LoadSet) -> LoadResult<Self> {
        let aligned = previous.converted(current.units);
        let pairs = pair_by_name(current, &aligned)?;

        let mut case_diffs = Vec::with_capacity(pairs.len());
        let mut max_abs_difference = 0.0_f64;
        let mut max_difference_percent = PercentDiff::Finite(0.0);

        for (case, point_pairs) in pairs {
            let mut points = Vec::with_capacity(point_pairs.len());
            for (point, other) in point_pairs {
                let components: IndexMap<Component, ComponentDiff> = point
                    .force_moment
                    .components()
                    .map(|(c, v)| (c, ComponentDiff::new(v, other.force_moment.get(c))))
                    .collect();
                for diff in components.values() {
                    max_abs_difference = max_abs_difference.max(diff.abs_diff);
                    max_difference_percent = max_difference_percent.max(diff.pct_diff);
                }
                points.push(PointDiff {
                    point_name: point.name.clone(),
                    components,
                });
            }
            case_diffs.push(CaseDiff {
                load_case: case.name.clone(),
                points,
            });
        }

        let comparison_rows = extreme_rows(current, &aligned)?;

        tracing::info!(
            current = %current.name,
            previous = %previous.name,
            cases = case_diffs.len(),
            max_abs_difference,
            "Compared LoadSets"
        );

        Ok(Self {
            metadata: ComparisonMetadata {
                loadset1: LoadSetInfo::of(current),
                loadset2: LoadSetInfo::of(previous),
            },
            units: current.units,
            case_diffs,
            comparison_rows,
            max_abs_difference,
            max_difference_percent,
        })
    }

    /// Difference of one component at one point in one case.
    #[must_use]
    pub fn diff(
        &self,
        load_case: &str,
        point: &str,
        component: Component,
    ) -> Option<&ComponentDiff> {
        self.case_diffs
            .iter()
            .find(|c| c.load_case == load_case)?
            .points
            .iter()
            .find(|p| p.point_name == point)?
            .components
            .get(&component)
    }

    /// Headline numbers.
    #[must_use]
    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary {
            loadset1_name: self.metadata.loadset1.name.clone(),
            loadset2_name: self.metadata.loadset2.name.clone(),
            units: self.units,
            compared_load_cases: self.case_diffs.len(),
            compared_points: self.case_diffs.first().map_or(0, |c| c.points.len()),
            comparison_rows: self.comparison_rows.len(),
            exceeding_rows: self
                .comparison_rows
                .iter()
                .filter(|r| r.loadset1_value.abs() > r.loadset2_value.abs())
                .count(),
            max_abs_difference: self.max_abs_difference,
            max_difference_percent: self.max_difference_percent,
        }
    }

    /// Serialises the full report to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedInput`] if serialisation fails.
    pub fn to_json_string(&self) -> LoadResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LoadError::malformed(format!("cannot serialise comparison: {e}")))
    }

    /// Writes the full report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::FileWrite`] if the file cannot be written.
    pub fn write_json(&self, path: impl AsRef<Path>) -> LoadResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_string()?).map_err(|e| LoadError::file_write(path, e))
    }

    /// Writes the extreme comparison rows as CSV with a header line.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::FileWrite`] if the file cannot be written.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> LoadResult<()> {
        let path = path.as_ref();
        let to_io = |e: csv::Error| LoadError::file_write(path, std::io::Error::other(e));
        let mut writer = csv::Writer::from_path(path).map_err(to_io)?;
        for row in &self.comparison_rows {
            writer.serialize(row).map_err(to_io)?;
        }
        writer.flush().map_err(|e| LoadError::file_write(path, e))
    }
}

type PointPairs<'a> = Vec<(&'a PointLoad, &'a PointLoad)>;

/// Pairs every case and point of `current` with its namesake in `previous`.
fn pair_by_name<'a>(
    current: &'a LoadSet,
    previous: &'a LoadSet,
) -> LoadResult<Vec<(&'a LoadCase, PointPairs<'a>)>> {
    let ours: HashSet<&str> = current.load_cases.iter().map(|c| c.name.as_str()).collect();
    let theirs: HashSet<&str> = previous.load_cases.iter().map(|c| c.name.as_str()).collect();
    if let Some(name) = theirs.difference(&ours).copied().min() {
        return Err(missing_case(name, current));
    }

    let mut pairs = Vec::with_capacity(current.load_cases.len());
    for case in &current.load_cases {
        let other = previous
            .case(&case.name)
            .ok_or_else(|| missing_case(&case.name, previous))?;
        let ours: HashSet<&str> = case.point_names().collect();
        if let Some(point) = other.point_names().filter(|p| !ours.contains(p)).min() {
            return Err(missing_point(&case.name, point, current));
        }
        let points = case
            .point_loads
            .iter()
            .map(|point| {
                other
                    .point(&point.name)
                    .map(|o| (point, o))
                    .ok_or_else(|| missing_point(&case.name, &point.name, previous))
            })
            .collect::<LoadResult<PointPairs<'a>>>()?;
        pairs.push((case, points));
    }
    Ok(pairs)
}

fn missing_case(name: &str, missing_from: &LoadSet) -> LoadError {
    LoadError::incompatible(format!(
        "load case '{name}' is not present in LoadSet '{}'",
        missing_from.name
    ))
}

fn missing_point(case: &str, point: &str, missing_from: &LoadSet) -> LoadError {
    LoadError::incompatible(format!(
        "point '{point}' of load case '{case}' is not present in LoadSet '{}'",
        missing_from.name
    ))
}

fn extreme_rows(current: &LoadSet, previous: &LoadSet) -> LoadResult<Vec<ComparisonRow>> {
    let ours = current.extremes()?;
    let theirs = previous.extremes()?;

    let mut rows = Vec::new();
    for (point, components) in ours.iter() {
        for (&component, extremes) in components {
            let Some(other) = theirs.get(point, component) else {
                continue;
            };
            for (kind, a, b) in [
                (ExtremeKind::Max, &extremes.max, &other.max),
                (ExtremeKind::Min, &extremes.min, &other.min),
            ] {
                rows.push(ComparisonRow {
                    point_name: point.to_string(),
                    component,
                    kind,
                    loadset1_value: a.value,
                    loadset2_value: b.value,
                    loadset1_loadcase: a.loadcase.clone(),
                    loadset2_loadcase: b.loadcase.clone(),
                    abs_diff: (a.value - b.value).abs(),
                    pct_diff: PercentDiff::between(a.value, b.value),
                });
            }
        }
    }
    Ok(rows)
}
