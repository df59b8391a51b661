//! The LoadSet aggregate.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ansys::{AnsysExporter, ExportSummary};
use super::compare::LoadSetComparison;
use super::error::{LoadError, LoadResult};
use super::extremes::LoadSetExtremes;
use super::force_moment::validate_factor;
use super::load_case::LoadCase;
use super::schema;
use super::units::Units;

/// Document version: integer in current files, string in legacy ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Version {
    /// Integer version, e.g. `1`.
    Number(i64),
    /// Free-form version, e.g. `"1.0.0"`.
    Text(String),
}

impl Default for Version {
    fn default() -> Self {
        Self::Number(1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A named, unit-tagged collection of load cases.
///
/// Every force/moment value in the tree is expressed in [`LoadSet::units`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSet {
    /// LoadSet name.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Document version.
    pub version: Version,
    /// Units of every contained value.
    pub units: Units,
    /// Load cases in stored order.
    pub load_cases: Vec<LoadCase>,
    /// Coordinate system, point descriptions and similar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Counts and units of a LoadSet, as reported by `get_load_summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSetSummary {
    /// LoadSet name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Document version.
    pub version: Version,
    /// Current units.
    pub units: Units,
    /// Number of load cases.
    pub num_load_cases: usize,
    /// Point loads summed over all cases.
    pub total_point_loads: usize,
    /// Distinct point names in first-seen order.
    pub point_names: Vec<String>,
    /// Distinct categories in first-seen order.
    pub categories: Vec<String>,
}

impl LoadSet {
    /// Creates a LoadSet with version 1 and no metadata.
    pub fn new(name: impl Into<String>, units: Units, load_cases: Vec<LoadCase>) -> Self {
        Self {
            name: name.into(),
            description: None,
            version: Version::default(),
            units,
            load_cases,
            metadata: None,
        }
    }

    /// Reads and validates a LoadSet from a JSON file in either schema.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::FileNotFound`] if the file is missing,
    /// [`LoadError::MalformedInput`] for invalid JSON or schema violations.
    pub fn read_json(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| LoadError::file_read(path, e))?;
        let doc: Value = serde_json::from_str(&contents).map_err(|e| {
            LoadError::malformed(format!("invalid JSON in file {}: {e}", path.display()))
        })?;
        schema::parse_document(doc)
    }

    /// Parses and validates a LoadSet from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedInput`] for invalid JSON or schema violations.
    pub fn from_json_str(json: &str) -> LoadResult<Self> {
        let doc: Value = serde_json::from_str(json)
            .map_err(|e| LoadError::malformed(format!("invalid JSON: {e}")))?;
        schema::parse_document(doc)
    }

    /// Builds and validates a LoadSet from an in-memory JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedInput`] for schema violations.
    pub fn from_value(doc: Value) -> LoadResult<Self> {
        schema::parse_document(doc)
    }

    /// Writes the LoadSet as pretty-printed JSON in the current schema.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::FileWrite`] if the file cannot be written.
    pub fn write_json(&self, path: impl AsRef<Path>) -> LoadResult<()> {
        let path = path.as_ref();
        let json = self.to_json_string()?;
        std::fs::write(path, json).map_err(|e| LoadError::file_write(path, e))
    }

    /// Serialises to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedInput`] if serialisation fails.
    pub fn to_json_string(&self) -> LoadResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LoadError::malformed(format!("cannot serialise LoadSet: {e}")))
    }

    /// Checks unique, non-empty load case names and each case's point names.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedInput`] describing the first violation.
    pub fn validate(&self) -> LoadResult<()> {
        let mut seen = HashSet::new();
        for case in &self.load_cases {
            case.validate()?;
            if !seen.insert(case.name.as_str()) {
                return Err(LoadError::malformed(format!(
                    "duplicate load case '{}'",
                    case.name
                )));
            }
        }
        Ok(())
    }

    /// Checks that every load case holds the same set of point names as the
    /// first one.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InconsistentPointSet`] naming the first divergent case.
    pub fn check_point_consistency(&self) -> LoadResult<()> {
        let Some(first) = self.load_cases.first() else {
            return Ok(());
        };
        let reference: HashSet<&str> = first.point_names().collect();
        for case in &self.load_cases[1..] {
            let points: HashSet<&str> = case.point_names().collect();
            if points != reference {
                let mut missing: Vec<&str> = reference.difference(&points).copied().collect();
                let mut extra: Vec<&str> = points.difference(&reference).copied().collect();
                missing.sort_unstable();
                extra.sort_unstable();
                return Err(LoadError::inconsistent_points(
                    &case.name,
                    format!(
                        "missing [{}], unexpected [{}] relative to '{}'",
                        missing.join(", "),
                        extra.join(", "),
                        first.name
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Looks up a load case by name.
    #[must_use]
    pub fn case(&self, name: &str) -> Option<&LoadCase> {
        self.load_cases.iter().find(|c| c.name == name)
    }

    /// Load cases with the given category, in stored order.
    pub fn cases_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a LoadCase> {
        self.load_cases
            .iter()
            .filter(move |c| c.category.as_deref() == Some(category))
    }

    /// Distinct point names in first-seen order.
    #[must_use]
    pub fn point_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.load_cases.iter().flat_map(LoadCase::point_names) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Point loads summed over all cases.
    #[must_use]
    pub fn total_point_loads(&self) -> usize {
        self.load_cases.iter().map(|c| c.point_loads.len()).sum()
    }

    /// Summary counts.
    #[must_use]
    pub fn summary(&self) -> LoadSetSummary {
        let mut categories: Vec<String> = Vec::new();
        for category in self.load_cases.iter().filter_map(|c| c.category.as_deref()) {
            if !categories.iter().any(|c| c == category) {
                categories.push(category.to_string());
            }
        }
        LoadSetSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            version: self.version.clone(),
            units: self.units,
            num_load_cases: self.load_cases.len(),
            total_point_loads: self.total_point_loads(),
            point_names: self.point_names(),
            categories,
        }
    }

    /// Converts every value to `units` in place and updates the unit tag.
    ///
    /// Converting to the current units leaves every value bit-for-bit intact.
    pub fn convert_to(&mut self, units: Units) {
        if units == self.units {
            return;
        }
        let from = self.units;
        for case in &mut self.load_cases {
            *case = case.map_loads(|fm| fm.convert(from, units));
        }
        self.units = units;
    }

    /// Returns a converted copy.
    #[must_use]
    pub fn converted(&self, units: Units) -> Self {
        let mut copy = self.clone();
        copy.convert_to(units);
        copy
    }

    /// Parses the unit identifiers, then converts in place.
    ///
    /// Nothing is modified if either identifier is unknown. When `moments` is
    /// `None` the companion moment unit of `forces` is used.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnrecognizedUnit`] for an unknown identifier.
    pub fn convert_to_named(&mut self, forces: &str, moments: Option<&str>) -> LoadResult<Units> {
        let units = Units::parse(forces, moments)?;
        self.convert_to(units);
        Ok(units)
    }

    /// Multiplies every component of every point load by `factor` in place.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidScaleFactor`] if `factor` is not finite or
    /// any scaled value overflows; the LoadSet is then left untouched.
    pub fn scale(&mut self, factor: f64) -> LoadResult<()> {
        validate_factor(factor)?;
        let scaled = self
            .load_cases
            .iter()
            .map(|case| case.try_map_loads(|fm| fm.scale(factor)))
            .collect::<LoadResult<Vec<_>>>()?;
        self.load_cases = scaled;
        Ok(())
    }

    /// Returns a scaled copy.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidScaleFactor`] if `factor` is not finite.
    pub fn scaled(&self, factor: f64) -> LoadResult<Self> {
        let mut copy = self.clone();
        copy.scale(factor)?;
        Ok(copy)
    }

    /// Per-point, per-component extremes with owning load cases.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InconsistentPointSet`] if the cases' point sets differ.
    pub fn extremes(&self) -> LoadResult<LoadSetExtremes> {
        LoadSetExtremes::compute(self)
    }

    /// A copy holding only the load cases that own an extreme value.
    ///
    /// See [`LoadSetExtremes::envelope_cases`] for the selection rule. Cases
    /// keep their stored order.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedInput`] if there are no load cases, and
    /// [`LoadError::InconsistentPointSet`] if the cases' point sets differ.
    pub fn envelope(&self) -> LoadResult<Self> {
        if self.load_cases.is_empty() {
            return Err(LoadError::malformed("Cannot create envelope of empty LoadSet"));
        }
        let extremes = self.extremes()?;
        let selected = extremes.envelope_cases();
        Ok(Self {
            load_cases: self
                .load_cases
                .iter()
                .filter(|c| selected.contains(&c.name.as_str()))
                .cloned()
                .collect(),
            ..self.clone()
        })
    }

    /// Compares this LoadSet against a previous one.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::IncompatibleLoadSets`] if case or point names differ.
    pub fn compare_to(&self, previous: &Self) -> LoadResult<LoadSetComparison> {
        LoadSetComparison::compute(self, previous)
    }

    /// Writes one ANSYS input deck per load case with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ExportIoFailure`] if a file cannot be written.
    pub fn to_ansys(&self, folder: impl AsRef<Path>, name_stem: &str) -> LoadResult<ExportSummary> {
        AnsysExporter::default().export(self, folder.as_ref(), name_stem)
    }
}
