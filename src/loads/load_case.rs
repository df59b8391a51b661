//! Point loads and load cases.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::{LoadError, LoadResult};
use super::force_moment::ForceMoment;

/// Force/moment values at one named interface point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLoad {
    /// Point name, e.g. `"Point A"`. Join key for export and comparison.
    pub name: String,
    /// Load acting at the point.
    pub force_moment: ForceMoment,
}

impl PointLoad {
    /// Creates a point load.
    pub fn new(name: impl Into<String>, force_moment: ForceMoment) -> Self {
        Self {
            name: name.into(),
            force_moment,
        }
    }
}

/// One loading scenario, e.g. a flight phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCase {
    /// Case name, unique within its LoadSet.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grouping tag such as `"takeoff"`, `"cruise"` or `"landing"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Point loads in stored order.
    #[serde(default)]
    pub point_loads: Vec<PointLoad>,
}

impl LoadCase {
    /// Creates an empty load case.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
            point_loads: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Appends a point load.
    #[must_use]
    pub fn with_point(mut self, name: impl Into<String>, force_moment: ForceMoment) -> Self {
        self.point_loads.push(PointLoad::new(name, force_moment));
        self
    }

    /// Looks up a point load by name.
    #[must_use]
    pub fn point(&self, name: &str) -> Option<&PointLoad> {
        self.point_loads.iter().find(|p| p.name == name)
    }

    /// Point names in stored order.
    pub fn point_names(&self) -> impl Iterator<Item = &str> {
        self.point_loads.iter().map(|p| p.name.as_str())
    }

    /// Checks that the case is named and its point names are unique.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedInput`] describing the first violation.
    pub fn validate(&self) -> LoadResult<()> {
        if self.name.trim().is_empty() {
            return Err(LoadError::malformed("load case name cannot be empty"));
        }
        let mut seen = HashSet::new();
        for point in &self.point_loads {
            if point.name.trim().is_empty() {
                return Err(LoadError::malformed(format!(
                    "load case '{}' has a point load without a name",
                    self.name
                )));
            }
            if !seen.insert(point.name.as_str()) {
                return Err(LoadError::malformed(format!(
                    "duplicate point '{}' in load case '{}'",
                    point.name, self.name
                )));
            }
        }
        Ok(())
    }

    /// Returns a copy with every force/moment rewritten by `f`.
    pub(crate) fn map_loads(&self, f: impl Fn(&ForceMoment) -> ForceMoment) -> Self {
        Self {
            point_loads: self
                .point_loads
                .iter()
                .map(|p| PointLoad::new(p.name.clone(), f(&p.force_moment)))
                .collect(),
            ..self.clone()
        }
    }

    /// Like [`LoadCase::map_loads`], stopping at the first error.
    pub(crate) fn try_map_loads(
        &self,
        f: impl Fn(&ForceMoment) -> LoadResult<ForceMoment>,
    ) -> LoadResult<Self> {
        let point_loads = self
            .point_loads
            .iter()
            .map(|p| Ok(PointLoad::new(p.name.clone(), f(&p.force_moment)?)))
            .collect::<LoadResult<Vec<_>>>()?;
        Ok(Self {
            point_loads,
            ..self.clone()
        })
    }
}
