//! Per-point, per-component extreme values across a LoadSet.
//!
//! The serialised form is the structure downstream validators inspect:
//!
//! ```json
//! {
//!   "Point A": {
//!     "fx": { "max": { "value": 100.0, "loadcase": "Case1" },
//!             "min": { "value": -80.0, "loadcase": "Case2" } },
//!     "fy": { ... }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::LoadResult;
use super::force_moment::Component;
use super::loadset::LoadSet;

/// An extreme value and the load case that holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extreme {
    /// Signed value in the LoadSet's units.
    pub value: f64,
    /// Name of the owning load case.
    pub loadcase: String,
}

/// Max and min of one component at one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentExtremes {
    /// Highest signed value.
    pub max: Extreme,
    /// Lowest signed value.
    pub min: Extreme,
}

impl ComponentExtremes {
    fn seed(value: f64, loadcase: &str) -> Self {
        Self {
            max: Extreme {
                value,
                loadcase: loadcase.to_string(),
            },
            min: Extreme {
                value,
                loadcase: loadcase.to_string(),
            },
        }
    }

    // Strict comparisons: on ties the earlier case keeps ownership.
    fn update(&mut self, value: f64, loadcase: &str) {
        if value > self.max.value {
            self.max = Extreme {
                value,
                loadcase: loadcase.to_string(),
            };
        }
        if value < self.min.value {
            self.min = Extreme {
                value,
                loadcase: loadcase.to_string(),
            };
        }
    }

    /// Whether both extremes are exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.max.value == 0.0 && self.min.value == 0.0
    }
}

/// Extremes of every component at one point, in canonical component order.
pub type PointExtremes = IndexMap<Component, ComponentExtremes>;

/// Extremes of a whole LoadSet, keyed by point name in first-case order.
///
/// Computed from a snapshot; it goes stale if the LoadSet is changed later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadSetExtremes {
    points: IndexMap<String, PointExtremes>,
}

impl LoadSetExtremes {
    /// Computes extremes over all load cases.
    ///
    /// # Errors
    ///
    /// Returns [`crate::loads::LoadError::InconsistentPointSet`] if the load
    /// cases do not all contain the same point names.
    pub fn compute(loadset: &LoadSet) -> LoadResult<Self> {
        loadset.check_point_consistency()?;

        let mut points: IndexMap<String, PointExtremes> = IndexMap::new();
        for case in &loadset.load_cases {
            for point in &case.point_loads {
                let entry = points.entry(point.name.clone()).or_default();
                for (component, value) in point.force_moment.components() {
                    entry
                        .entry(component)
                        .and_modify(|e| e.update(value, &case.name))
                        .or_insert_with(|| ComponentExtremes::seed(value, &case.name));
                }
            }
        }
        Ok(Self { points })
    }

    /// Extremes at one point.
    #[must_use]
    pub fn point(&self, name: &str) -> Option<&PointExtremes> {
        self.points.get(name)
    }

    /// Extremes of one component at one point.
    #[must_use]
    pub fn get(&self, point: &str, component: Component) -> Option<&ComponentExtremes> {
        self.points.get(point).and_then(|p| p.get(&component))
    }

    /// Iterates points in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PointExtremes)> {
        self.points.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Point names in order.
    pub fn point_names(&self) -> impl Iterator<Item = &str> {
        self.points.keys().map(String::as_str)
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Load cases that own an envelope-relevant extreme.
    ///
    /// For every component the max owner is selected; the min owner only when
    /// the min is negative. Components that are zero everywhere select nothing.
    #[must_use]
    pub fn envelope_cases(&self) -> Vec<&str> {
        let mut selected: Vec<&str> = Vec::new();
        for extremes in self.points.values().flat_map(IndexMap::values) {
            if extremes.is_zero() {
                continue;
            }
            let min_owner = (extremes.min.value < 0.0).then_some(extremes.min.loadcase.as_str());
            for name in std::iter::once(extremes.max.loadcase.as_str()).chain(min_owner) {
                if !selected.contains(&name) {
                    selected.push(name);
                }
            }
        }
        selected
    }
}
