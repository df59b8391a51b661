//! LoadSet domain model.
//!
//! A [`LoadSet`] owns named [`LoadCase`]s, each holding [`PointLoad`]s with a
//! six-component [`ForceMoment`]. All values in a LoadSet share one [`Units`]
//! pair. Transformations validate first and then rewrite the whole tree, so a
//! failed operation never leaves a LoadSet half-converted or half-scaled.
//!
//! # Pipeline
//!
//! ```text
//! JSON ─▶ LoadSet ─▶ convert_to ─▶ scale ─▶ envelope / compare_to ─▶ ANSYS decks
//! ```
//!
//! # Example
//!
//! ```no_run
//! use loadset_engine::loads::{LoadSet, Units, ForceUnit};
//!
//! let mut loadset = LoadSet::read_json("loads.json")?;
//! loadset.scale(1.5)?;
//! loadset.convert_to(Units::with_companion(ForceUnit::KiloPoundForce));
//! let summary = loadset.to_ansys("out", "flight")?;
//! println!("{} decks written", summary.files.len());
//! # Ok::<(), loadset_engine::loads::LoadError>(())
//! ```

pub mod ansys;
pub mod chart;
pub mod compare;
mod error;
pub mod extremes;
mod force_moment;
mod load_case;
mod loadset;
pub mod schema;
pub mod units;

pub use ansys::{AnsysDeck, AnsysExporter, ExportOptions, ExportSummary};
pub use chart::{ChartFormat, RangeChart};
pub use compare::{LoadSetComparison, PercentDiff};
pub use error::{
    LoadError, LoadResult, NO_COMPARISON_MESSAGE, NO_LOADSET_MESSAGE, NO_PREVIOUS_MESSAGE,
};
pub use extremes::{ComponentExtremes, Extreme, LoadSetExtremes};
pub use force_moment::{Component, ForceMoment};
pub use load_case::{LoadCase, PointLoad};
pub use loadset::{LoadSet, LoadSetSummary, Version};
pub use units::{ForceUnit, MomentUnit, UnitKind, Units};
