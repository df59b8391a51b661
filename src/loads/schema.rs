//! Versioned readers for LoadSet JSON documents.
//!
//! Two document shapes exist:
//!
//! - **Current**: cases carry `name` and a `point_loads` list of
//!   `{name, force_moment: {fx, fy, fz, mx, my, mz}}`.
//! - **Legacy**: cases carry `id`, `category` and one flat object per point,
//!   keyed `point_<X>` with `Fx`..`Mz` fields.
//!
//! [`SchemaKind::detect`] inspects the document once and the matching reader
//! builds the same [`LoadSet`] model.

use serde_json::{Map, Value};

use super::error::{LoadError, LoadResult};
use super::force_moment::{Component, ForceMoment};
use super::load_case::{LoadCase, PointLoad};
use super::loadset::{LoadSet, Version};
use super::units::Units;

/// Top-level fields every LoadSet document must carry.
const REQUIRED_FIELDS: [&str; 4] = ["name", "version", "units", "load_cases"];

/// Prefix of flat point objects in legacy documents.
const LEGACY_POINT_PREFIX: &str = "point_";

/// Document layout detected by [`SchemaKind::detect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// Nested `point_loads` / `force_moment` layout.
    Current,
    /// Flat `point_<X>` / `Fx` layout.
    Legacy,
}

impl SchemaKind {
    /// Probes a document.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedInput`] if the document is not an object,
    /// lacks required fields, has a non-list `load_cases`, or mixes layouts.
    pub fn detect(doc: &Value) -> LoadResult<Self> {
        let obj = doc
            .as_object()
            .ok_or_else(|| LoadError::malformed("LoadSet document must be a JSON object"))?;

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|f| !obj.contains_key(*f))
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::malformed(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let cases = obj["load_cases"]
            .as_array()
            .ok_or_else(|| LoadError::malformed("'load_cases' must be a list"))?;

        let mut kind = None;
        for (index, case) in cases.iter().enumerate() {
            let case = case.as_object().ok_or_else(|| {
                LoadError::malformed(format!("load case #{index} must be a JSON object"))
            })?;
            let this = if case.contains_key("point_loads") {
                Some(Self::Current)
            } else if case.keys().any(|k| is_legacy_point_key(k)) {
                Some(Self::Legacy)
            } else {
                None
            };
            match (kind, this) {
                (Some(a), Some(b)) if a != b => {
                    return Err(LoadError::malformed(
                        "load cases mix 'point_loads' and legacy 'point_<X>' layouts",
                    ));
                }
                (None, Some(b)) => kind = Some(b),
                _ => {}
            }
        }
        Ok(kind.unwrap_or(Self::Current))
    }
}

fn is_legacy_point_key(key: &str) -> bool {
    key.len() > LEGACY_POINT_PREFIX.len()
        && key.starts_with(LEGACY_POINT_PREFIX)
        && key != "point_loads"
}

/// Builds a validated [`LoadSet`] from a parsed JSON document.
///
/// # Errors
///
/// Returns [`LoadError::MalformedInput`] for schema violations and
/// [`LoadError::UnrecognizedUnit`] for unknown unit identifiers.
pub fn parse_document(doc: Value) -> LoadResult<LoadSet> {
    let loadset = match SchemaKind::detect(&doc)? {
        SchemaKind::Current => read_current(doc)?,
        SchemaKind::Legacy => read_legacy(&doc)?,
    };
    loadset.validate()?;
    Ok(loadset)
}

fn read_current(doc: Value) -> LoadResult<LoadSet> {
    // Units first so an unknown unit surfaces as UnrecognizedUnit rather than
    // a generic deserialisation failure.
    read_units(&doc["units"])?;
    serde_json::from_value(doc)
        .map_err(|e| LoadError::malformed(format!("invalid LoadSet data: {e}")))
}

fn read_legacy(doc: &Value) -> LoadResult<LoadSet> {
    let name = required_str(doc, "name")?.to_string();
    let version: Version = serde_json::from_value(doc["version"].clone())
        .map_err(|_| LoadError::malformed("'version' must be an integer or a string"))?;
    let units = read_units(&doc["units"])?;

    let cases = doc["load_cases"]
        .as_array()
        .ok_or_else(|| LoadError::malformed("'load_cases' must be a list"))?
        .iter()
        .enumerate()
        .map(|(index, case)| read_legacy_case(index, case))
        .collect::<LoadResult<Vec<_>>>()?;

    let mut loadset = LoadSet::new(name, units, cases);
    loadset.version = version;
    loadset.description = optional_str(doc, "description")?;
    loadset.metadata = match doc.get("metadata") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => return Err(LoadError::malformed("'metadata' must be an object")),
    };
    Ok(loadset)
}

fn read_legacy_case(index: usize, case: &Value) -> LoadResult<LoadCase> {
    let name = match (case.get("id"), case.get("name")) {
        (Some(Value::String(id)), _) | (None, Some(Value::String(id))) => id.clone(),
        _ => {
            return Err(LoadError::malformed(format!(
                "load case #{index} needs a string 'id'"
            )))
        }
    };

    let mut load_case = LoadCase::new(name);
    load_case.category = optional_str(case, "category")?;
    load_case.description = optional_str(case, "description")?;

    let Some(fields) = case.as_object() else {
        return Err(LoadError::malformed(format!(
            "load case #{index} must be a JSON object"
        )));
    };
    for (key, value) in fields.iter().filter(|(k, _)| is_legacy_point_key(k)) {
        let point_name = &key[LEGACY_POINT_PREFIX.len()..];
        let force_moment = read_legacy_point(&load_case.name, key, value)?;
        load_case.point_loads.push(PointLoad::new(point_name, force_moment));
    }
    Ok(load_case)
}

fn read_legacy_point(case: &str, key: &str, value: &Value) -> LoadResult<ForceMoment> {
    let fields: &Map<String, Value> = value.as_object().ok_or_else(|| {
        LoadError::malformed(format!("'{key}' in load case '{case}' must be an object"))
    })?;

    let mut force_moment = ForceMoment::default();
    for (component, raw) in fields {
        let component: Component = component.parse()?;
        let number = raw.as_f64().ok_or_else(|| {
            LoadError::malformed(format!(
                "'{key}.{component}' in load case '{case}' must be a number"
            ))
        })?;
        force_moment = force_moment.map(|c, v| if c == component { number } else { v });
    }
    Ok(force_moment)
}

fn read_units(value: &Value) -> LoadResult<Units> {
    let forces = value
        .get("forces")
        .and_then(Value::as_str)
        .ok_or_else(|| LoadError::malformed("'units.forces' must be a string"))?;
    let moments = value
        .get("moments")
        .and_then(Value::as_str)
        .ok_or_else(|| LoadError::malformed("'units.moments' must be a string"))?;
    Units::parse(forces, Some(moments))
}

fn required_str<'a>(value: &'a Value, field: &str) -> LoadResult<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| LoadError::malformed(format!("'{field}' must be a string")))
}

fn optional_str(value: &Value, field: &str) -> LoadResult<Option<String>> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(LoadError::malformed(format!("'{field}' must be a string"))),
    }
}
