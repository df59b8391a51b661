//! Typed tool requests and responses.
//!
//! Every tool takes a JSON object of arguments and returns a JSON object with
//! at least `success` and `message`. Failures also carry a stable
//! `error_code`. Operation-specific fields sit next to them at the top level.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::loads::LoadError;

/// Error code for arguments that do not match a tool's schema.
pub const INVALID_ARGUMENTS: &str = "INVALID_ARGUMENTS";

/// Error code for a tool name that is not registered.
pub const UNKNOWN_TOOL: &str = "UNKNOWN_TOOL";

/// Error code for a path outside the configured allowed directories.
pub const ACCESS_DENIED: &str = "ACCESS_DENIED";

/// A tool invocation with its typed arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "arguments", rename_all = "snake_case")]
pub enum ToolRequest {
    /// Read the current LoadSet from a JSON file.
    LoadFromJson {
        /// Input file.
        file_path: PathBuf,
    },
    /// Use an inline JSON document as the current LoadSet.
    LoadFromData {
        /// LoadSet document in either schema.
        loadset: Value,
    },
    /// Convert the current LoadSet in place.
    ConvertUnits {
        /// Target force unit, e.g. `"klbf"`.
        target_units: String,
        /// Target moment unit; defaults to the force unit's companion.
        #[serde(default)]
        moment_units: Option<String>,
    },
    /// Scale the current LoadSet in place.
    ScaleLoads {
        /// Dimensionless factor.
        factor: f64,
    },
    /// Replace the current LoadSet with its envelope.
    EnvelopeLoadset {},
    /// Per-point, per-component extremes of the current LoadSet.
    GetPointExtremes {},
    /// Read the previous LoadSet from a JSON file.
    LoadSecondLoadset {
        /// Input file.
        file_path: PathBuf,
    },
    /// Use an inline JSON document as the previous LoadSet.
    LoadSecondLoadsetFromData {
        /// LoadSet document in either schema.
        loadset: Value,
    },
    /// Compare the current LoadSet against the previous one.
    CompareLoadsets {},
    /// Headline numbers of the last comparison.
    GetComparisonSummary {},
    /// Write the last comparison as JSON.
    ExportComparisonJson {
        /// Output file.
        file_path: PathBuf,
    },
    /// Write the last comparison's extreme rows as CSV.
    ExportComparisonCsv {
        /// Output file.
        file_path: PathBuf,
    },
    /// Write one range chart per point of the last comparison.
    GenerateComparisonCharts {
        /// Output folder, created if missing.
        output_dir: PathBuf,
        /// Image format; only `"svg"` is supported.
        #[serde(default)]
        format: Option<String>,
    },
    /// Write one ANSYS deck per load case.
    ExportToAnsys {
        /// Output folder, created if missing.
        folder_path: PathBuf,
        /// File name prefix.
        name_stem: String,
    },
    /// Write the current LoadSet as JSON.
    SaveLoadset {
        /// Output file.
        file_path: PathBuf,
    },
    /// Counts, units and extremes of the current LoadSet.
    GetLoadSummary {},
    /// Load cases of the current LoadSet.
    ListLoadCases {
        /// Only cases with this category.
        #[serde(default)]
        category: Option<String>,
    },
    /// Drop every LoadSet and comparison held by the session.
    ResetSession {},
}

impl ToolRequest {
    /// Builds a request from a tool name and its JSON arguments.
    ///
    /// Missing or `null` arguments are treated as `{}`.
    ///
    /// # Errors
    ///
    /// Returns a failure response for unknown tools or invalid arguments.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, ToolResponse> {
        if !tool_definitions().iter().any(|t| t.name == name) {
            return Err(ToolResponse::failure(
                format!("Unknown tool: {name}"),
                UNKNOWN_TOOL,
            ));
        }
        let arguments = if arguments.is_null() {
            json!({})
        } else {
            arguments.clone()
        };
        serde_json::from_value(json!({ "tool": name, "arguments": arguments })).map_err(|e| {
            ToolResponse::failure(format!("Invalid arguments for {name}: {e}"), INVALID_ARGUMENTS)
        })
    }

    /// The tool name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoadFromJson { .. } => "load_from_json",
            Self::LoadFromData { .. } => "load_from_data",
            Self::ConvertUnits { .. } => "convert_units",
            Self::ScaleLoads { .. } => "scale_loads",
            Self::EnvelopeLoadset {} => "envelope_loadset",
            Self::GetPointExtremes {} => "get_point_extremes",
            Self::LoadSecondLoadset { .. } => "load_second_loadset",
            Self::LoadSecondLoadsetFromData { .. } => "load_second_loadset_from_data",
            Self::CompareLoadsets {} => "compare_loadsets",
            Self::GetComparisonSummary {} => "get_comparison_summary",
            Self::ExportComparisonJson { .. } => "export_comparison_json",
            Self::ExportComparisonCsv { .. } => "export_comparison_csv",
            Self::GenerateComparisonCharts { .. } => "generate_comparison_charts",
            Self::ExportToAnsys { .. } => "export_to_ansys",
            Self::SaveLoadset { .. } => "save_loadset",
            Self::GetLoadSummary {} => "get_load_summary",
            Self::ListLoadCases { .. } => "list_load_cases",
            Self::ResetSession {} => "reset_session",
        }
    }

    /// Whether the tool operates on the current LoadSet.
    #[must_use]
    pub const fn needs_current(&self) -> bool {
        matches!(
            self,
            Self::ConvertUnits { .. }
                | Self::ScaleLoads { .. }
                | Self::EnvelopeLoadset {}
                | Self::GetPointExtremes {}
                | Self::CompareLoadsets {}
                | Self::ExportToAnsys { .. }
                | Self::SaveLoadset { .. }
                | Self::GetLoadSummary {}
                | Self::ListLoadCases { .. }
        )
    }

    /// File system paths the tool reads or writes.
    #[must_use]
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            Self::LoadFromJson { file_path }
            | Self::LoadSecondLoadset { file_path }
            | Self::ExportComparisonJson { file_path }
            | Self::ExportComparisonCsv { file_path }
            | Self::SaveLoadset { file_path } => vec![file_path.as_path()],
            Self::ExportToAnsys { folder_path, .. } => vec![folder_path.as_path()],
            Self::GenerateComparisonCharts { output_dir, .. } => vec![output_dir.as_path()],
            _ => Vec::new(),
        }
    }
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    /// Whether the tool succeeded.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Stable failure code, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Operation-specific fields.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl ToolResponse {
    /// Creates a successful response. `data` must be a JSON object to be kept.
    #[must_use]
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            error_code: None,
            data: match data {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }

    /// Creates a failure response with an explicit code.
    #[must_use]
    pub fn failure(message: impl Into<String>, code: &str) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_code: Some(code.to_string()),
            data: Map::new(),
        }
    }

    /// Creates a failure response from a domain error.
    #[must_use]
    pub fn error(err: &LoadError) -> Self {
        Self::failure(err.to_string(), err.code())
    }

    /// A field of the operation-specific data.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// The whole response as one JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.data.clone();
        map.insert("success".into(), Value::Bool(self.success));
        map.insert("message".into(), Value::String(self.message.clone()));
        if let Some(code) = &self.error_code {
            map.insert("error_code".into(), Value::String(code.clone()));
        }
        Value::Object(map)
    }
}

/// A tool definition for the orchestration layer's tool list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

impl ToolDefinition {
    fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

fn no_arguments() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn file_argument(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "file_path": { "type": "string", "description": description }
        },
        "required": ["file_path"]
    })
}

fn loadset_argument() -> Value {
    json!({
        "type": "object",
        "properties": {
            "loadset": {
                "type": "object",
                "description": "LoadSet document with name, version, units and load_cases"
            }
        },
        "required": ["loadset"]
    })
}

/// Every tool a session understands, with its argument schema.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        // === Loading ===
        ToolDefinition::new(
            "load_from_json",
            "Load a LoadSet from a JSON file. Accepts the nested point_loads layout and the \
             legacy flat point_<X> layout. Replaces the current LoadSet.",
            file_argument("Path to the LoadSet JSON file"),
        ),
        ToolDefinition::new(
            "load_from_data",
            "Load a LoadSet from an inline JSON object. Replaces the current LoadSet.",
            loadset_argument(),
        ),
        ToolDefinition::new(
            "load_second_loadset",
            "Load the previous LoadSet to compare against from a JSON file.",
            file_argument("Path to the previous LoadSet JSON file"),
        ),
        ToolDefinition::new(
            "load_second_loadset_from_data",
            "Load the previous LoadSet to compare against from an inline JSON object.",
            loadset_argument(),
        ),
        // === Transformations ===
        ToolDefinition::new(
            "convert_units",
            "Convert every force and moment of the current LoadSet. Force units: N, kN, lbf, \
             klbf. Moment units: Nm, Nmm, kNm, lbf-ft, klbf-ft. Without moment_units the \
             conventional companion of the force unit is used (kN -> kNm, klbf -> lbf-ft).",
            json!({
                "type": "object",
                "properties": {
                    "target_units": { "type": "string", "description": "Target force unit" },
                    "moment_units": {
                        "type": "string",
                        "description": "Optional: target moment unit"
                    }
                },
                "required": ["target_units"]
            }),
        ),
        ToolDefinition::new(
            "scale_loads",
            "Multiply every component of every point load by a finite factor. Units are unchanged.",
            json!({
                "type": "object",
                "properties": {
                    "factor": { "type": "number", "description": "Dimensionless scale factor" }
                },
                "required": ["factor"]
            }),
        ),
        ToolDefinition::new(
            "envelope_loadset",
            "Reduce the current LoadSet to the load cases that own a maximum, or a negative \
             minimum, of any point component.",
            no_arguments(),
        ),
        // === Queries ===
        ToolDefinition::new(
            "get_point_extremes",
            "Max and min of every component at every point, with the owning load case.",
            no_arguments(),
        ),
        ToolDefinition::new(
            "get_load_summary",
            "Name, units, counts, point names and extremes of the current LoadSet.",
            no_arguments(),
        ),
        ToolDefinition::new(
            "list_load_cases",
            "List the load cases of the current LoadSet, optionally filtered by category.",
            json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "Optional: e.g. takeoff, cruise, landing"
                    }
                }
            }),
        ),
        // === Comparison ===
        ToolDefinition::new(
            "compare_loadsets",
            "Compare the current LoadSet against the previous one. Cases and points are paired \
             by name and must match exactly. The previous LoadSet is converted to the current \
             units first.",
            no_arguments(),
        ),
        ToolDefinition::new(
            "get_comparison_summary",
            "Headline numbers of the last comparison.",
            no_arguments(),
        ),
        ToolDefinition::new(
            "export_comparison_json",
            "Write the full report of the last comparison as JSON.",
            file_argument("Output JSON file"),
        ),
        ToolDefinition::new(
            "export_comparison_csv",
            "Write the extreme comparison rows of the last comparison as CSV.",
            file_argument("Output CSV file"),
        ),
        ToolDefinition::new(
            "generate_comparison_charts",
            "Write one range chart per point of the last comparison to \
             {output_dir}/{point}_ranges.svg. Each chart shows the min-to-max range of every \
             force and moment component in both LoadSets and marks previous ranges that \
             reach outside the current ones.",
            json!({
                "type": "object",
                "properties": {
                    "output_dir": {
                        "type": "string",
                        "description": "Output folder (created if missing)"
                    },
                    "format": { "type": "string", "description": "Optional: svg (default)" }
                },
                "required": ["output_dir"]
            }),
        ),
        // === Output ===
        ToolDefinition::new(
            "export_to_ansys",
            "Write one ANSYS input deck per load case to {folder_path}/{name_stem}_{case}.inp \
             using the current units. Returns the files written and the LoadSet extremes.",
            json!({
                "type": "object",
                "properties": {
                    "folder_path": {
                        "type": "string",
                        "description": "Output folder (created if missing)"
                    },
                    "name_stem": { "type": "string", "description": "File name prefix" }
                },
                "required": ["folder_path", "name_stem"]
            }),
        ),
        ToolDefinition::new(
            "save_loadset",
            "Write the current LoadSet as JSON in the nested point_loads layout.",
            file_argument("Output JSON file"),
        ),
        ToolDefinition::new(
            "reset_session",
            "Drop the current and previous LoadSets and any comparison.",
            no_arguments(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_typed_arguments() {
        let req = ToolRequest::parse("scale_loads", &json!({ "factor": 1.5 })).unwrap();
        assert_eq!(req, ToolRequest::ScaleLoads { factor: 1.5 });

        let req = ToolRequest::parse("convert_units", &json!({ "target_units": "kN" })).unwrap();
        assert_eq!(
            req,
            ToolRequest::ConvertUnits {
                target_units: "kN".into(),
                moment_units: None
            }
        );
    }

    #[test]
    fn parse_no_argument_tools_with_null_or_empty() {
        assert_eq!(
            ToolRequest::parse("get_load_summary", &Value::Null).unwrap(),
            ToolRequest::GetLoadSummary {}
        );
        assert_eq!(
            ToolRequest::parse("envelope_loadset", &json!({})).unwrap(),
            ToolRequest::EnvelopeLoadset {}
        );
    }

    #[test]
    fn parse_rejects_unknown_tool_and_bad_arguments() {
        let err = ToolRequest::parse("frobnicate", &json!({})).unwrap_err();
        assert_eq!(err.error_code.as_deref(), Some(UNKNOWN_TOOL));

        let err = ToolRequest::parse("scale_loads", &json!({ "factor": "big" })).unwrap_err();
        assert_eq!(err.error_code.as_deref(), Some(INVALID_ARGUMENTS));
        assert!(!err.success);
    }

    #[test]
    fn every_definition_parses_and_round_trips_its_name() {
        let samples = [
            ("load_from_json", json!({ "file_path": "a.json" })),
            ("load_from_data", json!({ "loadset": {} })),
            ("load_second_loadset", json!({ "file_path": "a.json" })),
            ("load_second_loadset_from_data", json!({ "loadset": {} })),
            ("convert_units", json!({ "target_units": "N" })),
            ("scale_loads", json!({ "factor": 2.0 })),
            ("export_comparison_json", json!({ "file_path": "c.json" })),
            ("export_comparison_csv", json!({ "file_path": "c.csv" })),
            ("generate_comparison_charts", json!({ "output_dir": "charts" })),
            ("export_to_ansys", json!({ "folder_path": "out", "name_stem": "x" })),
            ("save_loadset", json!({ "file_path": "s.json" })),
        ];
        for def in tool_definitions() {
            let args = samples
                .iter()
                .find(|(n, _)| *n == def.name)
                .map_or_else(|| json!({}), |(_, a)| a.clone());
            let req = ToolRequest::parse(&def.name, &args).unwrap();
            assert_eq!(req.name(), def.name);
        }
    }

    #[test]
    fn response_flattens_data() {
        let resp = ToolResponse::ok("done", json!({ "num_files": 3 }));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["num_files"], 3);
        assert!(value.get("error_code").is_none());
        assert_eq!(value, resp.to_value());
    }

    #[test]
    fn error_response_carries_code() {
        let resp = ToolResponse::error(&LoadError::NoLoadSetLoaded);
        assert!(!resp.success);
        assert!(resp.message.contains("No LoadSet loaded"));
        assert_eq!(resp.error_code.as_deref(), Some("NO_LOADSET_LOADED"));
    }
}
