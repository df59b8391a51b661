//! Session state for tool calls.
//!
//! A [`Session`] owns the current LoadSet, an optional previous LoadSet for
//! comparison, and the last comparison result. Callers create one session per
//! logical conversation; sessions share nothing, so independent sessions can
//! run side by side. A single session is not meant to be driven from several
//! threads at once; wrap it in a lock if that is needed.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::config::Config;
use crate::loads::{
    AnsysExporter, ChartFormat, ExportOptions, LoadError, LoadResult, LoadSet, LoadSetComparison,
    Units,
};
use crate::tools::protocol::{ToolRequest, ToolResponse, ACCESS_DENIED};

/// Holds the LoadSets a sequence of tool calls operates on.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<LoadSet>,
    previous: Option<LoadSet>,
    comparison: Option<LoadSetComparison>,
    allowed_paths: Vec<PathBuf>,
    export: ExportOptions,
}

impl Session {
    /// Creates an unrestricted session with default export settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session using the allowed paths and export settings of `config`.
    #[must_use]
    pub fn with_config(config: &Config) -> Self {
        Self {
            allowed_paths: config.allowed_paths.clone(),
            export: config.export,
            ..Self::default()
        }
    }

    /// Restricts file access to the given directories.
    #[must_use]
    pub fn with_allowed_paths(mut self, allowed_paths: Vec<PathBuf>) -> Self {
        self.allowed_paths = allowed_paths;
        self
    }

    /// Overrides the export settings.
    #[must_use]
    pub const fn with_export_options(mut self, export: ExportOptions) -> Self {
        self.export = export;
        self
    }

    /// The current LoadSet.
    #[must_use]
    pub const fn current(&self) -> Option<&LoadSet> {
        self.current.as_ref()
    }

    /// The previous LoadSet.
    #[must_use]
    pub const fn previous(&self) -> Option<&LoadSet> {
        self.previous.as_ref()
    }

    /// The last comparison.
    #[must_use]
    pub const fn comparison(&self) -> Option<&LoadSetComparison> {
        self.comparison.as_ref()
    }

    /// Drops every LoadSet and comparison. Settings are kept.
    pub fn reset(&mut self) {
        self.current = None;
        self.previous = None;
        self.comparison = None;
        tracing::debug!("Session reset");
    }

    /// Calls a tool by name with JSON arguments.
    pub fn call_tool(&mut self, name: &str, arguments: &Value) -> ToolResponse {
        match ToolRequest::parse(name, arguments) {
            Ok(request) => self.call(request),
            Err(response) => {
                tracing::warn!(tool = name, message = %response.message, "Rejected tool call");
                response
            }
        }
    }

    /// Runs a typed tool request. Never panics; failures become
    /// `success: false` responses.
    pub fn call(&mut self, request: ToolRequest) -> ToolResponse {
        let tool = request.name();
        tracing::debug!(tool, "Tool call");

        if request.needs_current() && self.current.is_none() {
            return ToolResponse::error(&LoadError::NoLoadSetLoaded);
        }
        for path in request.paths() {
            if let Err(message) = self.validate_path(path) {
                tracing::warn!(tool, path = %path.display(), "Path rejected");
                return ToolResponse::failure(message, ACCESS_DENIED);
            }
        }

        let result = match request {
            ToolRequest::LoadFromJson { file_path } => self.load_from_json(&file_path),
            ToolRequest::LoadFromData { loadset } => self.load_from_data(loadset),
            ToolRequest::ConvertUnits {
                target_units,
                moment_units,
            } => self.convert_units(&target_units, moment_units.as_deref()),
            ToolRequest::ScaleLoads { factor } => self.scale_loads(factor),
            ToolRequest::EnvelopeLoadset {} => self.envelope_loadset(),
            ToolRequest::GetPointExtremes {} => self.get_point_extremes(),
            ToolRequest::LoadSecondLoadset { file_path } => self.load_second_loadset(&file_path),
            ToolRequest::LoadSecondLoadsetFromData { loadset } => {
                self.load_second_loadset_from_data(loadset)
            }
            ToolRequest::CompareLoadsets {} => self.compare_loadsets(),
            ToolRequest::GetComparisonSummary {} => self.get_comparison_summary(),
            ToolRequest::ExportComparisonJson { file_path } => {
                self.export_comparison_json(&file_path)
            }
            ToolRequest::ExportComparisonCsv { file_path } => {
                self.export_comparison_csv(&file_path)
            }
            ToolRequest::GenerateComparisonCharts { output_dir, format } => {
                self.generate_comparison_charts(&output_dir, format.as_deref())
            }
            ToolRequest::ExportToAnsys {
                folder_path,
                name_stem,
            } => self.export_to_ansys(&folder_path, &name_stem),
            ToolRequest::SaveLoadset { file_path } => self.save_loadset(&file_path),
            ToolRequest::GetLoadSummary {} => self.get_load_summary(),
            ToolRequest::ListLoadCases { category } => self.list_load_cases(category.as_deref()),
            ToolRequest::ResetSession {} => {
                self.reset();
                Ok(ToolResponse::ok("Session reset", json!({})))
            }
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(tool, code = e.code(), error = %e, "Tool failed");
            ToolResponse::error(&e)
        })
    }

    /// Checks that `path` lies inside one of the allowed directories.
    ///
    /// Paths that do not exist yet are resolved through their nearest existing
    /// ancestor so that output files and folders can be validated before they
    /// are created.
    fn validate_path(&self, path: &Path) -> Result<(), String> {
        // No configured directories means no restriction.
        if self.allowed_paths.is_empty() {
            return Ok(());
        }

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| format!("Failed to resolve path '{}': {e}", path.display()))?
                .join(path)
        };

        let mut existing = absolute.as_path();
        let mut tail = Vec::new();
        while !existing.exists() {
            let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
                return Err(format!("Invalid path '{}'", path.display()));
            };
            tail.push(name.to_os_string());
            existing = parent;
        }
        let mut canonical = existing
            .canonicalize()
            .map_err(|e| format!("Failed to resolve path '{}': {e}", path.display()))?;
        for name in tail.iter().rev() {
            if name == ".." {
                return Err(format!("Invalid path '{}'", path.display()));
            }
            canonical.push(name);
        }

        for allowed in &self.allowed_paths {
            let Ok(canonical_allowed) = allowed.canonicalize() else {
                continue; // Skip non-existent allowed paths
            };
            if canonical.starts_with(&canonical_allowed) {
                return Ok(());
            }
        }

        Err("Access denied: path is outside the configured allowed directories".to_string())
    }

    fn current_loadset(&self) -> LoadResult<&LoadSet> {
        self.current.as_ref().ok_or(LoadError::NoLoadSetLoaded)
    }

    fn current_loadset_mut(&mut self) -> LoadResult<&mut LoadSet> {
        self.current.as_mut().ok_or(LoadError::NoLoadSetLoaded)
    }

    fn last_comparison(&self) -> LoadResult<&LoadSetComparison> {
        self.comparison.as_ref().ok_or(LoadError::NoComparison)
    }

    fn set_current(&mut self, loadset: LoadSet, source: &str) -> ToolResponse {
        tracing::info!(
            name = %loadset.name,
            load_cases = loadset.load_cases.len(),
            units = %loadset.units,
            source,
            "Loaded LoadSet"
        );
        let response = ToolResponse::ok(
            format!("LoadSet '{}' loaded from {source}", loadset.name),
            loaded_fields(&loadset),
        );
        self.current = Some(loadset);
        self.comparison = None;
        response
    }

    fn set_previous(&mut self, loadset: LoadSet, source: &str) -> ToolResponse {
        tracing::info!(
            name = %loadset.name,
            load_cases = loadset.load_cases.len(),
            source,
            "Loaded comparison LoadSet"
        );
        let response = ToolResponse::ok(
            format!("Comparison LoadSet '{}' loaded from {source}", loadset.name),
            loaded_fields(&loadset),
        );
        self.previous = Some(loadset);
        self.comparison = None;
        response
    }

    fn load_from_json(&mut self, file_path: &Path) -> LoadResult<ToolResponse> {
        let loadset = LoadSet::read_json(file_path)?;
        Ok(self.set_current(loadset, &file_path.display().to_string()))
    }

    fn load_from_data(&mut self, data: Value) -> LoadResult<ToolResponse> {
        let loadset = LoadSet::from_value(data)?;
        Ok(self.set_current(loadset, "data"))
    }

    fn load_second_loadset(&mut self, file_path: &Path) -> LoadResult<ToolResponse> {
        let loadset = LoadSet::read_json(file_path)?;
        Ok(self.set_previous(loadset, &file_path.display().to_string()))
    }

    fn load_second_loadset_from_data(&mut self, data: Value) -> LoadResult<ToolResponse> {
        let loadset = LoadSet::from_value(data)?;
        Ok(self.set_previous(loadset, "data"))
    }

    fn convert_units(&mut self, forces: &str, moments: Option<&str>) -> LoadResult<ToolResponse> {
        let target = Units::parse(forces, moments)?;
        let loadset = self.current_loadset_mut()?;
        let original = loadset.units;
        loadset.convert_to(target);
        tracing::info!(from = %original, to = %target, "Converted LoadSet units");
        Ok(ToolResponse::ok(
            format!("Converted LoadSet from {original} to {target}"),
            json!({
                "original_units": original,
                "units": target,
            }),
        ))
    }

    fn scale_loads(&mut self, factor: f64) -> LoadResult<ToolResponse> {
        let loadset = self.current_loadset_mut()?;
        loadset.scale(factor)?;
        tracing::info!(factor, "Scaled LoadSet");
        Ok(ToolResponse::ok(
            format!("Scaled LoadSet by factor {factor}"),
            json!({
                "factor": factor,
                "num_load_cases": loadset.load_cases.len(),
                "units": loadset.units,
            }),
        ))
    }

    fn envelope_loadset(&mut self) -> LoadResult<ToolResponse> {
        let loadset = self.current_loadset()?;
        let envelope = loadset.envelope()?;
        let original = loadset.load_cases.len();
        let kept = envelope.load_cases.len();
        #[allow(clippy::cast_precision_loss)] // case counts are small
        let reduction_percent = (original - kept) as f64 / original as f64 * 100.0;
        let names: Vec<&str> = envelope.load_cases.iter().map(|c| c.name.as_str()).collect();
        let response = ToolResponse::ok(
            format!("Envelope keeps {kept} of {original} load cases"),
            json!({
                "original_load_cases": original,
                "envelope_load_cases": kept,
                "reduction_percent": reduction_percent,
                "envelope_case_names": names,
            }),
        );
        tracing::info!(original, kept, "Replaced LoadSet with envelope");
        self.current = Some(envelope);
        self.comparison = None;
        Ok(response)
    }

    fn get_point_extremes(&self) -> LoadResult<ToolResponse> {
        let loadset = self.current_loadset()?;
        let extremes = loadset.extremes()?;
        Ok(ToolResponse::ok(
            format!("Extremes of {} points", extremes.len()),
            json!({
                "units": loadset.units,
                "extremes": extremes,
            }),
        ))
    }

    fn compare_loadsets(&mut self) -> LoadResult<ToolResponse> {
        let current = self.current_loadset()?;
        let previous = self.previous.as_ref().ok_or(LoadError::NoPreviousLoadSet)?;
        let comparison = current.compare_to(previous)?;
        let response = ToolResponse::ok(
            format!(
                "Compared '{}' against '{}'",
                comparison.metadata.loadset1.name, comparison.metadata.loadset2.name
            ),
            json!({
                "summary": comparison.summary(),
                "comparison": comparison,
            }),
        );
        self.comparison = Some(comparison);
        Ok(response)
    }

    fn get_comparison_summary(&self) -> LoadResult<ToolResponse> {
        let summary = self.last_comparison()?.summary();
        Ok(ToolResponse::ok(
            format!("{} comparison rows", summary.comparison_rows),
            json!({ "summary": summary }),
        ))
    }

    fn export_comparison_json(&self, file_path: &Path) -> LoadResult<ToolResponse> {
        let comparison = self.last_comparison()?;
        comparison.write_json(file_path)?;
        tracing::info!(path = %file_path.display(), "Wrote comparison JSON");
        Ok(ToolResponse::ok(
            format!("Comparison written to {}", file_path.display()),
            json!({ "file_path": file_path }),
        ))
    }

    fn export_comparison_csv(&self, file_path: &Path) -> LoadResult<ToolResponse> {
        let comparison = self.last_comparison()?;
        comparison.write_csv(file_path)?;
        tracing::info!(path = %file_path.display(), "Wrote comparison CSV");
        Ok(ToolResponse::ok(
            format!("Comparison rows written to {}", file_path.display()),
            json!({
                "file_path": file_path,
                "rows": comparison.comparison_rows.len(),
            }),
        ))
    }

    fn generate_comparison_charts(
        &self,
        output_dir: &Path,
        format: Option<&str>,
    ) -> LoadResult<ToolResponse> {
        let comparison = self.last_comparison()?;
        let format = format.map_or(Ok(ChartFormat::default()), str::parse)?;
        let files = comparison.write_range_charts(output_dir, format)?;
        Ok(ToolResponse::ok(
            format!("Comparison charts saved to {}", output_dir.display()),
            json!({
                "output_dir": output_dir,
                "format": format,
                "chart_files": files,
            }),
        ))
    }

    fn export_to_ansys(&self, folder_path: &Path, name_stem: &str) -> LoadResult<ToolResponse> {
        let loadset = self.current_loadset()?;
        // Extremes first: an inconsistent LoadSet fails before any file is written.
        let extremes = loadset.extremes()?;
        let summary = AnsysExporter::new(self.export).export(loadset, folder_path, name_stem)?;
        Ok(ToolResponse::ok(
            format!(
                "Exported {} ANSYS files to {}",
                summary.files.len(),
                folder_path.display()
            ),
            json!({
                "folder_path": summary.folder,
                "files_created": summary.files,
                "num_files": summary.files.len(),
                "removed_files": summary.removed,
                "units": loadset.units,
                "loadset_extremes": extremes,
            }),
        ))
    }

    fn save_loadset(&self, file_path: &Path) -> LoadResult<ToolResponse> {
        let loadset = self.current_loadset()?;
        loadset.write_json(file_path)?;
        tracing::info!(path = %file_path.display(), "Saved LoadSet");
        Ok(ToolResponse::ok(
            format!("LoadSet '{}' saved to {}", loadset.name, file_path.display()),
            json!({ "file_path": file_path }),
        ))
    }

    fn get_load_summary(&self) -> LoadResult<ToolResponse> {
        let loadset = self.current_loadset()?;
        let mut data = json!({ "summary": loadset.summary() });
        match loadset.extremes() {
            Ok(extremes) => data["loadset_extremes"] = json!(extremes),
            Err(e) => tracing::debug!(error = %e, "Summary without extremes"),
        }
        Ok(ToolResponse::ok(
            format!(
                "LoadSet '{}' with {} load cases in {}",
                loadset.name,
                loadset.load_cases.len(),
                loadset.units
            ),
            data,
        ))
    }

    fn list_load_cases(&self, category: Option<&str>) -> LoadResult<ToolResponse> {
        let loadset = self.current_loadset()?;
        let cases: Vec<Value> = loadset
            .load_cases
            .iter()
            .filter(|c| category.map_or(true, |cat| c.category.as_deref() == Some(cat)))
            .map(|c| {
                json!({
                    "name": c.name,
                    "description": c.description,
                    "category": c.category,
                    "num_point_loads": c.point_loads.len(),
                })
            })
            .collect();
        Ok(ToolResponse::ok(
            format!("{} load cases", cases.len()),
            json!({
                "total": cases.len(),
                "load_cases": cases,
            }),
        ))
    }
}

fn loaded_fields(loadset: &LoadSet) -> Value {
    json!({
        "loadset_name": loadset.name,
        "num_load_cases": loadset.load_cases.len(),
        "units": loadset.units,
    })
}
