//! Error types for LoadSet operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for LoadSet operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Message returned by every operation that needs a loaded LoadSet.
pub const NO_LOADSET_MESSAGE: &str = "No LoadSet loaded. Use load_from_json first.";

/// Message returned when a comparison needs a second LoadSet.
pub const NO_PREVIOUS_MESSAGE: &str =
    "No comparison LoadSet loaded. Use load_second_loadset first.";

/// Message returned when a comparison export runs before `compare_loadsets`.
pub const NO_COMPARISON_MESSAGE: &str = "No comparison available. Use compare_loadsets first.";

/// Errors that can occur while reading, transforming or exporting LoadSets.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input file does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// Invalid JSON or a document that violates the LoadSet schema.
    #[error("Malformed input: {message}")]
    MalformedInput {
        /// Description of what's wrong.
        message: String,
    },

    /// A unit identifier that is not part of the unit system.
    #[error("Unrecognized unit: '{unit}'")]
    UnrecognizedUnit {
        /// The identifier as given.
        unit: String,
    },

    /// A force unit was used where a moment unit is expected, or vice versa.
    #[error("Cannot convert between '{from}' and '{to}': different dimensions")]
    DimensionMismatch {
        /// Source unit.
        from: String,
        /// Target unit.
        to: String,
    },

    /// Scale factor is NaN or infinite, or scaling overflows a value.
    #[error("Invalid scale factor: {factor} (factor and scaled values must be finite)")]
    InvalidScaleFactor {
        /// The rejected factor.
        factor: f64,
    },

    /// Two LoadSets are not structurally aligned for comparison.
    #[error("Incompatible LoadSets: {message}")]
    IncompatibleLoadSets {
        /// Which names diverge.
        message: String,
    },

    /// Load cases of a single LoadSet reference different point names.
    #[error("Inconsistent point set in load case '{load_case}': {message}")]
    InconsistentPointSet {
        /// Load case whose points diverge from the first case.
        load_case: String,
        /// Which names diverge.
        message: String,
    },

    /// An operation needs a LoadSet but none is loaded.
    #[error("{}", NO_LOADSET_MESSAGE)]
    NoLoadSetLoaded,

    /// A comparison was requested without a second LoadSet.
    #[error("{}", NO_PREVIOUS_MESSAGE)]
    NoPreviousLoadSet,

    /// A comparison result was requested before any comparison ran.
    #[error("{}", NO_COMPARISON_MESSAGE)]
    NoComparison,

    /// Writing export decks failed partway.
    #[error("Export failed writing {path}")]
    ExportIoFailure {
        /// File or folder being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to read a file that exists.
    #[error("Failed to read file: {path}")]
    FileRead {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to write a JSON or CSV file.
    #[error("Failed to write file: {path}")]
    FileWrite {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    /// Creates a malformed input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    /// Creates an unrecognized unit error.
    pub fn unrecognized_unit(unit: impl Into<String>) -> Self {
        Self::UnrecognizedUnit { unit: unit.into() }
    }

    /// Creates an incompatible LoadSets error.
    pub fn incompatible(message: impl Into<String>) -> Self {
        Self::IncompatibleLoadSets {
            message: message.into(),
        }
    }

    /// Creates an inconsistent point set error.
    pub fn inconsistent_points(load_case: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InconsistentPointSet {
            load_case: load_case.into(),
            message: message.into(),
        }
    }

    /// Creates an export I/O error.
    pub fn export_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ExportIoFailure {
            path: path.into(),
            source,
        }
    }

    /// Creates a file read error, mapping `NotFound` to [`LoadError::FileNotFound`].
    pub fn file_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::FileRead { path, source }
        }
    }

    /// Creates a file write error.
    pub fn file_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Short, stable code for programmatic handling.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "FILE_NOT_FOUND",
            Self::MalformedInput { .. } => "MALFORMED_INPUT",
            Self::UnrecognizedUnit { .. } => "UNRECOGNIZED_UNIT",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::InvalidScaleFactor { .. } => "INVALID_SCALE_FACTOR",
            Self::IncompatibleLoadSets { .. } => "INCOMPATIBLE_LOADSETS",
            Self::InconsistentPointSet { .. } => "INCONSISTENT_POINT_SET",
            Self::NoLoadSetLoaded => "NO_LOADSET_LOADED",
            Self::NoPreviousLoadSet => "NO_PREVIOUS_LOADSET",
            Self::NoComparison => "NO_COMPARISON",
            Self::ExportIoFailure { .. } => "EXPORT_IO_FAILURE",
            Self::FileRead { .. } => "FILE_READ",
            Self::FileWrite { .. } => "FILE_WRITE",
        }
    }
}
