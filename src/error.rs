//! Error types for loading datasets and writing exports.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a dataset load.
///
/// Individual malformed rows never produce one of these; they are dropped and
/// counted in the [`crate::loader::LoadReport`] instead.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Source file missing or unreadable.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV document could not be read at all (bad header row, broken quoting).
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// JSON or GeoJSON document could not be parsed.
    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required column is absent from a tabular source.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// The document parsed but does not have the expected shape.
    #[error("unexpected document layout in {path}: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    /// A loader thread panicked before reporting a result.
    #[error("loader for {source_name} panicked")]
    WorkerPanicked { source_name: &'static str },
}

/// Errors raised while writing an export artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write CSV export: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write JSON export: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LoadError>;
