//! # Merge Error Types Module
//!
//! Fatal, run-level failures. Per-row anomalies (bad numbers, missing
//! weights, names that match nothing) are absorbed where they occur and
//! never show up here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a merge run
#[derive(Debug, Error)]
pub enum MergeError {
    /// Source dataset does not exist
    #[error("Dataset not found: {}", .0.display())]
    DatasetMissing(PathBuf),
    /// Source dataset exists but could not be read or parsed
    #[error("Dataset unreadable: {path}: {source}")]
    DatasetUnreadable {
        path: String,
        #[source]
        source: csv::Error,
    },
    /// A column the run cannot do without is absent from the header row
    #[error("Required column '{column}' missing from {dataset}")]
    MissingColumn {
        dataset: &'static str,
        column: String,
    },
    /// Configuration rejected by validation
    #[error("Configuration error: {0}")]
    Config(String),
    /// Merged output could not be written
    #[error("Output error: {0}")]
    Output(String),
}

impl From<regex::Error> for MergeError {
    fn from(err: regex::Error) -> Self {
        MergeError::Config(format!("invalid pattern: {err}"))
    }
}
