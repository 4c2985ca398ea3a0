//! Error types for batch evaluation.

use std::path::PathBuf;

use brats_eval_metric::MetricError;
use brats_eval_util::VolumeError;
use thiserror::Error;

/// Error type for the evaluation orchestrator.
///
/// Configuration, manifest and report errors abort the batch. Volume and
/// metric errors are raised per case and only fail that case.
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// Error when the configuration file cannot be loaded.
    #[error("Failed to load configuration {path}: {reason}")]
    ConfigLoad {
        /// The configuration file.
        path: PathBuf,
        /// The reason reported by the loader.
        reason: String,
    },

    /// Error when the configuration holds an invalid value.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Why the configuration was rejected.
        reason: String,
    },

    /// Error when the manifest file cannot be read.
    #[error("Failed to read manifest: {path}")]
    ManifestRead {
        /// The manifest path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Error when the manifest header lacks a required column.
    #[error("Manifest {origin} has no `{column}` column")]
    MissingColumn {
        /// Where the manifest came from.
        origin: String,
        /// The missing column.
        column: &'static str,
    },

    /// Error when a manifest row cannot be parsed.
    #[error("Manifest {origin}, line {line}: {reason}")]
    MalformedRow {
        /// Where the manifest came from.
        origin: String,
        /// One-based line number.
        line: usize,
        /// What is wrong with the row.
        reason: String,
    },

    /// Error when the report file cannot be created.
    #[error("Failed to create report: {path}")]
    ReportCreate {
        /// The report path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Error when writing the report fails.
    #[error("Failed to write report")]
    ReportWrite(#[source] std::io::Error),

    /// Error when a volume of a case cannot be loaded or compared.
    #[error(transparent)]
    Volume(#[from] VolumeError),

    /// Error when a metric cannot be computed.
    #[error(transparent)]
    Metric(#[from] MetricError),
}

/// A specialized `Result` type for evaluation operations.
pub type EvaluationResult<T> = Result<T, EvaluationError>;
