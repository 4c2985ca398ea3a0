//! Error types for metric computation.

use brats_eval_util::VolumeError;
use thiserror::Error;

/// Error type for metric computation.
#[derive(Error, Debug)]
pub enum MetricError {
    /// Error when the compared masks do not share one shape.
    #[error(transparent)]
    Volume(#[from] VolumeError),

    /// Error when a metric is configured with an out-of-range parameter.
    #[error("Invalid metric configuration: {reason}")]
    InvalidConfiguration {
        /// Why the configuration was rejected.
        reason: String,
    },
}

/// A specialized `Result` type for metric computation.
pub type MetricResult<T> = Result<T, MetricError>;
