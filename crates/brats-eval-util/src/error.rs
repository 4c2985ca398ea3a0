//! Error types for volume loading and voxel-level operations.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for volume operations.
///
/// Covers reading volumes from disk, validating their rank, and checking that
/// volumes compared in a single evaluation share the same shape.
#[derive(Error, Debug)]
pub enum VolumeError {
    /// Error when a NIfTI file cannot be read or decoded.
    #[error("Failed to read volume: {path}")]
    ReadFailed {
        /// The volume file that failed to read.
        path: PathBuf,
        /// The underlying NIfTI error.
        #[source]
        source: nifti::NiftiError,
    },

    /// Error when a volume does not have three spatial dimensions.
    #[error("Volume {path} has shape {shape:?}, expected three spatial dimensions")]
    UnsupportedShape {
        /// The offending volume file.
        path: PathBuf,
        /// The shape that was found.
        shape: Vec<usize>,
    },

    /// Error when the number of voxel values does not match the declared shape.
    #[error("Voxel data of length {actual} does not fit shape {dims:?}")]
    DataLength {
        /// The declared shape.
        dims: [usize; 3],
        /// The number of values provided.
        actual: usize,
    },

    /// Error when two volumes that must be compared have different shapes.
    #[error("Shape mismatch: {left} has shape {left_dims:?} but {right} has shape {right_dims:?}")]
    ShapeMismatch {
        /// Name of the first volume.
        left: String,
        /// Shape of the first volume.
        left_dims: [usize; 3],
        /// Name of the second volume.
        right: String,
        /// Shape of the second volume.
        right_dims: [usize; 3],
    },
}

/// A specialized `Result` type for volume operations.
pub type VolumeResult<T> = Result<T, VolumeError>;
