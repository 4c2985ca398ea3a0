//! Volume utilities for BraTS segmentation evaluation.
//!
//! - [`volume`]: 3D intensity and label volumes, voxel spacing, NIfTI loading
//! - [`mask`]: binary masks on the tensor backend and their host-side grids
//! - [`morphology`]: 6-connected erosion and object surfaces
//! - [`distance`]: exact Euclidean distance transform

pub mod distance;
pub mod error;
pub mod mask;
pub mod morphology;
pub mod volume;

pub use distance::euclidean_distance_transform;
pub use error::{VolumeError, VolumeResult};
pub use mask::{count_true, BinaryMask, VoxelGrid};
pub use morphology::{erosion, surface};
pub use volume::{
    ensure_same_shape, spatial_dims, LabelVolume, NiftiVolumeSource, Volume, VolumeSource,
    VoxelSpacing,
};
