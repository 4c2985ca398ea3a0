//! Volume data model and loading.
//!
//! A [`Volume`] is an immutable 3D scan or label map held in a `burn` tensor
//! together with its voxel spacing. Volumes are produced by a [`VolumeSource`];
//! [`NiftiVolumeSource`] reads them from `.nii` / `.nii.gz` files.

use std::path::Path;

use burn::{
    prelude::*,
    tensor::{backend::Backend, TensorData},
};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::{
    error::{VolumeError, VolumeResult},
    mask::BinaryMask,
};

/// Physical size of a voxel along each axis, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelSpacing(pub [f64; 3]);

impl VoxelSpacing {
    /// Unit spacing: distances are measured in voxels.
    pub const UNIT: Self = Self([1.0, 1.0, 1.0]);

    /// Builds a spacing from a NIfTI `pixdim` field.
    ///
    /// Non-positive or non-finite entries fall back to 1.0.
    pub fn from_pixdim(pixdim: &[f32; 8]) -> Self {
        let axis = |value: f32| {
            let value = f64::from(value);
            if value.is_finite() && value > 0.0 {
                value
            } else {
                1.0
            }
        };
        Self([axis(pixdim[1]), axis(pixdim[2]), axis(pixdim[3])])
    }

    /// Spacing along `axis` (0, 1 or 2).
    pub const fn axis(&self, axis: usize) -> f64 {
        self.0[axis]
    }
}

impl Default for VoxelSpacing {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Checks that two volumes share the same shape.
///
/// # Errors
///
/// Returns [`VolumeError::ShapeMismatch`] naming both volumes when the shapes differ.
pub fn ensure_same_shape(
    left: &str,
    left_dims: [usize; 3],
    right: &str,
    right_dims: [usize; 3],
) -> VolumeResult<()> {
    if left_dims == right_dims {
        Ok(())
    } else {
        Err(VolumeError::ShapeMismatch {
            left: left.to_owned(),
            left_dims,
            right: right.to_owned(),
            right_dims,
        })
    }
}

/// A 3D intensity volume.
#[derive(Debug, Clone)]
pub struct Volume<B: Backend> {
    data: Tensor<B, 3>,
    spacing: VoxelSpacing,
}

impl<B: Backend> Volume<B> {
    pub const fn new(data: Tensor<B, 3>, spacing: VoxelSpacing) -> Self {
        Self { data, spacing }
    }

    /// Builds a volume from row-major voxel values.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::DataLength`] if `values` does not hold exactly
    /// `dims[0] * dims[1] * dims[2]` elements.
    pub fn from_values(
        values: Vec<f32>,
        dims: [usize; 3],
        spacing: VoxelSpacing,
        device: &B::Device,
    ) -> VolumeResult<Self> {
        check_length(dims, values.len())?;
        let data = Tensor::<B, 3>::from_data(TensorData::new(values, dims), device);
        Ok(Self::new(data, spacing))
    }

    pub fn dims(&self) -> [usize; 3] {
        self.data.dims()
    }

    pub const fn spacing(&self) -> VoxelSpacing {
        self.spacing
    }

    pub const fn tensor(&self) -> &Tensor<B, 3> {
        &self.data
    }

    /// Voxels with non-zero intensity.
    ///
    /// Applied to a skull-stripped structural scan this yields the brain
    /// region of interest.
    pub fn nonzero_mask(&self) -> BinaryMask<B> {
        BinaryMask::new(self.data.clone().not_equal_elem(0.0))
    }

    /// Interprets the voxel values as integer labels.
    pub fn into_labels(self) -> LabelVolume<B> {
        LabelVolume::new(self.data.round().int(), self.spacing)
    }
}

/// A 3D volume of integer segmentation labels.
#[derive(Debug, Clone)]
pub struct LabelVolume<B: Backend> {
    labels: Tensor<B, 3, Int>,
    spacing: VoxelSpacing,
}

impl<B: Backend> LabelVolume<B> {
    pub const fn new(labels: Tensor<B, 3, Int>, spacing: VoxelSpacing) -> Self {
        Self { labels, spacing }
    }

    /// Builds a label volume from row-major label values.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::DataLength`] if `values` does not match `dims`.
    pub fn from_values(
        values: Vec<i64>,
        dims: [usize; 3],
        device: &B::Device,
    ) -> VolumeResult<Self> {
        check_length(dims, values.len())?;
        let labels = Tensor::<B, 3, Int>::from_data(TensorData::new(values, dims), device);
        Ok(Self::new(labels, VoxelSpacing::UNIT))
    }

    pub fn dims(&self) -> [usize; 3] {
        self.labels.dims()
    }

    pub const fn spacing(&self) -> VoxelSpacing {
        self.spacing
    }

    pub const fn tensor(&self) -> &Tensor<B, 3, Int> {
        &self.labels
    }

    /// Replaces every occurrence of `from` with `to`.
    pub fn relabel(self, from: i64, to: i64) -> Self {
        let hits = self.labels.clone().equal_elem(from);
        Self::new(self.labels.mask_fill(hits, to), self.spacing)
    }
}

/// A provider of volumes addressed by path.
///
/// The orchestrator only talks to this trait, so cases can be evaluated from
/// files on disk or from volumes already held in memory.
pub trait VolumeSource<B: Backend> {
    /// Whether a volume exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Loads the volume at `path` onto `device`.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume cannot be read or is not three-dimensional.
    fn load(&self, path: &Path, device: &B::Device) -> VolumeResult<Volume<B>>;
}

/// Reads volumes from NIfTI-1 files (optionally gzip-compressed).
#[derive(Debug, Clone, Copy, Default)]
pub struct NiftiVolumeSource;

impl<B: Backend> VolumeSource<B> for NiftiVolumeSource {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn load(&self, path: &Path, device: &B::Device) -> VolumeResult<Volume<B>> {
        let read_failed = |source| VolumeError::ReadFailed {
            path: path.to_path_buf(),
            source,
        };

        let object = ReaderOptions::new().read_file(path).map_err(read_failed)?;
        let spacing = VoxelSpacing::from_pixdim(&object.header().pixdim);
        let array = object
            .into_volume()
            .into_ndarray::<f32>()
            .map_err(read_failed)?;

        let dims = spatial_dims(array.shape()).ok_or_else(|| VolumeError::UnsupportedShape {
            path: path.to_path_buf(),
            shape: array.shape().to_vec(),
        })?;
        // Logical iteration order is row-major over [x, y, z], matching `TensorData`.
        let values: Vec<f32> = array.iter().copied().collect();

        tracing::debug!(path = %path.display(), ?dims, ?spacing, "loaded volume");
        Volume::from_values(values, dims, spacing, device)
    }
}

/// Reduces a volume shape to three spatial dimensions.
///
/// Trailing singleton dimensions (e.g. a 4D file with one time point) are dropped.
pub fn spatial_dims(shape: &[usize]) -> Option<[usize; 3]> {
    let mut len = shape.len();
    while len > 3 && shape[len - 1] == 1 {
        len -= 1;
    }
    match shape[..len] {
        [x, y, z] => Some([x, y, z]),
        _ => None,
    }
}

fn check_length(dims: [usize; 3], actual: usize) -> VolumeResult<()> {
    if dims.iter().product::<usize>() == actual {
        Ok(())
    } else {
        Err(VolumeError::DataLength { dims, actual })
    }
}
