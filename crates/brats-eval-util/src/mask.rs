//! Binary voxel masks.
//!
//! [`BinaryMask`] keeps a mask on the tensor backend for element-wise work.
//! [`VoxelGrid`] is its host-side copy, used by geometric operations that walk
//! voxel neighbourhoods.

use burn::{
    prelude::*,
    tensor::{backend::Backend, cast::ToElement, TensorData},
};

use crate::error::{VolumeError, VolumeResult};

/// A 3D binary mask: `true` marks a foreground voxel.
#[derive(Debug, Clone)]
pub struct BinaryMask<B: Backend> {
    mask: Tensor<B, 3, Bool>,
}

impl<B: Backend> BinaryMask<B> {
    pub const fn new(mask: Tensor<B, 3, Bool>) -> Self {
        Self { mask }
    }

    /// Builds a mask from row-major voxel flags.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::DataLength`] if `values` does not match `dims`.
    pub fn from_values(
        values: Vec<bool>,
        dims: [usize; 3],
        device: &B::Device,
    ) -> VolumeResult<Self> {
        if dims.iter().product::<usize>() != values.len() {
            return Err(VolumeError::DataLength {
                dims,
                actual: values.len(),
            });
        }
        let mask = Tensor::<B, 3, Bool>::from_data(TensorData::new(values, dims), device);
        Ok(Self::new(mask))
    }

    pub fn dims(&self) -> [usize; 3] {
        self.mask.dims()
    }

    pub const fn tensor(&self) -> &Tensor<B, 3, Bool> {
        &self.mask
    }

    /// Number of foreground voxels.
    pub fn foreground_count(&self) -> u64 {
        count_true(self.mask.clone())
    }

    /// Whether the mask contains no foreground voxel at all.
    ///
    /// This is the single degenerate-case predicate shared by label mapping,
    /// metric computation and the orchestrator.
    pub fn is_all_background(&self) -> bool {
        self.foreground_count() == 0
    }

    /// Copies the mask to the host.
    pub fn to_grid(&self) -> VoxelGrid {
        let dims = self.dims();
        let voxels = self
            .mask
            .clone()
            .int()
            .into_data()
            .iter::<i64>()
            .map(|value| value != 0)
            .collect();
        VoxelGrid { dims, voxels }
    }
}

/// Counts the `true` elements of a boolean tensor.
pub fn count_true<B: Backend, const D: usize>(tensor: Tensor<B, D, Bool>) -> u64 {
    let count = tensor.int().sum().into_scalar().to_i64();
    u64::try_from(count).unwrap_or_default()
}

/// Host-side binary volume in row-major `[x, y, z]` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    dims: [usize; 3],
    voxels: Vec<bool>,
}

impl VoxelGrid {
    /// Creates an all-background grid.
    pub fn empty(dims: [usize; 3]) -> Self {
        Self {
            dims,
            voxels: vec![false; dims.iter().product()],
        }
    }

    /// Creates a grid whose foreground is the given voxel coordinates.
    ///
    /// Coordinates outside the grid are ignored.
    pub fn from_points(dims: [usize; 3], points: &[[usize; 3]]) -> Self {
        let mut grid = Self::empty(dims);
        for &point in points {
            if point.iter().zip(dims.iter()).all(|(p, d)| p < d) {
                let index = grid.index(point);
                grid.voxels[index] = true;
            }
        }
        grid
    }

    pub const fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn voxels(&self) -> &[bool] {
        &self.voxels
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Linear index of a voxel coordinate.
    pub const fn index(&self, [x, y, z]: [usize; 3]) -> usize {
        (x * self.dims[1] + y) * self.dims[2] + z
    }

    /// Voxel coordinate of a linear index.
    pub const fn coords(&self, index: usize) -> [usize; 3] {
        let z = index % self.dims[2];
        let y = (index / self.dims[2]) % self.dims[1];
        let x = index / (self.dims[1] * self.dims[2]);
        [x, y, z]
    }

    pub fn get(&self, coords: [usize; 3]) -> bool {
        self.voxels[self.index(coords)]
    }

    pub fn set(&mut self, coords: [usize; 3], value: bool) {
        let index = self.index(coords);
        self.voxels[index] = value;
    }

    /// Linear indices of all foreground voxels.
    pub fn foreground_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.voxels
            .iter()
            .enumerate()
            .filter_map(|(index, &value)| value.then_some(index))
    }

    pub fn foreground_count(&self) -> usize {
        self.voxels.iter().filter(|&&value| value).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::TestBackend;

    #[test]
    fn empty_mask_is_all_background() {
        let device = Default::default();
        let mask = BinaryMask::<TestBackend>::from_values(vec![false; 8], [2, 2, 2], &device)
            .unwrap();

        assert!(mask.is_all_background());
        assert_eq!(mask.foreground_count(), 0);
    }

    #[test]
    fn single_voxel_mask_is_not_background() {
        let device = Default::default();
        let mut values = vec![false; 27];
        values[13] = true;
        let mask = BinaryMask::<TestBackend>::from_values(values, [3, 3, 3], &device).unwrap();

        assert!(!mask.is_all_background());
        assert_eq!(mask.foreground_count(), 1);
    }

    #[test]
    fn to_grid_preserves_voxel_positions() {
        let device = Default::default();
        let mut values = vec![false; 24];
        // [1, 2, 3] in a 2x3x4 grid.
        values[23] = true;
        let mask = BinaryMask::<TestBackend>::from_values(values, [2, 3, 4], &device).unwrap();

        let grid = mask.to_grid();
        assert_eq!(grid.dims(), [2, 3, 4]);
        assert!(grid.get([1, 2, 3]));
        assert_eq!(grid.foreground_count(), 1);
    }

    #[test]
    fn index_and_coords_are_inverse() {
        let grid = VoxelGrid::empty([3, 4, 5]);
        for index in 0..grid.len() {
            assert_eq!(grid.index(grid.coords(index)), index);
        }
    }

    #[test]
    fn from_points_ignores_out_of_range_points() {
        let grid = VoxelGrid::from_points([2, 2, 2], &[[0, 0, 0], [2, 0, 0], [1, 1, 1]]);
        assert_eq!(grid.foreground_indices().collect::<Vec<_>>(), vec![0, 7]);
    }
}
