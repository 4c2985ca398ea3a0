//! Robust (percentile) Hausdorff distance between two binary masks.
//!
//! Surfaces are extracted with 6-connected erosion, distances measured with an
//! exact Euclidean distance transform in voxel-spacing units, and the two
//! directed surface-distance sets pooled before taking the percentile.

use brats_eval_util::{
    ensure_same_shape, euclidean_distance_transform, surface, BinaryMask, VoxelGrid, VoxelSpacing,
};
use burn::{prelude::*, tensor::backend::Backend};

use crate::error::{MetricError, MetricResult};

#[derive(Config, Debug)]
pub struct HausdorffConfig {
    /// Percentile of the pooled surface distances, in `(0, 100]`.
    #[config(default = 95.0)]
    pub percentile: f64,
}

impl HausdorffConfig {
    /// # Errors
    ///
    /// Returns an error if the percentile is outside `(0, 100]`.
    pub fn init(&self) -> MetricResult<HausdorffDistance> {
        if !(self.percentile > 0.0 && self.percentile <= 100.0) {
            return Err(MetricError::InvalidConfiguration {
                reason: format!(
                    "Hausdorff percentile must be in (0, 100], got {}",
                    self.percentile
                ),
            });
        }
        Ok(HausdorffDistance {
            percentile: self.percentile,
        })
    }
}

/// Percentile Hausdorff distance (HD95 by default).
#[derive(Debug, Clone, Copy)]
pub struct HausdorffDistance {
    percentile: f64,
}

impl Default for HausdorffDistance {
    fn default() -> Self {
        Self { percentile: 95.0 }
    }
}

impl HausdorffDistance {
    pub const fn percentile(&self) -> f64 {
        self.percentile
    }

    /// Distance between the foreground surfaces of `prediction` and `truth`.
    ///
    /// Returns `Ok(None)` when either mask is empty, since the distance to an
    /// empty set is undefined.
    ///
    /// # Errors
    ///
    /// Returns an error if the masks have different shapes.
    pub fn compute<B: Backend>(
        &self,
        prediction: &BinaryMask<B>,
        truth: &BinaryMask<B>,
        spacing: VoxelSpacing,
    ) -> MetricResult<Option<f64>> {
        ensure_same_shape("prediction", prediction.dims(), "ground truth", truth.dims())?;
        Ok(self.compute_grids(&prediction.to_grid(), &truth.to_grid(), spacing))
    }

    /// Host-side variant of [`Self::compute`] for grids of equal shape.
    pub fn compute_grids(
        &self,
        prediction: &VoxelGrid,
        truth: &VoxelGrid,
        spacing: VoxelSpacing,
    ) -> Option<f64> {
        let distances = pooled_surface_distances(prediction, truth, spacing)?;
        nearest_rank_percentile(distances, self.percentile)
    }
}

/// Directed surface distances `a -> b` followed by `b -> a`.
///
/// `None` when either grid has no foreground voxel.
pub fn pooled_surface_distances(
    a: &VoxelGrid,
    b: &VoxelGrid,
    spacing: VoxelSpacing,
) -> Option<Vec<f64>> {
    let a_surface = surface(a);
    let b_surface = surface(b);
    if a_surface.foreground_count() == 0 || b_surface.foreground_count() == 0 {
        return None;
    }

    let to_b = euclidean_distance_transform(&b_surface, spacing);
    let to_a = euclidean_distance_transform(&a_surface, spacing);

    let mut distances: Vec<f64> = a_surface.foreground_indices().map(|i| to_b[i]).collect();
    distances.extend(b_surface.foreground_indices().map(|i| to_a[i]));
    Some(distances)
}

/// Nearest-rank percentile: the `ceil(p / 100 * n)`-th smallest value.
pub fn nearest_rank_percentile(mut values: Vec<f64>, percentile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(f64::total_cmp);
    let n = values.len();
    let rank = (percentile / 100.0 * n as f64).ceil() as usize;
    Some(values[rank.clamp(1, n) - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::TestBackend;

    fn mask(dims: [usize; 3], points: &[[usize; 3]]) -> BinaryMask<TestBackend> {
        let device = Default::default();
        let grid = VoxelGrid::from_points(dims, points);
        BinaryMask::from_values(grid.voxels().to_vec(), dims, &device).unwrap()
    }

    #[test]
    fn identical_masks_have_zero_distance() {
        let points = [[1, 1, 1], [1, 2, 1], [2, 1, 1], [2, 2, 2]];
        let a = mask([4, 4, 4], &points);
        let b = mask([4, 4, 4], &points);

        let hd = HausdorffDistance::default()
            .compute(&a, &b, VoxelSpacing::UNIT)
            .unwrap();
        assert_eq!(hd, Some(0.0));
    }

    #[test]
    fn single_extra_voxel_yields_its_distance() {
        let prediction = mask([5, 5, 8], &[[2, 2, 2]]);
        let truth = mask([5, 5, 8], &[[2, 2, 2], [2, 2, 5]]);

        let hd = HausdorffDistance::default()
            .compute(&prediction, &truth, VoxelSpacing::UNIT)
            .unwrap();
        assert_eq!(hd, Some(3.0));
    }

    #[test]
    fn displaced_voxel_distance_is_euclidean() {
        let prediction = mask([6, 6, 6], &[[0, 0, 0]]);
        let truth = mask([6, 6, 6], &[[3, 4, 0]]);

        let hd = HausdorffDistance::default()
            .compute(&prediction, &truth, VoxelSpacing::UNIT)
            .unwrap();
        assert_eq!(hd, Some(5.0));
    }

    #[test]
    fn spacing_scales_distances() {
        let prediction = mask([4, 4, 4], &[[0, 0, 0]]);
        let truth = mask([4, 4, 4], &[[0, 0, 2]]);

        let hd = HausdorffDistance::default()
            .compute(&prediction, &truth, VoxelSpacing([1.0, 1.0, 2.5]))
            .unwrap();
        assert_eq!(hd, Some(5.0));
    }

    #[test]
    fn empty_mask_gives_undefined_distance() {
        let prediction = mask([3, 3, 3], &[]);
        let truth = mask([3, 3, 3], &[[1, 1, 1]]);

        let hd = HausdorffDistance::default()
            .compute(&prediction, &truth, VoxelSpacing::UNIT)
            .unwrap();
        assert_eq!(hd, None);
    }

    #[test]
    fn percentile_discards_outliers() {
        // 40 coincident surface voxels and one far outlier: the outlier is
        // above the 95th percentile of the 81 pooled distances.
        let mut shared = Vec::new();
        for y in 0..8 {
            for z in 0..5 {
                shared.push([0, y, z]);
            }
        }
        let prediction = VoxelGrid::from_points([20, 8, 5], &shared);
        let mut with_outlier = shared.clone();
        with_outlier.push([19, 0, 0]);
        let truth = VoxelGrid::from_points([20, 8, 5], &with_outlier);

        let hd95 = HausdorffDistance::default().compute_grids(&prediction, &truth, VoxelSpacing::UNIT);
        let hd100 = HausdorffConfig::new()
            .with_percentile(100.0)
            .init()
            .unwrap()
            .compute_grids(&prediction, &truth, VoxelSpacing::UNIT);

        assert_eq!(hd95, Some(0.0));
        assert_eq!(hd100, Some(19.0));
    }

    #[test]
    fn nearest_rank_percentile_picks_ranked_value() {
        let values = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(nearest_rank_percentile(values.clone(), 95.0), Some(5.0));
        assert_eq!(nearest_rank_percentile(values.clone(), 50.0), Some(3.0));
        assert_eq!(nearest_rank_percentile(values, 1.0), Some(1.0));
        assert_eq!(nearest_rank_percentile(Vec::new(), 95.0), None);
    }

    #[test]
    fn invalid_percentile_is_rejected() {
        assert!(HausdorffConfig::new().with_percentile(0.0).init().is_err());
        assert!(HausdorffConfig::new().with_percentile(120.0).init().is_err());
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let a = mask([2, 2, 2], &[[0, 0, 0]]);
        let b = mask([2, 2, 3], &[[0, 0, 0]]);

        assert!(HausdorffDistance::default()
            .compute(&a, &b, VoxelSpacing::UNIT)
            .is_err());
    }
}
