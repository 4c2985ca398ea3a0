//! # BraTS Metrics
//!
//! Evaluation metrics for volumetric brain-tumor segmentation, computed per
//! clinical tumor subregion.
//!
//! ## Pipeline
//!
//! 1. [`RegionMasks`] maps a BraTS label volume to Whole Tumor, Tumor Core and
//!    Enhancing Tumor masks.
//! 2. [`ConfusionMatrix::build`] counts voxel agreement inside the region of
//!    interest (usually the brain).
//! 3. [`RegionMetrics::evaluate`] derives Dice, percentile Hausdorff, recall,
//!    precision, F1 and accuracy, applying the all-background convention.
//!
//! Undefined values (zero denominators, distances to an empty set) are
//! `None`, never NaN.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use brats_eval_metric::{HausdorffDistance, RegionMasks, RegionMetrics, TumorRegion};
//!
//! let truth = RegionMasks::from_labels(&ground_truth_labels);
//! let pred = RegionMasks::from_labels(&prediction_labels);
//! let roi = flair.nonzero_mask();
//!
//! for region in TumorRegion::ALL {
//!     let metrics = RegionMetrics::evaluate(
//!         region,
//!         pred.get(region),
//!         truth.get(region),
//!         &roi,
//!         &HausdorffDistance::default(),
//!         VoxelSpacing::UNIT,
//!     )?;
//!     println!("{region}: dice {:?}", metrics.dice);
//! }
//! ```

pub mod aggregator;
pub mod confusion;
pub mod error;
pub mod hausdorff;
pub mod labels;
pub mod region;

pub use aggregator::{ColumnSummary, MetricsAggregator};
pub use confusion::ConfusionMatrix;
pub use error::{MetricError, MetricResult};
pub use hausdorff::{HausdorffConfig, HausdorffDistance};
pub use labels::{to_brats_encoding, RegionMasks, TumorRegion};
pub use region::{MetricKind, RegionMetrics};

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    pub type TestBackend = NdArray;
}
