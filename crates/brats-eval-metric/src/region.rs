//! Per-region metric evaluation.

use std::fmt;

use brats_eval_util::{BinaryMask, VoxelSpacing};
use burn::tensor::backend::Backend;

use crate::{
    confusion::ConfusionMatrix, error::MetricResult, hausdorff::HausdorffDistance,
    labels::TumorRegion,
};

/// Scalar metrics reported for a tumor region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Dice,
    Hausdorff,
    Recall,
    Precision,
    F1,
    Accuracy,
}

impl MetricKind {
    /// Metrics of the standard report, in column order.
    pub const REPORTED: [Self; 5] = [
        Self::Dice,
        Self::Hausdorff,
        Self::Recall,
        Self::Precision,
        Self::F1,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dice => "Dice",
            Self::Hausdorff => "HD",
            Self::Recall => "Recall",
            Self::Precision => "Precision",
            Self::F1 => "F1",
            Self::Accuracy => "Accuracy",
        }
    }

    /// Report column name, e.g. `Dice WT`.
    pub fn column(self, region: TumorRegion) -> String {
        format!("{} {}", self.label(), region.abbreviation())
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metrics of one region of one case. `None` marks an undefined value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMetrics {
    pub region: TumorRegion,
    pub dice: Option<f64>,
    pub hausdorff: Option<f64>,
    pub recall: Option<f64>,
    pub precision: Option<f64>,
    pub f1: Option<f64>,
    pub accuracy: Option<f64>,
    pub confusion: ConfusionMatrix,
    /// Both prediction and ground truth were entirely background.
    pub tumor_free: bool,
}

impl RegionMetrics {
    /// Evaluates one region.
    ///
    /// When prediction and ground truth are both entirely background, Dice is
    /// 1.0 and Hausdorff 0.0 by convention; the other metrics follow their
    /// count definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the masks do not share one shape.
    pub fn evaluate<B: Backend>(
        region: TumorRegion,
        prediction: &BinaryMask<B>,
        truth: &BinaryMask<B>,
        roi: &BinaryMask<B>,
        hausdorff: &HausdorffDistance,
        spacing: VoxelSpacing,
    ) -> MetricResult<Self> {
        let confusion = ConfusionMatrix::build(prediction, truth, roi)?;
        // Whole volumes, not only the ROI.
        let tumor_free = prediction.is_all_background() && truth.is_all_background();

        let (dice, hd) = if tumor_free {
            tracing::debug!(%region, "no tumor for this region, using perfect-match convention");
            (Some(1.0), Some(0.0))
        } else {
            (
                confusion.dice(),
                hausdorff.compute(prediction, truth, spacing)?,
            )
        };

        tracing::debug!(
            %region,
            tp = confusion.true_positives,
            fp = confusion.false_positives,
            tn = confusion.true_negatives,
            fn_ = confusion.false_negatives,
            "confusion matrix",
        );

        Ok(Self {
            region,
            dice,
            hausdorff: hd,
            recall: confusion.recall(),
            precision: confusion.precision(),
            f1: confusion.f1(),
            accuracy: confusion.accuracy(),
            confusion,
            tumor_free,
        })
    }

    pub const fn value(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::Dice => self.dice,
            MetricKind::Hausdorff => self.hausdorff,
            MetricKind::Recall => self.recall,
            MetricKind::Precision => self.precision,
            MetricKind::F1 => self.f1,
            MetricKind::Accuracy => self.accuracy,
        }
    }
}
