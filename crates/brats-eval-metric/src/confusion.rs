//! Voxel-wise confusion matrix restricted to a region of interest.

use brats_eval_util::{count_true, ensure_same_shape, BinaryMask};
use burn::tensor::backend::Backend;
use derive_new::new;

use crate::error::MetricResult;

/// True/false positive/negative voxel counts inside the ROI.
///
/// The four counts always sum to the number of ROI voxels; voxels outside the
/// ROI are not counted at all, not even as true negatives.
#[derive(new, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positives: u64,
    pub false_positives: u64,
    pub true_negatives: u64,
    pub false_negatives: u64,
}

impl ConfusionMatrix {
    /// Counts prediction/ground-truth agreement over the voxels where `roi` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the three masks do not share one shape.
    pub fn build<B: Backend>(
        prediction: &BinaryMask<B>,
        truth: &BinaryMask<B>,
        roi: &BinaryMask<B>,
    ) -> MetricResult<Self> {
        ensure_same_shape("prediction", prediction.dims(), "ground truth", truth.dims())?;
        ensure_same_shape("prediction", prediction.dims(), "ROI", roi.dims())?;

        let pred = prediction.tensor().clone();
        let gt = truth.tensor().clone();
        let roi = roi.tensor().clone();

        let predicted_in_roi = pred.clone().bool_and(roi.clone());
        let unpredicted_in_roi = pred.bool_not().bool_and(roi);

        Ok(Self {
            true_positives: count_true(predicted_in_roi.clone().bool_and(gt.clone())),
            false_positives: count_true(predicted_in_roi.bool_and(gt.clone().bool_not())),
            true_negatives: count_true(unpredicted_in_roi.clone().bool_and(gt.clone().bool_not())),
            false_negatives: count_true(unpredicted_in_roi.bool_and(gt)),
        })
    }

    /// Number of ROI voxels described by this matrix.
    pub const fn total(&self) -> u64 {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    /// `tp / (tp + fn)`, undefined without ground-truth positives.
    pub fn recall(&self) -> Option<f64> {
        ratio(
            self.true_positives,
            self.true_positives + self.false_negatives,
        )
    }

    /// `tp / (tp + fp)`, undefined without predicted positives.
    pub fn precision(&self) -> Option<f64> {
        ratio(
            self.true_positives,
            self.true_positives + self.false_positives,
        )
    }

    /// `(tp + tn) / total`, undefined for an empty ROI.
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// `2tp / (2tp + fp + fn)`, undefined when every count but `tn` is zero.
    ///
    /// This is the raw overlap; the all-background convention is applied by
    /// [`RegionMetrics`](crate::RegionMetrics).
    pub fn dice(&self) -> Option<f64> {
        ratio(
            2 * self.true_positives,
            2 * self.true_positives + self.false_positives + self.false_negatives,
        )
    }

    /// F1 score. For binary voxel sets it coincides with [`Self::dice`] and is
    /// computed from the same counts, so both values are bit-identical.
    pub fn f1(&self) -> Option<f64> {
        self.dice()
    }
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::TestBackend;

    fn mask(values: &[u8], dims: [usize; 3]) -> BinaryMask<TestBackend> {
        let device = Default::default();
        BinaryMask::from_values(values.iter().map(|&v| v != 0).collect(), dims, &device).unwrap()
    }

    #[test]
    fn counts_are_restricted_to_roi() {
        let pred = mask(&[1, 1, 0, 0, 1, 0, 1, 0], [2, 2, 2]);
        let truth = mask(&[1, 0, 1, 0, 1, 1, 0, 0], [2, 2, 2]);
        let roi = mask(&[1, 1, 1, 1, 0, 0, 1, 1], [2, 2, 2]);

        let matrix = ConfusionMatrix::build(&pred, &truth, &roi).unwrap();

        assert_eq!(matrix, ConfusionMatrix::new(1, 2, 2, 1));
        assert_eq!(matrix.total(), roi.foreground_count());
    }

    #[test]
    fn counts_sum_to_roi_size() {
        let dims = [3, 4, 5];
        let n = 60;
        let pred: Vec<u8> = (0..n).map(|i| u8::from(i % 3 == 0)).collect();
        let truth: Vec<u8> = (0..n).map(|i| u8::from(i % 4 < 2)).collect();
        let roi: Vec<u8> = (0..n).map(|i| u8::from(i % 7 != 0)).collect();
        let roi = mask(&roi, dims);

        let matrix = ConfusionMatrix::build(&mask(&pred, dims), &mask(&truth, dims), &roi).unwrap();

        assert_eq!(matrix.total(), roi.foreground_count());
    }

    #[test]
    fn empty_roi_counts_nothing() {
        let pred = mask(&[1, 1, 1, 1], [1, 2, 2]);
        let truth = mask(&[1, 0, 1, 0], [1, 2, 2]);
        let roi = mask(&[0, 0, 0, 0], [1, 2, 2]);

        let matrix = ConfusionMatrix::build(&pred, &truth, &roi).unwrap();

        assert_eq!(matrix, ConfusionMatrix::default());
        assert_eq!(matrix.accuracy(), None);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let pred = mask(&[1, 0, 0, 0], [1, 2, 2]);
        let truth = mask(&[1, 0, 0, 0, 0, 0, 0, 0], [2, 2, 2]);

        assert!(ConfusionMatrix::build(&pred, &truth, &pred).is_err());
    }

    #[test]
    fn ratio_metrics_match_reference_counts() {
        let matrix = ConfusionMatrix::new(3, 1, 10, 1);

        assert_eq!(matrix.recall(), Some(0.75));
        assert_eq!(matrix.precision(), Some(0.75));
        assert!((matrix.accuracy().unwrap() - 13.0 / 15.0).abs() < 1e-12);
        assert_eq!(matrix.dice(), Some(0.75));
        assert_eq!(matrix.f1(), matrix.dice());
    }

    #[test]
    fn zero_denominators_are_undefined() {
        let matrix = ConfusionMatrix::new(0, 0, 5, 0);

        assert_eq!(matrix.recall(), None);
        assert_eq!(matrix.precision(), None);
        assert_eq!(matrix.dice(), None);
        assert_eq!(matrix.f1(), None);
        assert_eq!(matrix.accuracy(), Some(1.0));
    }

    #[test]
    fn missed_tumor_has_zero_recall_and_undefined_precision() {
        let matrix = ConfusionMatrix::new(0, 0, 20, 4);

        assert_eq!(matrix.recall(), Some(0.0));
        assert_eq!(matrix.precision(), None);
        assert_eq!(matrix.dice(), Some(0.0));
    }
}
