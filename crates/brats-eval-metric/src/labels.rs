//! BraTS label conventions and tumor-region masks.
//!
//! Segmentations use the BraTS label set:
//!
//! | Label | Meaning |
//! |---|---|
//! | 0 | background |
//! | 1 | necrotic / non-enhancing tumor core |
//! | 2 | peritumoral edema |
//! | 4 | enhancing tumor |
//!
//! Label 3 is unused. Models trained on contiguous labels emit 3 for enhancing
//! tumor; [`to_brats_encoding`] restores the BraTS convention.

use std::fmt;

use brats_eval_util::{BinaryMask, LabelVolume};
use burn::tensor::backend::Backend;

pub const BACKGROUND: i64 = 0;
pub const NECROTIC_CORE: i64 = 1;
pub const EDEMA: i64 = 2;
pub const ENHANCING_TUMOR: i64 = 4;
/// Enhancing tumor in the contiguous encoding.
pub const CONTIGUOUS_ENHANCING_TUMOR: i64 = 3;

/// Clinically defined tumor subregions, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TumorRegion {
    /// Every tumor label: {1, 2, 4}.
    WholeTumor,
    /// Necrotic core and enhancing tumor: {1, 4}.
    TumorCore,
    /// Enhancing tumor only: {4}.
    EnhancingTumor,
}

impl TumorRegion {
    pub const ALL: [Self; 3] = [Self::WholeTumor, Self::TumorCore, Self::EnhancingTumor];

    /// Short name used in report columns.
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::WholeTumor => "WT",
            Self::TumorCore => "TC",
            Self::EnhancingTumor => "ET",
        }
    }

    /// Binary mask of the voxels of `labels` that belong to this region.
    ///
    /// This is the only place the region membership rules are encoded.
    pub fn mask<B: Backend>(self, labels: &LabelVolume<B>) -> BinaryMask<B> {
        let labels = labels.tensor().clone();
        let mask = match self {
            Self::WholeTumor => labels.not_equal_elem(BACKGROUND),
            Self::TumorCore => labels
                .clone()
                .equal_elem(NECROTIC_CORE)
                .bool_or(labels.equal_elem(ENHANCING_TUMOR)),
            Self::EnhancingTumor => labels.equal_elem(ENHANCING_TUMOR),
        };
        BinaryMask::new(mask)
    }
}

impl fmt::Display for TumorRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// The three region masks of one label volume.
#[derive(Debug, Clone)]
pub struct RegionMasks<B: Backend> {
    whole_tumor: BinaryMask<B>,
    tumor_core: BinaryMask<B>,
    enhancing_tumor: BinaryMask<B>,
}

impl<B: Backend> RegionMasks<B> {
    /// Maps a label volume to its WT, TC and ET masks.
    pub fn from_labels(labels: &LabelVolume<B>) -> Self {
        Self {
            whole_tumor: TumorRegion::WholeTumor.mask(labels),
            tumor_core: TumorRegion::TumorCore.mask(labels),
            enhancing_tumor: TumorRegion::EnhancingTumor.mask(labels),
        }
    }

    pub const fn get(&self, region: TumorRegion) -> &BinaryMask<B> {
        match region {
            TumorRegion::WholeTumor => &self.whole_tumor,
            TumorRegion::TumorCore => &self.tumor_core,
            TumorRegion::EnhancingTumor => &self.enhancing_tumor,
        }
    }

    /// Whether the volume holds no tumor voxel at all.
    pub fn is_tumor_free(&self) -> bool {
        self.whole_tumor.is_all_background()
    }

    /// Whether the volume holds no enhancing-tumor voxel.
    ///
    /// On a ground truth this makes ET Dice and Hausdorff clinically
    /// meaningless; callers are expected to report it.
    pub fn lacks_enhancing_tumor(&self) -> bool {
        self.enhancing_tumor.is_all_background()
    }
}

/// Converts a contiguous-encoded volume (enhancing = 3) to BraTS labels.
pub fn to_brats_encoding<B: Backend>(labels: LabelVolume<B>) -> LabelVolume<B> {
    labels.relabel(CONTIGUOUS_ENHANCING_TUMOR, ENHANCING_TUMOR)
}

#[cfg(test)]
mod tests {
    use burn::tensor::cast::ToElement;

    use super::*;
    use crate::tests::TestBackend;

    fn sample_labels() -> LabelVolume<TestBackend> {
        let device = Default::default();
        LabelVolume::from_values(vec![0, 1, 2, 4, 0, 1, 2, 4], [2, 2, 2], &device).unwrap()
    }

    fn flags(mask: &BinaryMask<TestBackend>) -> Vec<bool> {
        mask.to_grid().voxels().to_vec()
    }

    #[test]
    fn region_masks_count_expected_voxels() {
        let masks = RegionMasks::from_labels(&sample_labels());

        assert_eq!(masks.get(TumorRegion::WholeTumor).foreground_count(), 6);
        assert_eq!(masks.get(TumorRegion::TumorCore).foreground_count(), 4);
        assert_eq!(masks.get(TumorRegion::EnhancingTumor).foreground_count(), 2);
    }

    #[test]
    fn region_masks_cover_exact_labels() {
        let masks = RegionMasks::from_labels(&sample_labels());

        // Labels [0, 1, 2, 4, 0, 1, 2, 4].
        let whole_tumor = [false, true, true, true, false, true, true, true];
        let tumor_core = [false, true, false, true, false, true, false, true];
        let enhancing = [false, false, false, true, false, false, false, true];
        assert_eq!(flags(masks.get(TumorRegion::WholeTumor)), whole_tumor);
        assert_eq!(flags(masks.get(TumorRegion::TumorCore)), tumor_core);
        assert_eq!(flags(masks.get(TumorRegion::EnhancingTumor)), enhancing);
    }

    #[test]
    fn whole_tumor_is_every_non_background_label() {
        let device = Default::default();
        let labels = LabelVolume::<TestBackend>::from_values(
            vec![BACKGROUND, EDEMA, CONTIGUOUS_ENHANCING_TUMOR, 7],
            [1, 2, 2],
            &device,
        )
        .unwrap();
        let masks = RegionMasks::from_labels(&labels);

        assert_eq!(flags(masks.get(TumorRegion::WholeTumor)), [false, true, true, true]);
        assert!(masks.get(TumorRegion::TumorCore).is_all_background());
    }

    #[test]
    fn missing_enhancing_tumor_is_reported() {
        let device = Default::default();
        let labels =
            LabelVolume::<TestBackend>::from_values(vec![0, 1, 2, 2], [1, 2, 2], &device).unwrap();
        let masks = RegionMasks::from_labels(&labels);

        assert!(masks.lacks_enhancing_tumor());
        assert!(!masks.is_tumor_free());
    }

    #[test]
    fn background_volume_is_tumor_free() {
        let device = Default::default();
        let labels =
            LabelVolume::<TestBackend>::from_values(vec![0; 8], [2, 2, 2], &device).unwrap();
        let masks = RegionMasks::from_labels(&labels);

        assert!(masks.is_tumor_free());
        assert!(masks.lacks_enhancing_tumor());
    }

    #[test]
    fn contiguous_labels_convert_to_brats() {
        let device = Default::default();
        let contiguous =
            LabelVolume::<TestBackend>::from_values(vec![0, 1, 2, 3, 0, 1, 2, 3], [2, 2, 2], &device)
                .unwrap();

        let brats = to_brats_encoding(contiguous);

        let sum = brats.tensor().clone().sum().into_scalar().to_i64();
        assert_eq!(sum, 2 * (1 + 2 + 4));
        let masks = RegionMasks::from_labels(&brats);
        assert_eq!(masks.get(TumorRegion::EnhancingTumor).foreground_count(), 2);
    }

    #[test]
    fn abbreviations_follow_report_order() {
        let names: Vec<_> = TumorRegion::ALL.iter().map(|r| r.abbreviation()).collect();
        assert_eq!(names, ["WT", "TC", "ET"]);
    }
}
