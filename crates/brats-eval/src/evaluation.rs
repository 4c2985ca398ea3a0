//! Batch evaluation of segmentation predictions.
//!
//! Cases are evaluated one after another:
//! load volumes, derive the ROI, then for WT, TC and ET map labels, build the
//! confusion matrix and compute metrics, and finally emit the report row.
//! Nothing is shared between cases except the report and the aggregator.

use std::{
    io::{self, Write},
    path::Path,
};

use brats_eval_metric::{
    to_brats_encoding, HausdorffDistance, MetricsAggregator, RegionMasks, RegionMetrics,
    TumorRegion,
};
use brats_eval_util::{ensure_same_shape, VolumeSource, VoxelSpacing};
use burn::tensor::backend::Backend;

use crate::{
    config::{EvaluationConfig, LabelEncoding},
    error::{EvaluationError, EvaluationResult},
    manifest::{CaseEntry, Manifest},
    report::{format_value, CaseRecord, ReportWriter},
};

/// Result of evaluating one case.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Evaluated(Box<CaseRecord>),
    /// The prediction file does not exist.
    Skipped,
}

/// Counts of a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub evaluated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Evaluates every manifest case against its prediction.
pub struct Evaluator<B: Backend, S: VolumeSource<B>> {
    config: EvaluationConfig,
    source: S,
    device: B::Device,
    hausdorff: HausdorffDistance,
}

impl<B: Backend, S: VolumeSource<B>> Evaluator<B, S> {
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: EvaluationConfig, source: S, device: B::Device) -> EvaluationResult<Self> {
        config.validate()?;
        let hausdorff = config.hausdorff()?;
        Ok(Self {
            config,
            source,
            device,
            hausdorff,
        })
    }

    pub const fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Opens the configured report through `open` and writes its header.
    ///
    /// The configuration was validated by [`Self::new`].
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be opened or the header cannot
    /// be written.
    pub fn create_report<W, F>(&self, open: F) -> EvaluationResult<ReportWriter<W>>
    where
        W: Write,
        F: FnOnce(&Path) -> io::Result<W>,
    {
        let path = &self.config.output;
        let writer = open(path.as_path()).map_err(|source| EvaluationError::ReportCreate {
            path: path.clone(),
            source,
        })?;
        ReportWriter::new(writer, self.config.extended_report)
    }

    /// Evaluates all selected cases, writing one report row per evaluated case.
    ///
    /// Per-case failures are logged and counted; only report I/O errors abort
    /// the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if a report row cannot be written.
    pub fn run<W: Write>(
        &self,
        manifest: &Manifest,
        report: &mut ReportWriter<W>,
    ) -> EvaluationResult<EvaluationSummary> {
        let split = self.config.split.as_deref();
        let cases: Vec<&CaseEntry> = manifest
            .cases()
            .iter()
            .filter(|case| case.in_split(split))
            .collect();
        tracing::info!(cases = cases.len(), split = ?split, "starting evaluation");

        let mut summary = EvaluationSummary::default();
        let mut aggregator = MetricsAggregator::new();

        for (position, case) in cases.iter().enumerate() {
            let subject = case.subject_id();
            match self.evaluate_case(case) {
                Ok(CaseOutcome::Evaluated(record)) => {
                    report.write_record(&record)?;
                    aggregator.update(&record.regions);
                    summary.evaluated += 1;
                    tracing::info!(
                        subject,
                        case = position + 1,
                        of = cases.len(),
                        dice_wt = %format_value(record.region(TumorRegion::WholeTumor).dice),
                        dice_tc = %format_value(record.region(TumorRegion::TumorCore).dice),
                        dice_et = %format_value(record.region(TumorRegion::EnhancingTumor).dice),
                        "case evaluated",
                    );
                }
                Ok(CaseOutcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(subject, error = %e, "failed to evaluate case");
                }
            }
        }

        for column in aggregator.summary() {
            tracing::info!(
                column = %column.metric.column(column.region),
                mean = %format_value(column.mean),
                defined = column.defined,
                "mean",
            );
        }
        tracing::info!(
            evaluated = summary.evaluated,
            skipped = summary.skipped,
            failed = summary.failed,
            "evaluation finished",
        );
        Ok(summary)
    }

    /// Evaluates a single case.
    ///
    /// # Errors
    ///
    /// Returns an error if a volume cannot be loaded, the volumes differ in
    /// shape, or a metric cannot be computed.
    pub fn evaluate_case(&self, case: &CaseEntry) -> EvaluationResult<CaseOutcome> {
        let subject = case.subject_id();
        let paths = case.paths(&self.config);

        if !self.source.exists(&paths.prediction) {
            tracing::warn!(
                subject,
                path = %paths.prediction.display(),
                "prediction not found, skipping case",
            );
            return Ok(CaseOutcome::Skipped);
        }

        let truth = self
            .source
            .load(&paths.ground_truth, &self.device)?
            .into_labels();
        let prediction = self
            .source
            .load(&paths.prediction, &self.device)?
            .into_labels();
        let modality = self.source.load(&paths.modality, &self.device)?;

        ensure_same_shape("prediction", prediction.dims(), "ground truth", truth.dims())?;
        ensure_same_shape("modality", modality.dims(), "ground truth", truth.dims())?;

        let prediction = match self.config.prediction_labels {
            LabelEncoding::Brats => prediction,
            LabelEncoding::Contiguous => to_brats_encoding(prediction),
        };
        let spacing = if self.config.use_voxel_spacing {
            truth.spacing()
        } else {
            VoxelSpacing::UNIT
        };

        let roi = modality.nonzero_mask();
        let truth_masks = RegionMasks::from_labels(&truth);
        let prediction_masks = RegionMasks::from_labels(&prediction);

        if truth_masks.is_tumor_free() && prediction_masks.is_tumor_free() {
            tracing::info!(subject, "no tumor in prediction or ground truth");
        }
        if truth_masks.lacks_enhancing_tumor() {
            tracing::info!(subject, "no enhancing tumor region in the ground truth");
        }

        let [whole_tumor, tumor_core, enhancing_tumor] = TumorRegion::ALL;
        let evaluate = |region| {
            RegionMetrics::evaluate(
                region,
                prediction_masks.get(region),
                truth_masks.get(region),
                &roi,
                &self.hausdorff,
                spacing,
            )
        };
        let regions = [
            evaluate(whole_tumor)?,
            evaluate(tumor_core)?,
            evaluate(enhancing_tumor)?,
        ];

        Ok(CaseOutcome::Evaluated(Box::new(CaseRecord {
            identity: case.identity.clone(),
            regions,
        })))
    }
}

/// Validates `config`, opens the report and evaluates every selected case.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the report cannot be
/// created or written. Nothing is opened for an invalid configuration.
pub fn evaluate_manifest<B, S, W, F>(
    config: EvaluationConfig,
    source: S,
    device: B::Device,
    manifest: &Manifest,
    open_report: F,
) -> EvaluationResult<EvaluationSummary>
where
    B: Backend,
    S: VolumeSource<B>,
    W: Write,
    F: FnOnce(&Path) -> io::Result<W>,
{
    let evaluator = Evaluator::<B, S>::new(config, source, device)?;
    let mut report = evaluator.create_report(open_report)?;
    evaluator.run(manifest, &mut report)
}
