//! Batch evaluation of BraTS brain-tumor segmentation predictions.
//!
//! Reads a dataset manifest, loads the ground truth, modality and prediction
//! volumes of every case, computes per-region overlap and surface-distance
//! metrics and writes them to a CSV report.

pub mod backend;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod manifest;
pub mod report;

#[doc(inline)]
pub use brats_eval_metric as metric;
#[doc(inline)]
pub use brats_eval_util as util;
pub use config::{EvaluationConfig, LabelEncoding};
pub use error::{EvaluationError, EvaluationResult};
pub use evaluation::{evaluate_manifest, CaseOutcome, EvaluationSummary, Evaluator};
pub use manifest::{CaseEntry, CaseIdentity, Manifest};
pub use report::{CaseRecord, ReportWriter};

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    pub type TestBackend = NdArray;
}
