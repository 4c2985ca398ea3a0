use std::path::{Path, PathBuf};

use brats_eval_metric::{HausdorffConfig, HausdorffDistance};
use burn::prelude::*;

use crate::error::{EvaluationError, EvaluationResult};

/// Placeholder replaced by the subject ID in [`EvaluationConfig::prediction_pattern`].
pub const SUBJECT_PLACEHOLDER: &str = "{subject}";

#[derive(Config, Debug)]
pub struct EvaluationConfig {
    /// Dataset manifest listing the cases to evaluate.
    pub manifest: PathBuf,
    /// Root of the case directories. Defaults to the manifest's directory.
    #[config(default = "None")]
    pub data_root: Option<PathBuf>,
    #[config(default = "PathBuf::from(\"results_test.csv\")")]
    pub output: PathBuf,
    /// Prediction file name inside a case directory, used when the manifest
    /// has no prediction column.
    #[config(default = "String::from(\"{subject}_prediction.nii.gz\")")]
    pub prediction_pattern: String,
    /// Only evaluate manifest rows whose split column equals this value.
    /// `None` evaluates every row.
    #[config(default = "None")]
    pub split: Option<String>,
    #[config(default = "','")]
    pub manifest_delimiter: char,
    #[config(default = 95.0)]
    pub hausdorff_percentile: f64,
    /// Measure Hausdorff distances in millimetres instead of voxels.
    #[config(default = false)]
    pub use_voxel_spacing: bool,
    #[config(default = "LabelEncoding::Brats")]
    pub prediction_labels: LabelEncoding,
    /// Append accuracy and confusion counts to every report row.
    #[config(default = false)]
    pub extended_report: bool,
}

/// Label convention of prediction volumes.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum LabelEncoding {
    /// {0, 1, 2, 4}, enhancing tumor = 4.
    Brats,
    /// {0, 1, 2, 3}, enhancing tumor = 3.
    Contiguous,
}

impl EvaluationConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn from_file(path: &Path) -> EvaluationResult<Self> {
        Self::load(path).map_err(|e| EvaluationError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Root that relative case directories are resolved against.
    pub fn resolved_data_root(&self) -> PathBuf {
        self.data_root.clone().unwrap_or_else(|| {
            self.manifest
                .parent()
                .map_or_else(PathBuf::new, Path::to_path_buf)
        })
    }

    /// Prediction file name for a subject.
    pub fn prediction_file_name(&self, subject_id: &str) -> String {
        self.prediction_pattern
            .replace(SUBJECT_PLACEHOLDER, subject_id)
    }

    /// Builds the Hausdorff metric described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the percentile is out of range.
    pub fn hausdorff(&self) -> EvaluationResult<HausdorffDistance> {
        Ok(HausdorffConfig::new()
            .with_percentile(self.hausdorff_percentile)
            .init()?)
    }

    /// Checks values that serde cannot validate.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> EvaluationResult<()> {
        if self.prediction_pattern.trim().is_empty() {
            return Err(EvaluationError::InvalidConfiguration {
                reason: "prediction_pattern must not be empty".to_owned(),
            });
        }
        if self.manifest_delimiter == '"' || self.manifest_delimiter == '\n' {
            return Err(EvaluationError::InvalidConfiguration {
                reason: format!(
                    "unsupported manifest delimiter {:?}",
                    self.manifest_delimiter
                ),
            });
        }
        self.hausdorff().map(|_| ())
    }
}
