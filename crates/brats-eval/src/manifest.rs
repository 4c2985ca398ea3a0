//! Dataset manifest.
//!
//! A manifest is a delimited text file with a header row and one row per case.
//! Columns are matched by name, case-insensitively:
//!
//! - required: `subject_ID` (or `ID`, `patient`), `Grade`, `Center`, `Size`,
//!   `seg`, `flair`
//! - optional: `data_path`, `prediction`, `split` (or `train_test`, `partition`)
//!
//! File names are relative to the case directory `<root>/<subject_ID>`, where
//! `<root>` is the row's `data_path` or the configured data root.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use derive_new::new;

use crate::{
    config::EvaluationConfig,
    error::{EvaluationError, EvaluationResult},
};

const SUBJECT_COLUMNS: &[&str] = &["subject_id", "id", "patient"];
const SPLIT_COLUMNS: &[&str] = &["split", "train_test", "partition"];

/// Identity fields of a case, copied verbatim into the report.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct CaseIdentity {
    pub subject_id: String,
    pub grade: String,
    pub center: String,
    pub size: String,
}

/// One manifest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseEntry {
    pub identity: CaseIdentity,
    pub data_path: Option<PathBuf>,
    /// Ground-truth segmentation file name.
    pub segmentation: String,
    /// Structural modality (FLAIR) file name, used to derive the ROI.
    pub modality: String,
    pub prediction: Option<String>,
    pub split: Option<String>,
}

/// Resolved file locations of a case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasePaths {
    pub ground_truth: PathBuf,
    pub modality: PathBuf,
    pub prediction: PathBuf,
}

impl CaseEntry {
    pub fn subject_id(&self) -> &str {
        &self.identity.subject_id
    }

    /// Resolves the case's volume paths.
    pub fn paths(&self, config: &EvaluationConfig) -> CasePaths {
        let root = self
            .data_path
            .clone()
            .unwrap_or_else(|| config.resolved_data_root());
        let case_dir = root.join(self.subject_id());
        let prediction = self
            .prediction
            .clone()
            .unwrap_or_else(|| config.prediction_file_name(self.subject_id()));

        CasePaths {
            ground_truth: case_dir.join(&self.segmentation),
            modality: case_dir.join(&self.modality),
            prediction: case_dir.join(prediction),
        }
    }

    /// Whether the case belongs to `split`. Rows without a split value
    /// belong to every split.
    pub fn in_split(&self, split: Option<&str>) -> bool {
        match (split, self.split.as_deref()) {
            (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
            _ => true,
        }
    }
}

#[derive(Debug)]
struct ColumnIndex {
    subject: usize,
    grade: usize,
    center: usize,
    size: usize,
    segmentation: usize,
    modality: usize,
    data_path: Option<usize>,
    prediction: Option<usize>,
    split: Option<usize>,
    width: usize,
}

impl ColumnIndex {
    fn from_header(header: &[String], origin: &str) -> EvaluationResult<Self> {
        let find = |names: &[&str]| {
            header
                .iter()
                .position(|column| names.iter().any(|n| column.eq_ignore_ascii_case(n)))
        };
        let require = |names: &[&str], column: &'static str| {
            find(names).ok_or_else(|| EvaluationError::MissingColumn {
                origin: origin.to_owned(),
                column,
            })
        };

        Ok(Self {
            subject: require(SUBJECT_COLUMNS, "subject_ID")?,
            grade: require(&["grade"], "Grade")?,
            center: require(&["center"], "Center")?,
            size: require(&["size"], "Size")?,
            segmentation: require(&["seg"], "seg")?,
            modality: require(&["flair"], "flair")?,
            data_path: find(&["data_path"]),
            prediction: find(&["prediction"]),
            split: find(SPLIT_COLUMNS),
            width: header.len(),
        })
    }
}

/// All cases listed in a manifest, in file order.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    cases: Vec<CaseEntry>,
}

impl Manifest {
    /// Reads a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, lacks a required column,
    /// or contains a row with the wrong number of fields.
    pub fn from_file(path: &Path, delimiter: char) -> EvaluationResult<Self> {
        let file = File::open(path).map_err(|source| EvaluationError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file), delimiter, &path.display().to_string())
    }

    /// Parses a manifest from any buffered reader.
    ///
    /// `origin` names the source in error messages.
    ///
    /// # Errors
    ///
    /// See [`Self::from_file`].
    pub fn from_reader<R: BufRead>(
        reader: R,
        delimiter: char,
        origin: &str,
    ) -> EvaluationResult<Self> {
        let read_failed = |source| EvaluationError::ManifestRead {
            path: PathBuf::from(origin),
            source,
        };

        let mut lines = reader.lines().enumerate();
        let header = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line.map_err(read_failed)?;
                    if !line.trim().is_empty() {
                        break split_fields(&line, delimiter);
                    }
                }
                None => {
                    return Err(EvaluationError::MissingColumn {
                        origin: origin.to_owned(),
                        column: "subject_ID",
                    })
                }
            }
        };
        let columns = ColumnIndex::from_header(&header, origin)?;

        let mut cases = Vec::new();
        for (index, line) in lines {
            let line = line.map_err(read_failed)?;
            if line.trim().is_empty() {
                continue;
            }
            let fields = split_fields(&line, delimiter);
            if fields.len() != columns.width {
                return Err(EvaluationError::MalformedRow {
                    origin: origin.to_owned(),
                    line: index + 1,
                    reason: format!(
                        "expected {} fields, found {}",
                        columns.width,
                        fields.len()
                    ),
                });
            }
            cases.push(parse_row(&fields, &columns));
        }

        Ok(Self { cases })
    }

    pub fn cases(&self) -> &[CaseEntry] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

fn parse_row(fields: &[String], columns: &ColumnIndex) -> CaseEntry {
    let optional = |index: Option<usize>| {
        index
            .map(|i| fields[i].clone())
            .filter(|value| !value.is_empty())
    };

    CaseEntry {
        identity: CaseIdentity::new(
            fields[columns.subject].clone(),
            fields[columns.grade].clone(),
            fields[columns.center].clone(),
            fields[columns.size].clone(),
        ),
        data_path: optional(columns.data_path).map(PathBuf::from),
        segmentation: fields[columns.segmentation].clone(),
        modality: fields[columns.modality].clone(),
        prediction: optional(columns.prediction),
        split: optional(columns.split),
    }
}

/// Splits a line on `delimiter`, honouring double-quoted fields.
fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            c if c == delimiter && !quoted => {
                fields.push(current.trim().to_owned());
                current.clear();
            }
            c => current.push(c),
        }
    }
    fields.push(current.trim().to_owned());
    fields
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const MANIFEST: &str = "\
subject_ID,Grade,Center,Size,seg,flair,split
BraTS20_001,HGG,CBICA,large,BraTS20_001_seg.nii.gz,BraTS20_001_flair.nii.gz,test

BraTS20_002,LGG,TCIA,small,BraTS20_002_seg.nii.gz,BraTS20_002_flair.nii.gz,train
";

    fn parse(text: &str) -> EvaluationResult<Manifest> {
        Manifest::from_reader(Cursor::new(text), ',', "memory")
    }

    #[test]
    fn parses_rows_and_skips_blank_lines() {
        let manifest = parse(MANIFEST).unwrap();

        assert_eq!(manifest.len(), 2);
        let first = &manifest.cases()[0];
        assert_eq!(
            first.identity,
            CaseIdentity::new(
                "BraTS20_001".into(),
                "HGG".into(),
                "CBICA".into(),
                "large".into()
            )
        );
        assert_eq!(first.segmentation, "BraTS20_001_seg.nii.gz");
        assert_eq!(first.split.as_deref(), Some("test"));
        assert_eq!(first.prediction, None);
    }

    #[test]
    fn header_matching_ignores_case_and_aliases() {
        let text = "id,GRADE,center,SIZE,Seg,FLAIR,Prediction\nP1,HGG,A,1,s.nii,f.nii,p.nii\n";
        let manifest = parse(text).unwrap();

        assert_eq!(manifest.cases()[0].subject_id(), "P1");
        assert_eq!(manifest.cases()[0].prediction.as_deref(), Some("p.nii"));
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let err = parse("subject_ID,Grade,Center,Size,seg\nP1,HGG,A,1,s.nii\n").unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::MissingColumn { column: "flair", .. }
        ));
    }

    #[test]
    fn empty_manifest_is_fatal() {
        assert!(parse("").is_err());
    }

    #[test]
    fn short_row_reports_line_number() {
        let text = "subject_ID,Grade,Center,Size,seg,flair\nP1,HGG,A,1,s.nii,f.nii\nP2,HGG\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedRow { line: 3, .. }));
    }

    #[test]
    fn quoted_fields_may_contain_delimiter() {
        assert_eq!(
            split_fields("a,\"b, c\",\"say \"\"hi\"\"\"", ','),
            vec!["a", "b, c", "say \"hi\""]
        );
    }

    #[test]
    fn paths_resolve_against_data_root() {
        let manifest = parse(MANIFEST).unwrap();
        let config = EvaluationConfig::new(PathBuf::from("/data/brats/manifest.csv"));

        let paths = manifest.cases()[0].paths(&config);

        let case_dir = PathBuf::from("/data/brats/BraTS20_001");
        assert_eq!(paths.ground_truth, case_dir.join("BraTS20_001_seg.nii.gz"));
        assert_eq!(paths.modality, case_dir.join("BraTS20_001_flair.nii.gz"));
        assert_eq!(
            paths.prediction,
            case_dir.join("BraTS20_001_prediction.nii.gz")
        );
    }

    #[test]
    fn row_data_path_overrides_root() {
        let text = "subject_ID,Grade,Center,Size,seg,flair,data_path\nP1,HGG,A,1,s.nii,f.nii,/other\n";
        let manifest = parse(text).unwrap();
        let config = EvaluationConfig::new(PathBuf::from("/data/manifest.csv"));

        let paths = manifest.cases()[0].paths(&config);
        assert_eq!(paths.ground_truth, PathBuf::from("/other/P1/s.nii"));
    }

    #[test]
    fn split_filter_matches_case_insensitively() {
        let manifest = parse(MANIFEST).unwrap();
        let selected: Vec<_> = manifest
            .cases()
            .iter()
            .filter(|case| case.in_split(Some("TEST")))
            .map(CaseEntry::subject_id)
            .collect();

        assert_eq!(selected, vec!["BraTS20_001"]);
        assert!(manifest.cases()[1].in_split(None));
    }
}
