//! Tabular report output.
//!
//! One comma-separated row per evaluated case, flushed as soon as it is
//! written so an interrupted batch keeps every finished row.

use std::io::Write;

use brats_eval_metric::{MetricKind, RegionMetrics, TumorRegion};

use crate::{
    error::{EvaluationError, EvaluationResult},
    manifest::CaseIdentity,
};

/// Identity columns, before the metric columns.
pub const IDENTITY_COLUMNS: [&str; 4] = ["subject_ID", "Grade", "Center", "Size"];

/// Extra per-region columns of the extended report.
const EXTENDED_COLUMNS: [&str; 5] = ["Accuracy", "TP", "FP", "TN", "FN"];

/// Text written for an undefined metric.
pub const UNDEFINED: &str = "nan";

/// Metrics of one case. Created once, written once.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    pub identity: CaseIdentity,
    /// Region metrics in [`TumorRegion::ALL`] order.
    pub regions: [RegionMetrics; 3],
}

impl CaseRecord {
    pub fn region(&self, region: TumorRegion) -> &RegionMetrics {
        match region {
            TumorRegion::WholeTumor => &self.regions[0],
            TumorRegion::TumorCore => &self.regions[1],
            TumorRegion::EnhancingTumor => &self.regions[2],
        }
    }
}

/// Report column names.
pub fn header(extended: bool) -> Vec<String> {
    let mut columns: Vec<String> = IDENTITY_COLUMNS.iter().map(ToString::to_string).collect();
    for region in TumorRegion::ALL {
        columns.extend(MetricKind::REPORTED.iter().map(|kind| kind.column(region)));
    }
    if extended {
        for region in TumorRegion::ALL {
            columns.extend(
                EXTENDED_COLUMNS
                    .iter()
                    .map(|name| format!("{name} {}", region.abbreviation())),
            );
        }
    }
    columns
}

/// Formats a metric value; `None` becomes [`UNDEFINED`].
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:?}"),
        _ => UNDEFINED.to_owned(),
    }
}

/// Writes the report row by row.
pub struct ReportWriter<W: Write> {
    writer: W,
    extended: bool,
    rows: usize,
}

impl<W: Write> ReportWriter<W> {
    /// Creates a writer and emits the header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn new(writer: W, extended: bool) -> EvaluationResult<Self> {
        let mut report = Self {
            writer,
            extended,
            rows: 0,
        };
        let columns = header(extended);
        report.write_line(&columns)?;
        Ok(report)
    }

    /// Appends the row of one case and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be written.
    pub fn write_record(&mut self, record: &CaseRecord) -> EvaluationResult<()> {
        let identity = &record.identity;
        let mut fields = vec![
            escape(&identity.subject_id),
            escape(&identity.grade),
            escape(&identity.center),
            escape(&identity.size),
        ];
        for region in TumorRegion::ALL {
            let metrics = record.region(region);
            fields.extend(
                MetricKind::REPORTED
                    .iter()
                    .map(|&kind| format_value(metrics.value(kind))),
            );
        }
        if self.extended {
            for region in TumorRegion::ALL {
                let metrics = record.region(region);
                let counts = metrics.confusion;
                fields.push(format_value(metrics.accuracy));
                fields.extend(
                    [
                        counts.true_positives,
                        counts.false_positives,
                        counts.true_negatives,
                        counts.false_negatives,
                    ]
                    .iter()
                    .map(u64::to_string),
                );
            }
        }
        self.write_line(&fields)?;
        self.rows += 1;
        Ok(())
    }

    /// Number of case rows written.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, fields: &[String]) -> EvaluationResult<()> {
        writeln!(self.writer, "{}", fields.join(","))
            .and_then(|()| self.writer.flush())
            .map_err(EvaluationError::ReportWrite)
    }
}

/// Quotes a field that contains a comma, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}
