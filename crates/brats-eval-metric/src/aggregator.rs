//! Metrics aggregator for batch evaluation.
//!
//! Accumulates the per-region metrics of every evaluated case and reports
//! column means over the defined values only.

use std::collections::HashMap;

use crate::{
    labels::TumorRegion,
    region::{MetricKind, RegionMetrics},
};

#[derive(Debug, Clone, Copy, Default)]
struct RunningMean {
    sum: f64,
    count: usize,
}

/// Mean of one report column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub region: TumorRegion,
    pub metric: MetricKind,
    /// `None` when no case produced a defined value.
    pub mean: Option<f64>,
    /// Number of cases with a defined value.
    pub defined: usize,
}

/// Accumulates region metrics across cases.
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    columns: HashMap<(TumorRegion, MetricKind), RunningMean>,
    cases: usize,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the region metrics of one case.
    pub fn update(&mut self, regions: &[RegionMetrics]) {
        for metrics in regions {
            for kind in MetricKind::REPORTED {
                let entry = self.columns.entry((metrics.region, kind)).or_default();
                if let Some(value) = metrics.value(kind) {
                    entry.sum += value;
                    entry.count += 1;
                }
            }
        }
        self.cases += 1;
    }

    /// Number of cases added so far.
    pub const fn cases(&self) -> usize {
        self.cases
    }

    /// Column means in report order.
    pub fn summary(&self) -> Vec<ColumnSummary> {
        TumorRegion::ALL
            .iter()
            .flat_map(|&region| {
                MetricKind::REPORTED.iter().map(move |&metric| {
                    let running = self
                        .columns
                        .get(&(region, metric))
                        .copied()
                        .unwrap_or_default();
                    ColumnSummary {
                        region,
                        metric,
                        mean: (running.count > 0).then(|| running.sum / running.count as f64),
                        defined: running.count,
                    }
                })
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.columns.clear();
        self.cases = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confusion::ConfusionMatrix;

    fn metrics(region: TumorRegion, dice: Option<f64>, hausdorff: Option<f64>) -> RegionMetrics {
        RegionMetrics {
            region,
            dice,
            hausdorff,
            recall: None,
            precision: None,
            f1: dice,
            accuracy: Some(1.0),
            confusion: ConfusionMatrix::default(),
            tumor_free: false,
        }
    }

    #[test]
    fn means_skip_undefined_values() {
        let mut aggregator = MetricsAggregator::new();
        aggregator.update(&[metrics(TumorRegion::WholeTumor, Some(0.5), Some(4.0))]);
        aggregator.update(&[metrics(TumorRegion::WholeTumor, Some(1.0), None)]);

        let summary = aggregator.summary();
        let dice = summary
            .iter()
            .find(|c| c.region == TumorRegion::WholeTumor && c.metric == MetricKind::Dice)
            .unwrap();
        let hd = summary
            .iter()
            .find(|c| c.region == TumorRegion::WholeTumor && c.metric == MetricKind::Hausdorff)
            .unwrap();

        assert_eq!(aggregator.cases(), 2);
        assert_eq!(dice.mean, Some(0.75));
        assert_eq!(dice.defined, 2);
        assert_eq!(hd.mean, Some(4.0));
        assert_eq!(hd.defined, 1);
    }

    #[test]
    fn summary_follows_report_order() {
        let summary = MetricsAggregator::new().summary();

        assert_eq!(summary.len(), 15);
        assert_eq!(summary[0].metric.column(summary[0].region), "Dice WT");
        assert_eq!(summary[14].metric.column(summary[14].region), "F1 ET");
        assert!(summary.iter().all(|c| c.mean.is_none()));
    }

    #[test]
    fn reset_clears_state() {
        let mut aggregator = MetricsAggregator::new();
        aggregator.update(&[metrics(TumorRegion::TumorCore, Some(0.2), Some(1.0))]);
        aggregator.reset();

        assert_eq!(aggregator.cases(), 0);
        assert!(aggregator.summary().iter().all(|c| c.defined == 0));
    }
}
