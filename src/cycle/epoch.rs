//! Epoch extraction and z-scoring around crash onsets.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::constants::{EPOCH_POST_DAYS, EPOCH_PRE_DAYS};
use crate::series::MetricSeries;
use crate::types::{BaselineStats, DailyRecord};

/// One day within an epoch window.
#[derive(Debug, Clone)]
pub struct EpochDay {
    /// Day offset relative to the crash onset (0 = onset day).
    pub offset: i64,
    /// Raw metric values; `None` when the metric was not logged.
    pub values: BTreeMap<String, Option<f64>>,
    /// Baseline-relative z-scores for the same metrics.
    pub z_scores: BTreeMap<String, Option<f64>>,
    /// Whether this day carried an explicit crash flag.
    pub crash_flagged: bool,
}

impl EpochDay {
    /// Z-score of a metric on this day, if present.
    pub fn z(&self, metric: &str) -> Option<f64> {
        self.z_scores.get(metric).copied().flatten()
    }
}

/// A read-only snapshot of the `[-7, +14]` window around one crash
/// onset. Offsets outside the series bounds are simply absent.
#[derive(Debug, Clone)]
pub struct Epoch {
    /// The crash onset date this window is aligned to.
    pub onset: NaiveDate,
    /// Days present in the window, in ascending offset order.
    pub days: Vec<EpochDay>,
}

impl Epoch {
    /// The day at a given offset, if it was within the series bounds.
    pub fn day_at(&self, offset: i64) -> Option<&EpochDay> {
        self.days.iter().find(|d| d.offset == offset)
    }
}

/// Indices of crash onsets: flagged days whose previous day is not
/// flagged. Consecutive flagged days belong to one episode.
pub fn detect_crash_onsets(records: &[DailyRecord]) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(i, r)| r.is_crash_day() && (*i == 0 || !records[i - 1].is_crash_day()))
        .map(|(i, _)| i)
        .collect()
}

/// Slice the fixed window around each onset and z-score every metric
/// against its baseline.
///
/// `series` supplies each metric's per-day values (coerced reading, so
/// flag-shaped entries count); `records` supplies dates and crash
/// flags, and must already be sorted by date with `series` aligned to
/// the same index.
pub fn extract_epochs(
    records: &[DailyRecord],
    series: &MetricSeries,
    onsets: &[usize],
    baselines: &BTreeMap<String, BaselineStats>,
) -> Vec<Epoch> {
    onsets
        .iter()
        .map(|&onset_idx| {
            let mut days = Vec::new();
            for offset in -EPOCH_PRE_DAYS..=EPOCH_POST_DAYS {
                let idx = onset_idx as i64 + offset;
                if idx < 0 || idx as usize >= records.len() {
                    continue;
                }
                let idx = idx as usize;

                let mut values = BTreeMap::new();
                let mut z_scores = BTreeMap::new();
                for metric in series.metrics() {
                    let raw = series.value(metric, idx);
                    let z = raw.map(|v| z_score(v, baselines.get(metric)));
                    values.insert(metric.clone(), raw);
                    z_scores.insert(metric.clone(), z);
                }

                days.push(EpochDay {
                    offset,
                    values,
                    z_scores,
                    crash_flagged: records[idx].is_crash_day(),
                });
            }

            Epoch {
                onset: records[onset_idx].date,
                days,
            }
        })
        .collect()
}

/// Baseline-relative z-score.
///
/// A flat baseline (std of 0) cannot scale the deviation; the rule
/// there is asymmetric on purpose, matching the product's established
/// behavior: a fixed magnitude of 2 for values above the mean, 0 for
/// values at or below it.
fn z_score(value: f64, baseline: Option<&BaselineStats>) -> f64 {
    let Some(stats) = baseline else {
        return 0.0;
    };
    if stats.std > 0.0 {
        (value - stats.mean) / stats.std
    } else if value > stats.mean {
        2.0
    } else {
        0.0
    }
}
