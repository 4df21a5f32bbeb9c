//! Recovery-hysteresis analysis: how long each metric stays strained
//! after the user stops logging the crash.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::CycleConfig;
use crate::constants::{is_vital_metric, EPOCH_POST_DAYS};

use super::discovery::is_straining;
use super::epoch::Epoch;

/// Average recovery lag of one metric across episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryLag {
    /// The metric name.
    pub metric: String,
    /// Mean days past the manual exit before the metric stopped
    /// straining.
    pub avg_lag_days: f64,
}

/// Recovery phase report.
///
/// The hysteresis gap is the domain's key output: biomarkers that keep
/// straining after symptoms have subsided mean the user feels
/// recovered before their body is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryReport {
    /// Mean recovery lag over symptom-type metrics, in days.
    pub avg_symptom_recovery_days: f64,
    /// Mean recovery lag over vital-type metrics, in days.
    pub avg_biological_recovery_days: f64,
    /// `max(0, biological − symptom)`.
    pub hysteresis_gap_days: f64,
    /// Up to three slowest-recovering metrics worth reporting.
    pub slowest_recoverers: Vec<RecoveryLag>,
}

impl RecoveryReport {
    /// One-line plain-text summary.
    pub fn summary(&self) -> String {
        format!(
            "symptoms {:.1}d, vitals {:.1}d, gap {:.1}d",
            self.avg_symptom_recovery_days,
            self.avg_biological_recovery_days,
            self.hysteresis_gap_days
        )
    }
}

/// Measure per-metric recovery lag across all epochs.
pub fn analyze_recovery(
    epochs: &[Epoch],
    metrics: &[String],
    config: &CycleConfig,
) -> RecoveryReport {
    // Per metric, lags observed across episodes.
    let mut lags: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

    for epoch in epochs {
        let exit = manual_exit_day(epoch);
        for metric in metrics {
            if let Some(lag) = recovery_lag(epoch, metric, exit, config) {
                lags.entry(metric).or_default().push(lag);
            }
        }
    }

    let averages: Vec<RecoveryLag> = lags
        .iter()
        .map(|(metric, values)| RecoveryLag {
            metric: metric.to_string(),
            avg_lag_days: values.iter().sum::<f64>() / values.len() as f64,
        })
        .collect();

    let (vitals, symptoms): (Vec<&RecoveryLag>, Vec<&RecoveryLag>) = averages
        .iter()
        .partition(|lag| is_vital_metric(&lag.metric));

    let avg_symptom_recovery_days = group_mean(&symptoms);
    let avg_biological_recovery_days = group_mean(&vitals);

    let mut slowest: Vec<RecoveryLag> = averages
        .iter()
        .filter(|lag| lag.avg_lag_days > config.recovery_report_floor)
        .cloned()
        .collect();
    slowest.sort_by(|a, b| {
        b.avg_lag_days
            .partial_cmp(&a.avg_lag_days)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    slowest.truncate(3);

    RecoveryReport {
        avg_symptom_recovery_days,
        avg_biological_recovery_days,
        hysteresis_gap_days: (avg_biological_recovery_days - avg_symptom_recovery_days)
            .max(0.0),
        slowest_recoverers: slowest,
    }
}

fn group_mean(group: &[&RecoveryLag]) -> f64 {
    if group.is_empty() {
        return 0.0;
    }
    group.iter().map(|lag| lag.avg_lag_days).sum::<f64>() / group.len() as f64
}

/// First offset after the contiguous flagged run starting at onset:
/// the day the user stopped actively logging the crash.
fn manual_exit_day(epoch: &Epoch) -> i64 {
    let mut offset = 0;
    while epoch
        .day_at(offset)
        .map(|d| d.crash_flagged)
        .unwrap_or(false)
    {
        offset += 1;
    }
    offset
}

/// Days past `exit` before the metric stops straining, capped at the
/// last observed day of the window. `None` when the metric has no data
/// in the tail.
fn recovery_lag(epoch: &Epoch, metric: &str, exit: i64, config: &CycleConfig) -> Option<f64> {
    // Last offset with a straining reading; the cap when data runs out.
    let mut last_strained: Option<i64> = None;

    for offset in exit..=EPOCH_POST_DAYS {
        let Some(day) = epoch.day_at(offset) else {
            break;
        };
        match day.z(metric) {
            Some(z) => {
                if !is_straining(metric, z, config.strain_threshold) {
                    return Some((offset - exit) as f64);
                }
                last_strained = Some(offset);
            }
            // An unlogged day cannot confirm strain; treat as recovered.
            None if last_strained.is_some() => return Some((offset - exit) as f64),
            None => return None,
        }
    }

    // Strained through every observed reading. A clipped epoch must not
    // claim strain on days that were never recorded.
    last_strained.map(|offset| (offset - exit).max(0) as f64)
}
