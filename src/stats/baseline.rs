//! Per-metric baseline statistics over a reference window.

use std::collections::BTreeMap;

use crate::types::{BaselineStats, DailyRecord};

/// Compute per-metric mean and sample standard deviation over a
/// reference slice of records.
///
/// For each metric the present numeric values are collected from both
/// the top-level fields and the custom sub-map. With at least two
/// observations the sample statistics are used. A zero-variance crash
/// flag falls back to `{mean: 0, std: 1}` so downstream z-scores stay
/// finite; any other under-observed metric falls back to
/// `{mean: 0, std: 0}`, the "no dispersion observed" sentinel.
pub fn compute_baseline(
    records: &[DailyRecord],
    metrics: &[String],
) -> BTreeMap<String, BaselineStats> {
    let mut out = BTreeMap::new();

    for metric in metrics {
        let values: Vec<f64> = records.iter().filter_map(|r| r.number(metric)).collect();
        out.insert(metric.clone(), stats_for(metric, &values));
    }

    out
}

fn stats_for(metric: &str, values: &[f64]) -> BaselineStats {
    let is_crash_flag = metric.eq_ignore_ascii_case("crash");

    if values.len() < 2 {
        return if is_crash_flag {
            BaselineStats { mean: 0.0, std: 1.0 }
        } else {
            BaselineStats { mean: 0.0, std: 0.0 }
        };
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();

    if std == 0.0 && is_crash_flag {
        // A flag that never fired still needs a usable scale.
        return BaselineStats { mean: 0.0, std: 1.0 };
    }

    BaselineStats { mean, std }
}
