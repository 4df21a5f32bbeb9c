//! Superposed epoch aggregation.
//!
//! Averages z-scores across all epochs at each relative offset,
//! producing one mean/std/n profile per metric. Offsets that no epoch
//! contributes to yield the zero profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{EPOCH_PRE_DAYS, EPOCH_WINDOW_LEN};

use super::epoch::Epoch;

/// Aggregated z-score statistics at one offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OffsetStats {
    /// Mean z-score across contributing epochs.
    pub mean: f64,
    /// Population standard deviation of the z-scores.
    pub std: f64,
    /// Number of contributing epochs.
    pub n: usize,
}

/// The superposed epoch analysis output: per metric, one
/// [`OffsetStats`] for every offset in the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedProfile {
    profiles: BTreeMap<String, Vec<OffsetStats>>,
}

impl AggregatedProfile {
    /// Stats for a metric at a given day offset (−7..=+14).
    pub fn stats(&self, metric: &str, offset: i64) -> OffsetStats {
        let idx = (offset + EPOCH_PRE_DAYS) as usize;
        self.profiles
            .get(metric)
            .and_then(|row| row.get(idx))
            .copied()
            .unwrap_or_default()
    }

    /// Mean z-score for a metric at a given offset.
    pub fn mean_z(&self, metric: &str, offset: i64) -> f64 {
        self.stats(metric, offset).mean
    }
}

/// Aggregate z-scores across all epochs at each offset.
pub fn aggregate_epochs(epochs: &[Epoch], metrics: &[String]) -> AggregatedProfile {
    let mut profiles = BTreeMap::new();

    for metric in metrics {
        let mut row = Vec::with_capacity(EPOCH_WINDOW_LEN);

        for slot in 0..EPOCH_WINDOW_LEN {
            let offset = slot as i64 - EPOCH_PRE_DAYS;
            let zs: Vec<f64> = epochs
                .iter()
                .filter_map(|e| e.day_at(offset).and_then(|d| d.z(metric)))
                .collect();

            row.push(offset_stats(&zs));
        }

        profiles.insert(metric.clone(), row);
    }

    AggregatedProfile { profiles }
}

fn offset_stats(zs: &[f64]) -> OffsetStats {
    if zs.is_empty() {
        return OffsetStats::default();
    }
    let n = zs.len() as f64;
    let mean = zs.iter().sum::<f64>() / n;
    let mean_sq = zs.iter().map(|z| z * z).sum::<f64>() / n;
    let std = (mean_sq - mean * mean).max(0.0).sqrt();
    OffsetStats {
        mean,
        std,
        n: zs.len(),
    }
}
