//! Pre-crash buildup analysis: single-metric trigger scan plus the
//! pairwise synergy scan.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::CycleConfig;
use crate::constants::is_input_metric;
use crate::types::BaselineStats;

use super::aggregate::AggregatedProfile;
use super::discovery::{filter_redundant, rectified, Discovery, DiscoveryKind, TriggerClass};

/// Earliest offset the buildup scan considers.
const SCAN_START: i64 = -7;

/// Buildup triggers detected before crash onsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildupReport {
    /// Accepted trigger discoveries, strongest first.
    pub discoveries: Vec<Discovery>,
    /// Overall confidence in the buildup phase, in [0, 1]: grows with
    /// episode count and with the strength of the top discovery.
    pub confidence: f64,
    /// Whether the five pre-crash days show elevated average exertion
    /// or steps, suggesting cumulative load rather than a single
    /// trigger.
    pub cumulative_load: bool,
}

impl BuildupReport {
    /// One-line plain-text summary.
    pub fn summary(&self) -> String {
        format!(
            "{} trigger(s), confidence {:.0}%{}",
            self.discoveries.len(),
            self.confidence * 100.0,
            if self.cumulative_load {
                ", cumulative load"
            } else {
                ""
            }
        )
    }
}

/// Scan the aggregated profile for buildup triggers.
pub fn analyze_buildup(
    profile: &AggregatedProfile,
    metrics: &[String],
    baselines: &BTreeMap<String, BaselineStats>,
    episode_count: usize,
    config: &CycleConfig,
) -> BuildupReport {
    let mut discoveries = Vec::new();

    for metric in metrics {
        if let Some(found) = scan_single(profile, metric, baselines.get(metric), config) {
            discoveries.push(found);
        }
    }

    // Pairwise combinatorial scan. Quadratic in metric count; fine for
    // the dozens of metrics a personal log carries.
    for (i, a) in metrics.iter().enumerate() {
        for b in metrics.iter().skip(i + 1) {
            if let Some(found) = scan_pair(profile, a, b, config) {
                discoveries.push(found);
            }
        }
    }

    let discoveries = filter_redundant(discoveries);

    let top_magnitude = discoveries.first().map(|d| d.magnitude).unwrap_or(0.0);
    let episode_term =
        (episode_count as f64 / config.confidence_episode_scale as f64).min(1.0);
    let magnitude_term = (top_magnitude / config.confidence_magnitude_scale).min(1.0);
    let confidence = 0.4 * episode_term + 0.6 * magnitude_term;

    let cumulative_load = detect_cumulative_load(profile, metrics, config);

    BuildupReport {
        discoveries,
        confidence,
        cumulative_load,
    }
}

/// Last offset a metric may trigger at: input-type metrics (things the
/// user does) may trigger on the crash day itself; symptom/output
/// metrics at day 0 would be circular and only count strictly before.
fn scan_end(metric: &str) -> i64 {
    if is_input_metric(metric) {
        0
    } else {
        -1
    }
}

fn scan_single(
    profile: &AggregatedProfile,
    metric: &str,
    baseline: Option<&BaselineStats>,
    config: &CycleConfig,
) -> Option<Discovery> {
    let end = scan_end(metric);
    let qualifying: Vec<(i64, f64)> = (SCAN_START..=end)
        .map(|off| (off, profile.mean_z(metric, off)))
        .filter(|(_, z)| z.abs() > config.trigger_threshold)
        .collect();

    let &(peak_offset, peak_z) = qualifying
        .iter()
        .max_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap_or(std::cmp::Ordering::Equal))?;

    let (window_start, window_end) = contiguous_window(&qualifying, peak_offset);

    let pct_change = baseline
        .filter(|b| b.mean != 0.0 && b.std > 0.0)
        .map(|b| peak_z * b.std / b.mean * 100.0)
        .unwrap_or(0.0);

    Some(Discovery {
        metric: metric.to_string(),
        kind: if peak_z > 0.0 {
            DiscoveryKind::Spike
        } else {
            DiscoveryKind::Drop
        },
        magnitude: peak_z.abs(),
        pct_change,
        lead_days_start: -window_start,
        lead_days_end: -window_end,
        classification: classify(peak_offset, window_start, window_end),
        is_synergy: false,
    })
}

fn scan_pair(
    profile: &AggregatedProfile,
    a: &str,
    b: &str,
    config: &CycleConfig,
) -> Option<Discovery> {
    // Offset 0 only when both members are input-type.
    let end = scan_end(a).min(scan_end(b));

    // Joint z rectified to strain-positive before combining, so an
    // exertion spike and an HRV drop reinforce instead of cancel.
    let joint: Vec<(i64, f64, f64, f64)> = (SCAN_START..=end)
        .map(|off| {
            let za = profile.mean_z(a, off);
            let zb = profile.mean_z(b, off);
            let joint = (rectified(a, za) + rectified(b, zb)) / std::f64::consts::SQRT_2;
            (off, joint, za, zb)
        })
        .collect();

    let qualifying: Vec<(i64, f64)> = joint
        .iter()
        .filter(|(_, j, _, _)| *j > config.pair_threshold)
        .map(|(off, j, _, _)| (*off, *j))
        .collect();

    let &(peak_offset, peak_joint) = qualifying
        .iter()
        .max_by(|x, y| x.1.partial_cmp(&y.1).unwrap_or(std::cmp::Ordering::Equal))?;

    // True synergy only: the pair must beat its dominant member.
    let (_, _, za, zb) = joint
        .iter()
        .find(|(off, _, _, _)| *off == peak_offset)
        .copied()?;
    if peak_joint < config.synergy_dominance * za.abs().max(zb.abs()) {
        return None;
    }

    let (window_start, window_end) = contiguous_window(&qualifying, peak_offset);

    Some(Discovery {
        metric: format!("{a} + {b}"),
        kind: DiscoveryKind::Spike,
        magnitude: peak_joint,
        pct_change: 0.0,
        lead_days_start: -window_start,
        lead_days_end: -window_end,
        classification: classify(peak_offset, window_start, window_end),
        is_synergy: true,
    })
}

/// Contiguous run of qualifying offsets containing the peak.
fn contiguous_window(qualifying: &[(i64, f64)], peak: i64) -> (i64, i64) {
    let mut start = peak;
    let mut end = peak;
    while qualifying.iter().any(|(off, _)| *off == start - 1) {
        start -= 1;
    }
    while qualifying.iter().any(|(off, _)| *off == end + 1) {
        end += 1;
    }
    (start, end)
}

fn classify(peak_offset: i64, window_start: i64, window_end: i64) -> TriggerClass {
    let span = window_end - window_start + 1;
    if peak_offset == 0 {
        TriggerClass::Acute
    } else if span >= 3 {
        TriggerClass::Cumulative
    } else if peak_offset >= -2 {
        TriggerClass::Lagged
    } else {
        TriggerClass::Historical
    }
}

/// Average z of exertion/steps metrics over the five pre-crash days.
fn detect_cumulative_load(
    profile: &AggregatedProfile,
    metrics: &[String],
    config: &CycleConfig,
) -> bool {
    metrics
        .iter()
        .filter(|m| {
            let lower = m.to_lowercase();
            lower.contains("exertion") || lower.contains("step")
        })
        .any(|metric| {
            let avg: f64 =
                (-5..=-1).map(|off| profile.mean_z(metric, off)).sum::<f64>() / 5.0;
            avg > config.cumulative_load_threshold
        })
}
