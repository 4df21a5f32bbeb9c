//! Crash-event analysis: duration accounting, extending metrics, and
//! during-crash impact discoveries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::CycleConfig;
use crate::constants::EPOCH_POST_DAYS;

use super::discovery::{filter_redundant, is_straining, Discovery, DiscoveryKind, TriggerClass};
use super::epoch::Epoch;

/// Overall shape of the user's crash episodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// Episodes are short: average logged duration under the cutoff.
    AcuteImpact,
    /// Episodes run long: average logged duration at or above it.
    SustainedEpisode,
}

/// Crash-event phase report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashEventReport {
    /// Acute vs sustained classification of the episodes overall.
    pub event_type: EventType,
    /// Mean days per episode explicitly flagged as crash.
    pub avg_logged_duration: f64,
    /// Mean days per episode where any metric was still straining or
    /// the day was flagged.
    pub avg_physiological_duration: f64,
    /// Metrics still straining past the manually flagged window in a
    /// meaningful share of episodes.
    pub extending_metrics: Vec<String>,
    /// Metrics whose average per-episode peak deviation is large
    /// enough to report.
    pub discoveries: Vec<Discovery>,
}

impl CrashEventReport {
    /// One-line plain-text summary.
    pub fn summary(&self) -> String {
        let label = match self.event_type {
            EventType::AcuteImpact => "acute impact",
            EventType::SustainedEpisode => "sustained episode",
        };
        format!(
            "{label}: logged {:.1}d, physiological {:.1}d",
            self.avg_logged_duration, self.avg_physiological_duration
        )
    }
}

/// Per-episode accounting of one crash window.
struct EpisodeWalk {
    logged_days: usize,
    physiological_days: usize,
    /// Metrics straining on days past the flagged window.
    extenders: Vec<String>,
    /// Signed z at each metric's peak magnitude during the episode.
    peaks: BTreeMap<String, f64>,
}

/// Analyze the crash windows of every epoch.
pub fn analyze_crash_events(
    epochs: &[Epoch],
    metrics: &[String],
    config: &CycleConfig,
) -> CrashEventReport {
    let walks: Vec<EpisodeWalk> = epochs
        .iter()
        .map(|epoch| walk_episode(epoch, metrics, config))
        .collect();

    let n = walks.len().max(1) as f64;
    let avg_logged_duration =
        walks.iter().map(|w| w.logged_days as f64).sum::<f64>() / n;
    let avg_physiological_duration =
        walks.iter().map(|w| w.physiological_days as f64).sum::<f64>() / n;

    let event_type = if avg_logged_duration < config.sustained_cutoff_days {
        EventType::AcuteImpact
    } else {
        EventType::SustainedEpisode
    };

    // Extenders reported when present in enough episodes.
    let mut extender_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for walk in &walks {
        for metric in &walk.extenders {
            *extender_counts.entry(metric).or_default() += 1;
        }
    }
    let min_episodes = (config.extender_share * walks.len() as f64).ceil() as usize;
    let extending_metrics: Vec<String> = extender_counts
        .iter()
        .filter(|(_, count)| **count >= min_episodes.max(1))
        .map(|(metric, _)| metric.to_string())
        .collect();

    // During-crash impact discoveries: average peak magnitude per
    // metric across episodes.
    let mut discoveries = Vec::new();
    for metric in metrics {
        let peaks: Vec<f64> = walks
            .iter()
            .filter_map(|w| w.peaks.get(metric))
            .copied()
            .collect();
        if peaks.is_empty() {
            continue;
        }
        let avg_magnitude =
            peaks.iter().map(|z| z.abs()).sum::<f64>() / peaks.len() as f64;
        if avg_magnitude <= config.peak_threshold {
            continue;
        }
        let avg_signed = peaks.iter().sum::<f64>() / peaks.len() as f64;

        discoveries.push(Discovery {
            metric: metric.clone(),
            kind: if avg_signed >= 0.0 {
                DiscoveryKind::Spike
            } else {
                DiscoveryKind::Drop
            },
            magnitude: avg_magnitude,
            pct_change: 0.0,
            lead_days_start: 0,
            lead_days_end: 0,
            classification: TriggerClass::Acute,
            is_synergy: false,
        });
    }

    CrashEventReport {
        event_type,
        avg_logged_duration,
        avg_physiological_duration,
        extending_metrics,
        discoveries: filter_redundant(discoveries),
    }
}

/// Walk offsets 0..=14 of one epoch, stopping after two consecutive
/// days that are neither straining nor flagged (a tail buffer against
/// premature cutoff on a single good day).
fn walk_episode(epoch: &Epoch, metrics: &[String], config: &CycleConfig) -> EpisodeWalk {
    let mut logged_days = 0;
    let mut physiological_days = 0;
    let mut calm_streak = 0;
    let mut extenders: Vec<String> = Vec::new();
    let mut peaks: BTreeMap<String, f64> = BTreeMap::new();
    let mut last_flagged: i64 = -1;

    for offset in 0..=EPOCH_POST_DAYS {
        let Some(day) = epoch.day_at(offset) else {
            break;
        };

        let straining: Vec<&String> = metrics
            .iter()
            .filter(|m| {
                day.z(m)
                    .map(|z| is_straining(m, z, config.strain_threshold))
                    .unwrap_or(false)
            })
            .collect();

        for metric in metrics {
            if let Some(z) = day.z(metric) {
                let entry = peaks.entry(metric.clone()).or_insert(0.0);
                if z.abs() > entry.abs() {
                    *entry = z;
                }
            }
        }

        if day.crash_flagged {
            logged_days += 1;
            last_flagged = offset;
        }

        if day.crash_flagged || !straining.is_empty() {
            physiological_days = (offset + 1) as usize;
            calm_streak = 0;
        } else {
            calm_streak += 1;
            if calm_streak >= 2 {
                break;
            }
        }

        // Past the flagged window but still straining: these metrics
        // are extending the episode.
        if !day.crash_flagged && offset > last_flagged {
            for metric in straining {
                if !extenders.contains(metric) {
                    extenders.push(metric.clone());
                }
            }
        }
    }

    EpisodeWalk {
        logged_days,
        physiological_days,
        extenders,
        peaks,
    }
}
