//! Symptom-cycle (PEM) engine.
//!
//! Given daily records with binary crash flags, the engine aligns
//! fixed windows around each crash onset and aggregates them
//! (superposed epoch analysis) so that a signal obscured by noise in
//! any one episode becomes visible across many:
//!
//! 1. **Epochs** ([`epoch`]): window extraction and baseline-relative
//!    z-scoring
//! 2. **Aggregation** ([`aggregate`]): per-offset mean/std/n profiles
//! 3. **Phases**: pre-crash trigger scan ([`buildup`]), crash
//!    duration/impact classification ([`event`]), recovery hysteresis
//!    ([`recovery`])

mod aggregate;
mod buildup;
mod discovery;
mod epoch;
mod event;
mod recovery;

pub use aggregate::{aggregate_epochs, AggregatedProfile, OffsetStats};
pub use buildup::BuildupReport;
pub use discovery::{Discovery, DiscoveryKind, TriggerClass};
pub use epoch::{detect_crash_onsets, extract_epochs, Epoch, EpochDay};
pub use event::{CrashEventReport, EventType};
pub use recovery::{RecoveryLag, RecoveryReport};

use serde::{Deserialize, Serialize};

use crate::config::CycleConfig;
use crate::series::MetricSeries;
use crate::stats::compute_baseline;
use crate::types::DailyRecord;

/// Result of a full symptom-cycle analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PemAnalysis {
    /// The history contains no crash-flagged days; nothing to analyze.
    NoCrashes,
    /// At least one crash episode was found and profiled.
    Episodes(PemReport),
}

impl PemAnalysis {
    /// The report, if any episodes were found.
    pub fn report(&self) -> Option<&PemReport> {
        match self {
            PemAnalysis::NoCrashes => None,
            PemAnalysis::Episodes(report) => Some(report),
        }
    }
}

/// The three phase reports over all detected crash episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PemReport {
    /// Number of crash onsets found in the series.
    pub episode_count: usize,
    /// Pre-crash buildup triggers.
    pub buildup: BuildupReport,
    /// Crash-event duration and impact classification.
    pub crash_event: CrashEventReport,
    /// Recovery-lag hysteresis.
    pub recovery: RecoveryReport,
}

/// Run the full symptom-cycle pipeline over a record series.
///
/// History may arrive unsorted; it is sorted by date before use.
/// Returns [`PemAnalysis::NoCrashes`] without further computation when
/// no day carries a crash flag.
pub fn analyze_cycles(history: &[DailyRecord], config: &CycleConfig) -> PemAnalysis {
    let mut records: Vec<DailyRecord> = history.to_vec();
    records.sort_by_key(|r| r.date);

    let onsets = detect_crash_onsets(&records);
    if onsets.is_empty() {
        return PemAnalysis::NoCrashes;
    }

    let series = MetricSeries::coerced(&records);
    let baselines = compute_baseline(&records, series.metrics());
    let epochs = extract_epochs(&records, &series, &onsets, &baselines);
    let profile = aggregate_epochs(&epochs, series.metrics());

    let buildup = buildup::analyze_buildup(
        &profile,
        series.metrics(),
        &baselines,
        epochs.len(),
        config,
    );
    let crash_event = event::analyze_crash_events(&epochs, series.metrics(), config);
    let recovery = recovery::analyze_recovery(&epochs, series.metrics(), config);

    PemAnalysis::Episodes(PemReport {
        episode_count: epochs.len(),
        buildup,
        crash_event,
        recovery,
    })
}
