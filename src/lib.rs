//! # healthlens
//!
//! Causal and pattern analysis for personal health time series.
//!
//! The crate is a library of pure, deterministic data-in/report-out
//! functions over immutable arrays of daily records. It knows nothing
//! about storage, accounts, or rendering. Two engines:
//!
//! - **Experiment impact** ([`impact`]): isolates the independent
//!   effect of possibly-overlapping interventions (medications,
//!   supplements, lifestyle changes) on every tracked metric, using
//!   multivariate OLS with Newey-West HAC-robust inference.
//! - **Symptom cycle** ([`cycle`]): aligns fixed windows around each
//!   crash onset (superposed epoch analysis) to surface statistically
//!   reliable buildup triggers, crash-duration classification, and
//!   recovery hysteresis.
//!
//! ## Quick start
//!
//! ```ignore
//! use healthlens::{
//!     analyze_cycles, analyze_impacts, CycleConfig, DirectionRegistry,
//!     ImpactConfig, PemAnalysis,
//! };
//!
//! let registry = DirectionRegistry::with_defaults();
//! let reports = analyze_impacts(
//!     &interventions,
//!     &history,
//!     &registry,
//!     &ImpactConfig::default(),
//! );
//! for report in &reports {
//!     println!("{}", report.summary());
//! }
//!
//! match analyze_cycles(&history, &CycleConfig::default()) {
//!     PemAnalysis::NoCrashes => println!("no crash episodes yet"),
//!     PemAnalysis::Episodes(report) => {
//!         println!("{}", report.buildup.summary());
//!     }
//! }
//! ```
//!
//! ## Error model
//!
//! Nothing here throws on bad data. Units of analysis that are
//! statistically infeasible — too few observations, singular design
//! matrices, non-numeric values — are skipped silently: the absence of
//! a result is the signal, and "not enough data yet" messaging belongs
//! to the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod constants;
mod linalg;
mod series;
mod types;

// Engines
pub mod cycle;
pub mod impact;
pub mod stats;

// Re-exports for the public API
pub use config::{CycleConfig, ImpactConfig};
pub use constants::{EPOCH_POST_DAYS, EPOCH_PRE_DAYS, EPOCH_WINDOW_LEN};
pub use cycle::{
    analyze_cycles, AggregatedProfile, BuildupReport, CrashEventReport, Discovery,
    DiscoveryKind, Epoch, EventType, OffsetStats, PemAnalysis, PemReport, RecoveryLag,
    RecoveryReport, TriggerClass,
};
pub use impact::{
    analyze_impacts, EffectSize, ImpactReport, MetricImpact, Significance,
};
pub use series::MetricSeries;
pub use types::{
    BaselineStats, DailyRecord, Direction, DirectionRegistry, Intervention, MetricValue,
};
