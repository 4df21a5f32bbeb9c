//! Configuration for the impact and cycle engines.
//!
//! Both engines are pure functions; every tunable threshold lives here
//! and is passed in explicitly, so callers (and tests) can substitute
//! deterministic settings.

/// Configuration for the experiment impact engine.
#[derive(Debug, Clone)]
pub struct ImpactConfig {
    /// Minimum days of history required before any regression runs.
    /// Default: 14.
    pub min_history_days: usize,

    /// Minimum valid (metric-present) rows required per metric.
    /// Default: 10.
    pub min_rows: usize,

    /// Two-tailed significance level for calling an impact
    /// positive/negative. Default: 0.05.
    pub alpha: f64,

    /// Width of the local pre-intervention baseline window in days.
    /// Default: 90.
    pub baseline_window_days: i64,

    /// Minimum points required in the local baseline window before
    /// falling back to all data before the start date. Default: 5.
    pub baseline_min_points: usize,

    /// Name of the metric used as the lagged exertion confound.
    /// Default: "exertion".
    pub exertion_metric: String,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            min_history_days: 14,
            min_rows: 10,
            alpha: 0.05,
            baseline_window_days: 90,
            baseline_min_points: 5,
            exertion_metric: "exertion".to_string(),
        }
    }
}

impl ImpactConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the significance level.
    pub fn alpha(mut self, alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha < 1.0, "alpha must be in (0, 1)");
        self.alpha = alpha;
        self
    }

    /// Set the minimum days of history.
    pub fn min_history_days(mut self, days: usize) -> Self {
        assert!(days > 0, "min_history_days must be positive");
        self.min_history_days = days;
        self
    }

    /// Set the minimum valid rows per metric.
    pub fn min_rows(mut self, rows: usize) -> Self {
        assert!(rows >= 3, "min_rows must be at least 3");
        self.min_rows = rows;
        self
    }

    /// Set the exertion confound metric name.
    pub fn exertion_metric(mut self, name: &str) -> Self {
        self.exertion_metric = name.to_string();
        self
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.alpha <= 0.0 || self.alpha >= 1.0 {
            return Err("alpha must be in (0, 1)".to_string());
        }
        if self.min_rows < 3 {
            return Err("min_rows must be at least 3".to_string());
        }
        if self.baseline_window_days <= 0 {
            return Err("baseline_window_days must be positive".to_string());
        }
        Ok(())
    }
}

/// Configuration for the symptom-cycle (PEM) engine.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Absolute aggregated z-score required for a single metric to
    /// count as a buildup trigger. Default: 2.0.
    pub trigger_threshold: f64,

    /// Absolute joint z-score required for a metric pair to count as
    /// a synergy trigger. Default: 2.2.
    pub pair_threshold: f64,

    /// A pair is only a true synergy when its joint z exceeds this
    /// multiple of the stronger member's own z. Default: 1.1.
    pub synergy_dominance: f64,

    /// Absolute z-score at which a metric counts as straining during
    /// the crash and recovery phases. Default: 1.0.
    pub strain_threshold: f64,

    /// Average per-episode peak magnitude required for a crash-phase
    /// impact discovery. Default: 1.3.
    pub peak_threshold: f64,

    /// Fraction of episodes a metric must extend past the logged
    /// window in before being reported as an extender. Default: 0.4.
    pub extender_share: f64,

    /// Mean logged duration (days) separating an acute impact from a
    /// sustained episode. Default: 3.0.
    pub sustained_cutoff_days: f64,

    /// Average recovery lag (days) below which a metric is not worth
    /// reporting as a slow recoverer. Default: 0.5.
    pub recovery_report_floor: f64,

    /// Sigma threshold on the 5-day pre-crash exertion/steps average
    /// for flagging cumulative load. Default: 0.6.
    pub cumulative_load_threshold: f64,

    /// Episode count at which the episode term of the confidence score
    /// saturates. Default: 8.
    pub confidence_episode_scale: usize,

    /// Magnitude at which the discovery term of the confidence score
    /// saturates. Default: 4.0.
    pub confidence_magnitude_scale: f64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            trigger_threshold: 2.0,
            pair_threshold: 2.2,
            synergy_dominance: 1.1,
            strain_threshold: 1.0,
            peak_threshold: 1.3,
            extender_share: 0.4,
            sustained_cutoff_days: 3.0,
            recovery_report_floor: 0.5,
            cumulative_load_threshold: 0.6,
            confidence_episode_scale: 8,
            confidence_magnitude_scale: 4.0,
        }
    }
}

impl CycleConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stricter preset: higher trigger thresholds, fewer but more
    /// defensible discoveries.
    pub fn strict() -> Self {
        Self {
            trigger_threshold: 2.5,
            pair_threshold: 2.8,
            peak_threshold: 1.6,
            ..Default::default()
        }
    }

    /// A lenient preset for sparse histories: lower thresholds surface
    /// weaker candidate patterns.
    pub fn lenient() -> Self {
        Self {
            trigger_threshold: 1.6,
            pair_threshold: 1.8,
            peak_threshold: 1.1,
            ..Default::default()
        }
    }

    /// Set the single-metric trigger threshold.
    pub fn trigger_threshold(mut self, sigma: f64) -> Self {
        assert!(sigma > 0.0, "trigger_threshold must be positive");
        self.trigger_threshold = sigma;
        self
    }

    /// Set the strain threshold used by the crash and recovery phases.
    pub fn strain_threshold(mut self, sigma: f64) -> Self {
        assert!(sigma > 0.0, "strain_threshold must be positive");
        self.strain_threshold = sigma;
        self
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.trigger_threshold <= 0.0 {
            return Err("trigger_threshold must be positive".to_string());
        }
        if self.synergy_dominance < 1.0 {
            return Err("synergy_dominance must be at least 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.extender_share) {
            return Err("extender_share must be in [0, 1]".to_string());
        }
        Ok(())
    }
}
