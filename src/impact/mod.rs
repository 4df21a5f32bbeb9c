//! Experiment impact engine.
//!
//! Isolates the independent effect of possibly-overlapping
//! interventions on every discovered health metric:
//!
//! 1. **Design** ([`design`]): response/design-matrix assembly over
//!    the closed metric table, degenerate-column cleaning
//! 2. **Regression** ([`regression`]): normal-equation OLS with
//!    Newey-West HAC standard errors
//! 3. **Classification** (here): p-values, significance direction,
//!    Cohen effect sizes, and baseline-relative shift metrics
//!
//! The engine is a pure function: records and interventions in,
//! reports out. Units of analysis that are statistically infeasible
//! (too little data, singular designs) are skipped silently; the
//! absence of a result is the signal.

mod design;
mod regression;

pub use design::{CleanDesign, ColumnRole};
pub use regression::{fit_ols, newey_west_standard_errors, OlsFit};

use serde::{Deserialize, Serialize};

use crate::config::ImpactConfig;
use crate::series::MetricSeries;
use crate::stats::two_tailed_p_value;
use crate::types::{BaselineStats, DailyRecord, DirectionRegistry, Direction, Intervention};

/// Direction of a statistically significant impact, resolved against
/// the metric's improvement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    /// The intervention moved the metric in its better direction.
    Positive,
    /// The intervention moved the metric in its worse direction.
    Negative,
    /// No significant effect at the configured level.
    Neutral,
}

/// Cohen effect-size class of a significant impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSize {
    /// p-value did not clear the significance level.
    NotSignificant,
    /// Standardized shift below 0.5 sigma.
    Small,
    /// Standardized shift in [0.5, 0.8) sigma.
    Medium,
    /// Standardized shift of at least 0.8 sigma.
    Large,
}

/// The estimated effect of one intervention on one metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricImpact {
    /// Metric name as discovered from the records.
    pub metric: String,
    /// OLS coefficient: the additive shift attributed to the
    /// intervention, in the metric's own units.
    pub coefficient: f64,
    /// Newey-West HAC standard error of the coefficient.
    pub standard_error: f64,
    /// t statistic (`coefficient / standard_error`).
    pub t_stat: f64,
    /// Residual degrees of freedom (`n - k`).
    pub df: usize,
    /// Two-tailed Student-t p-value.
    pub p_value: f64,
    /// Coefficient expressed in local-baseline standard deviations.
    pub z_score_shift: f64,
    /// Coefficient as a percentage of the local-baseline mean.
    pub percent_change: f64,
    /// Resolved significance direction.
    pub significance: Significance,
    /// Cohen effect-size class.
    pub effect_size: EffectSize,
}

/// All estimated impacts for one intervention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactReport {
    /// The intervention's opaque identifier.
    pub intervention_id: String,
    /// The intervention's display name.
    pub intervention_name: String,
    /// Per-metric impacts, in metric discovery order. Metrics the
    /// intervention could not be estimated for are simply absent.
    pub impacts: Vec<MetricImpact>,
}

impl ImpactReport {
    /// Impacts that cleared the significance level.
    pub fn significant(&self) -> impl Iterator<Item = &MetricImpact> {
        self.impacts
            .iter()
            .filter(|i| i.significance != Significance::Neutral)
    }

    /// One-line plain-text summary.
    pub fn summary(&self) -> String {
        let significant = self.significant().count();
        format!(
            "{}: {} metric(s) analyzed, {} significant",
            self.intervention_name,
            self.impacts.len(),
            significant
        )
    }
}

/// Analyze the independent impact of each intervention on every
/// discovered metric.
///
/// Returns one report per intervention, in input order. The whole
/// result is empty when fewer than the configured minimum days of
/// history exist or when no metric survives discovery. History may
/// arrive unsorted; it is sorted by date before use.
pub fn analyze_impacts(
    interventions: &[Intervention],
    history: &[DailyRecord],
    registry: &DirectionRegistry,
    config: &ImpactConfig,
) -> Vec<ImpactReport> {
    let mut records: Vec<DailyRecord> = history.to_vec();
    records.sort_by_key(|r| r.date);

    if records.len() < config.min_history_days || interventions.is_empty() {
        return Vec::new();
    }

    let series = MetricSeries::strict(&records);
    if series.metrics().is_empty() {
        return Vec::new();
    }

    let mut reports: Vec<ImpactReport> = interventions
        .iter()
        .map(|iv| ImpactReport {
            intervention_id: iv.id.clone(),
            intervention_name: iv.name.clone(),
            impacts: Vec::new(),
        })
        .collect();

    for metric in series.metrics() {
        let Some(clean) =
            design::build_clean_design(&records, &series, metric, interventions, config)
        else {
            continue;
        };

        let Some(fit) = fit_ols(&clean.x, &clean.y) else {
            continue;
        };
        let se = newey_west_standard_errors(&clean.x, &clean.y, &fit);

        let n = clean.y.len();
        let k = clean.x.ncols();
        let df = n.saturating_sub(k);

        for (col, role) in clean.roles.iter().enumerate() {
            let ColumnRole::Intervention(iv_index) = role else {
                continue;
            };
            let coefficient = fit.beta[col];
            let standard_error = se[col];
            // A zero standard error means a perfectly noiseless fit:
            // no finite t statistic exists, so the pairing is skipped
            // like any other infeasible unit. Also rejects NaN.
            if !(standard_error > 0.0) || !coefficient.is_finite() {
                continue;
            }

            let t_stat = coefficient / standard_error;
            let p_value = two_tailed_p_value(t_stat, df as f64);

            let baseline =
                local_baseline(&records, &series, metric, &interventions[*iv_index], config);
            let z_score_shift = coefficient / baseline.std;
            let percent_change = if baseline.mean != 0.0 {
                coefficient / baseline.mean * 100.0
            } else {
                0.0
            };

            let direction = registry.direction_of(metric);
            let significance = classify_significance(coefficient, p_value, direction, config.alpha);
            let effect_size = classify_effect_size(z_score_shift, p_value, config.alpha);

            reports[*iv_index].impacts.push(MetricImpact {
                metric: metric.clone(),
                coefficient,
                standard_error,
                t_stat,
                df,
                p_value,
                z_score_shift,
                percent_change,
                significance,
                effect_size,
            });
        }
    }

    reports
}

/// Resolve the significance direction of a coefficient.
fn classify_significance(
    coefficient: f64,
    p_value: f64,
    direction: Direction,
    alpha: f64,
) -> Significance {
    if p_value >= alpha {
        return Significance::Neutral;
    }
    let improved = match direction {
        Direction::HigherIsBetter => coefficient > 0.0,
        Direction::LowerIsBetter => coefficient < 0.0,
    };
    if improved {
        Significance::Positive
    } else {
        Significance::Negative
    }
}

/// Cohen effect-size class from the standardized shift; only assigned
/// to significant results.
fn classify_effect_size(z_shift: f64, p_value: f64, alpha: f64) -> EffectSize {
    if p_value >= alpha {
        return EffectSize::NotSignificant;
    }
    let magnitude = z_shift.abs();
    if magnitude < 0.5 {
        EffectSize::Small
    } else if magnitude < 0.8 {
        EffectSize::Medium
    } else {
        EffectSize::Large
    }
}

/// Baseline for z-shift and percent-change of one intervention/metric
/// pairing.
///
/// Prefers the 90-day window immediately preceding the intervention's
/// start; falls back to all data before the start when the window is
/// too sparse, and finally to `{mean: 1, std: 1}` (which also guards
/// the divisions above) when even that is insufficient or flat.
fn local_baseline(
    records: &[DailyRecord],
    series: &MetricSeries,
    metric: &str,
    intervention: &Intervention,
    config: &ImpactConfig,
) -> BaselineStats {
    let start = intervention.start_date;
    let window_start = start - chrono::Duration::days(config.baseline_window_days);

    let windowed: Vec<f64> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.date >= window_start && r.date < start)
        .filter_map(|(idx, _)| series.value(metric, idx))
        .collect();

    let values = if windowed.len() >= config.baseline_min_points {
        windowed
    } else {
        records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.date < start)
            .filter_map(|(idx, _)| series.value(metric, idx))
            .collect()
    };

    if values.len() < config.baseline_min_points {
        return BaselineStats { mean: 1.0, std: 1.0 };
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();

    if std == 0.0 {
        return BaselineStats { mean: 1.0, std: 1.0 };
    }

    BaselineStats { mean, std }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_size_boundaries() {
        let alpha = 0.05;
        assert_eq!(classify_effect_size(2.0, 0.001, alpha), EffectSize::Large);
        assert_eq!(classify_effect_size(-0.9, 0.001, alpha), EffectSize::Large);
        assert_eq!(classify_effect_size(0.6, 0.001, alpha), EffectSize::Medium);
        assert_eq!(classify_effect_size(0.4, 0.01, alpha), EffectSize::Small);
        assert_eq!(classify_effect_size(0.1, 0.01, alpha), EffectSize::Small);
        assert_eq!(classify_effect_size(2.0, 0.2, alpha), EffectSize::NotSignificant);
    }

    #[test]
    fn significance_respects_direction() {
        let alpha = 0.05;
        assert_eq!(
            classify_significance(5.0, 0.01, Direction::HigherIsBetter, alpha),
            Significance::Positive
        );
        assert_eq!(
            classify_significance(5.0, 0.01, Direction::LowerIsBetter, alpha),
            Significance::Negative
        );
        assert_eq!(
            classify_significance(-5.0, 0.01, Direction::LowerIsBetter, alpha),
            Significance::Positive
        );
        assert_eq!(
            classify_significance(5.0, 0.5, Direction::HigherIsBetter, alpha),
            Significance::Neutral
        );
    }
}
