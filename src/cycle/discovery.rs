//! Discovery records and the shared strain-polarity and redundancy
//! rules used by all three phase analyzers.

use serde::{Deserialize, Serialize};

use crate::constants::are_synonyms;

/// Direction of a detected deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryKind {
    /// The metric rose above its baseline.
    Spike,
    /// The metric fell below its baseline.
    Drop,
}

/// Temporal classification of a buildup trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerClass {
    /// Peaks on the crash day itself.
    Acute,
    /// Peaks one or two days before the crash.
    Lagged,
    /// Peaks three or more days before the crash.
    Historical,
    /// Sustained across three or more consecutive pre-crash days.
    Cumulative,
}

/// One detected trigger or impact pattern. May describe a single
/// metric or a labeled pairwise combination (`"metricA + metricB"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discovery {
    /// Metric name, or `"A + B"` for a synergy pair.
    pub metric: String,
    /// Direction of the deviation at the peak.
    pub kind: DiscoveryKind,
    /// Absolute z magnitude at the peak.
    pub magnitude: f64,
    /// Peak deviation as a percentage of the baseline mean, when the
    /// baseline supports it; 0 otherwise.
    pub pct_change: f64,
    /// Start of the significant window, in days before the crash.
    pub lead_days_start: i64,
    /// End of the significant window, in days before the crash.
    pub lead_days_end: i64,
    /// Temporal classification.
    pub classification: TriggerClass,
    /// Whether this is a pairwise synergy rather than a single metric.
    pub is_synergy: bool,
}

/// Sign with which a metric strains: +1 when high values are bad,
/// −1 when low values are bad.
///
/// HRV-type metrics strain low; heart-rate, score, and exertion-type
/// metrics strain high; unrecognized metrics default to
/// higher-is-worse. The hrv check runs first so "hrv" never matches
/// the "hr" fragment.
pub fn strain_sign(metric: &str) -> f64 {
    let lower = metric.to_lowercase();
    if lower.contains("hrv") || lower.contains("heart rate variability") {
        -1.0
    } else {
        1.0
    }
}

/// Whether a z-score counts as a straining deviation for this metric
/// at the given threshold.
pub fn is_straining(metric: &str, z: f64, threshold: f64) -> bool {
    z * strain_sign(metric) > threshold
}

/// Rectify a z-score so that strain is always positive, letting the
/// pairwise scanner combine adverse signals of opposite raw sign.
pub fn rectified(metric: &str, z: f64) -> f64 {
    z * strain_sign(metric)
}

/// Drop discoveries that restate an already-accepted, stronger one.
///
/// Candidates are ranked by magnitude; a candidate is rejected when an
/// accepted discovery names the same metric, a registered synonym, or
/// a component subset/superset of it (a pair subsumes its members and
/// vice versa) and the accepted magnitude is within 20% of the
/// candidate's. This prevents reporting both "steps" and
/// "steps + exertion" when one subsumes the other.
pub fn filter_redundant(mut discoveries: Vec<Discovery>) -> Vec<Discovery> {
    discoveries.sort_by(|a, b| {
        b.magnitude
            .partial_cmp(&a.magnitude)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut accepted: Vec<Discovery> = Vec::new();
    for candidate in discoveries {
        let redundant = accepted.iter().any(|existing| {
            related_metrics(&existing.metric, &candidate.metric)
                && existing.magnitude >= 0.8 * candidate.magnitude
        });
        if !redundant {
            accepted.push(candidate);
        }
    }

    accepted
}

/// Whether two discovery labels describe overlapping signals: equal,
/// synonyms, or one's component set contained in the other's.
fn related_metrics(a: &str, b: &str) -> bool {
    let parts_a: Vec<&str> = a.split(" + ").map(str::trim).collect();
    let parts_b: Vec<&str> = b.split(" + ").map(str::trim).collect();

    let contained = |small: &[&str], big: &[&str]| {
        small
            .iter()
            .all(|s| big.iter().any(|t| are_synonyms(s, t)))
    };

    contained(&parts_a, &parts_b) || contained(&parts_b, &parts_a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery(metric: &str, magnitude: f64) -> Discovery {
        Discovery {
            metric: metric.to_string(),
            kind: DiscoveryKind::Spike,
            magnitude,
            pct_change: 0.0,
            lead_days_start: 1,
            lead_days_end: 1,
            classification: TriggerClass::Lagged,
            is_synergy: metric.contains(" + "),
        }
    }

    #[test]
    fn hrv_strains_low_everything_else_high() {
        assert!(is_straining("hrv", -1.5, 1.0));
        assert!(!is_straining("hrv", 1.5, 1.0));
        assert!(is_straining("heart_rate", 1.5, 1.0));
        assert!(is_straining("symptom_score", 1.5, 1.0));
        assert!(is_straining("exertion", 1.5, 1.0));
        // Unrecognized metrics default to higher-is-worse.
        assert!(is_straining("mystery", 1.5, 1.0));
        assert!(!is_straining("mystery", -1.5, 1.0));
    }

    #[test]
    fn rectification_flips_hrv_only() {
        assert_eq!(rectified("hrv", -2.0), 2.0);
        assert_eq!(rectified("steps", 2.0), 2.0);
    }

    #[test]
    fn pair_subsumed_by_stronger_member() {
        let out = filter_redundant(vec![
            discovery("steps", 3.0),
            discovery("steps + exertion", 2.8),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].metric, "steps");
    }

    #[test]
    fn member_subsumed_by_stronger_pair() {
        let out = filter_redundant(vec![
            discovery("steps + exertion", 3.5),
            discovery("steps", 2.0),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].metric, "steps + exertion");
    }

    #[test]
    fn synonyms_collapse() {
        let out = filter_redundant(vec![
            discovery("steps", 3.0),
            discovery("step count", 2.9),
        ]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn unrelated_metrics_survive() {
        let out = filter_redundant(vec![discovery("steps", 3.0), discovery("hrv", 2.5)]);
        assert_eq!(out.len(), 2);
        // Sorted by magnitude descending.
        assert_eq!(out[0].metric, "steps");
    }
}
