//! Shared constants for both analysis engines.

/// Pivot magnitudes below this are treated as zero during Gauss-Jordan
/// elimination; a column with no usable pivot makes the matrix
/// non-invertible.
pub const PIVOT_EPSILON: f64 = 1e-10;

/// Days of context captured before a crash onset in an epoch window.
pub const EPOCH_PRE_DAYS: i64 = 7;

/// Days of context captured after a crash onset in an epoch window.
pub const EPOCH_POST_DAYS: i64 = 14;

/// Total offsets in a full epoch window (−7..=+14 inclusive).
pub const EPOCH_WINDOW_LEN: usize = (EPOCH_PRE_DAYS + EPOCH_POST_DAYS + 1) as usize;

/// Metric keys excluded from automatic discovery: identifiers,
/// timestamps, composite/exertion-derived fields, normalized
/// derivatives, and crash flags. Matched case-insensitively.
pub const EXCLUDED_METRICS: [&str; 12] = [
    "id",
    "user_id",
    "date",
    "timestamp",
    "created_at",
    "updated_at",
    "composite_score",
    "exertion_load",
    "normalized_exertion",
    "exertion_normalized",
    "crash",
    "is_crash_day",
];

/// Name fragments marking a metric as "input-type": something the user
/// does rather than something the body reports. Input metrics may
/// legitimately trigger on the crash day itself.
pub const INPUT_METRIC_FRAGMENTS: [&str; 6] =
    ["step", "exertion", "active", "stress", "work", "exercise"];

/// Name fragments marking a metric as a biological vital rather than a
/// reported symptom, used for recovery-phase grouping.
pub const VITAL_METRIC_FRAGMENTS: [&str; 7] = [
    "hrv",
    "heart",
    "resting",
    "temperature",
    "spo2",
    "respiratory",
    "pulse",
];

/// Synonym groups for the discovery redundancy filter. Metrics within
/// one group are treated as the same underlying signal.
pub const METRIC_SYNONYMS: [&[&str]; 4] = [
    &["steps", "step count", "step_count"],
    &["hrv", "heart rate variability", "heart_rate_variability"],
    &["hr", "heart rate", "heart_rate", "resting_hr", "resting heart rate"],
    &["exertion", "exertion_level", "activity", "active_minutes"],
];

/// Whether a metric key is excluded from automatic discovery.
pub fn is_excluded_metric(name: &str) -> bool {
    let lower = name.to_lowercase();
    EXCLUDED_METRICS.iter().any(|ex| *ex == lower)
        || lower.ends_with("_id")
        || lower.ends_with("_at")
        || lower.ends_with("_normalized")
}

/// Whether a metric name reads as input-type (exertion-like).
pub fn is_input_metric(name: &str) -> bool {
    let lower = name.to_lowercase();
    INPUT_METRIC_FRAGMENTS.iter().any(|f| lower.contains(f))
}

/// Whether a metric name reads as a biological vital.
pub fn is_vital_metric(name: &str) -> bool {
    let lower = name.to_lowercase();
    VITAL_METRIC_FRAGMENTS.iter().any(|f| lower.contains(f))
}

/// Whether two metric names are registered synonyms.
pub fn are_synonyms(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    if a == b {
        return true;
    }
    METRIC_SYNONYMS
        .iter()
        .any(|group| group.contains(&a.as_str()) && group.contains(&b.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_covers_ids_and_derivatives() {
        assert!(is_excluded_metric("user_id"));
        assert!(is_excluded_metric("Crash"));
        assert!(is_excluded_metric("hrv_normalized"));
        assert!(is_excluded_metric("logged_at"));
        assert!(!is_excluded_metric("hrv"));
        assert!(!is_excluded_metric("fatigue"));
    }

    #[test]
    fn input_detection_matches_fragments() {
        assert!(is_input_metric("Steps"));
        assert!(is_input_metric("work_hours"));
        assert!(!is_input_metric("hrv"));
    }

    #[test]
    fn synonym_groups_are_symmetric() {
        assert!(are_synonyms("steps", "step count"));
        assert!(are_synonyms("step count", "steps"));
        assert!(are_synonyms("HRV", "heart rate variability"));
        assert!(!are_synonyms("steps", "hrv"));
    }
}
