//! Core data model: daily records, interventions, baselines, and the
//! metric-direction registry.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single logged value for one metric on one day.
///
/// Health logs are loosely typed: numbers, boolean flags, and the
/// occasional stringly-typed flag (`"1"`, `"true"`) all appear in the
/// wild. The engine treats strictly-numeric values as first-class and
/// coerces flag-like values only where the pipeline explicitly allows
/// it (epoch extraction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// A plain numeric observation.
    Number(f64),
    /// A boolean flag (e.g. "crash day").
    Flag(bool),
    /// Free-form text; only `"1"`/`"0"`/`"true"`/`"false"` carry signal.
    Text(String),
}

impl MetricValue {
    /// Strictly numeric view. Flags and text are treated as absent.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Numeric view with boolean-like coercion:
    /// `1`/`true`/`"1"`/`"true"` map to 1.0, `0`/`false`/`"0"`/`"false"`
    /// map to 0.0. Anything else is absent.
    pub fn as_boolean_like(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) if v.is_finite() => Some(*v),
            MetricValue::Number(_) => None,
            MetricValue::Flag(true) => Some(1.0),
            MetricValue::Flag(false) => Some(0.0),
            MetricValue::Text(s) => match s.trim() {
                "1" | "true" | "TRUE" | "True" => Some(1.0),
                "0" | "false" | "FALSE" | "False" => Some(0.0),
                _ => None,
            },
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Number(v)
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Flag(v)
    }
}

/// One day of logged health data.
///
/// Metric names are open-ended strings discovered at analysis time.
/// `metrics` holds the app's named fields; `custom` holds the
/// user-defined sub-map. Lookups check `metrics` first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Calendar date; unique within one series.
    pub date: NaiveDate,
    /// Named top-level metrics.
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricValue>,
    /// User-defined custom metrics.
    #[serde(default)]
    pub custom: BTreeMap<String, MetricValue>,
}

impl DailyRecord {
    /// Create an empty record for `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            metrics: BTreeMap::new(),
            custom: BTreeMap::new(),
        }
    }

    /// Look up a metric by name, checking the top-level fields before
    /// the custom sub-map.
    pub fn value(&self, metric: &str) -> Option<&MetricValue> {
        self.metrics.get(metric).or_else(|| self.custom.get(metric))
    }

    /// Strictly numeric value of a metric, if logged.
    pub fn number(&self, metric: &str) -> Option<f64> {
        self.value(metric).and_then(MetricValue::as_number)
    }

    /// Whether this day carries an explicit crash flag.
    pub fn is_crash_day(&self) -> bool {
        self.value("crash")
            .and_then(MetricValue::as_boolean_like)
            .map(|v| v == 1.0)
            .unwrap_or(false)
    }
}

/// An intervention being trialed: a medication, supplement, or
/// lifestyle change active over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intervention {
    /// Opaque unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form category (e.g. "supplement").
    pub category: String,
    /// First active day.
    pub start_date: NaiveDate,
    /// Last active day; `None` means still active.
    pub end_date: Option<NaiveDate>,
}

impl Intervention {
    /// Whether the intervention was active on `date`.
    ///
    /// An open-ended intervention (`end_date == None`) is active on
    /// every day at or after its start.
    pub fn active_on(&self, date: NaiveDate) -> bool {
        if date < self.start_date {
            return false;
        }
        match self.end_date {
            Some(end) => date <= end,
            None => true,
        }
    }
}

/// Mean and standard deviation of a metric over a reference window.
///
/// A `std` of exactly 0 is a sentinel meaning "no dispersion observed";
/// consumers must special-case it rather than divide by it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    /// Sample mean over the reference window.
    pub mean: f64,
    /// Sample standard deviation; 0 means no dispersion observed.
    pub std: f64,
}

impl BaselineStats {
    /// Whether the baseline carries no dispersion information.
    pub fn is_flat(&self) -> bool {
        self.std == 0.0
    }
}

/// Direction in which a metric is considered to improve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Larger values are better (e.g. HRV, sleep score).
    HigherIsBetter,
    /// Smaller values are better (e.g. resting heart rate, pain).
    LowerIsBetter,
}

/// Case-insensitive lookup table mapping metric names to their
/// improvement direction.
///
/// The registry is injected into the engines rather than read from a
/// global, so tests can substitute deterministic tables. Unrecognized
/// metrics fall back to [`Direction::LowerIsBetter`]: user-defined
/// custom metrics overwhelmingly track symptom burden.
#[derive(Debug, Clone)]
pub struct DirectionRegistry {
    map: HashMap<String, Direction>,
    default: Direction,
}

impl DirectionRegistry {
    /// Empty registry with the lower-is-better default.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            default: Direction::LowerIsBetter,
        }
    }

    /// Registry pre-seeded with common wearable and symptom metrics.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        for name in [
            "hrv",
            "heart rate variability",
            "sleep_score",
            "sleep score",
            "sleep_hours",
            "deep_sleep",
            "readiness",
            "energy",
            "mood",
            "steps",
            "spo2",
        ] {
            reg.insert(name, Direction::HigherIsBetter);
        }
        for name in [
            "resting_hr",
            "resting heart rate",
            "heart_rate",
            "fatigue",
            "pain",
            "brain_fog",
            "brain fog",
            "headache",
            "symptom_score",
            "stress",
            "crash",
        ] {
            reg.insert(name, Direction::LowerIsBetter);
        }
        reg
    }

    /// Register or override a metric's direction.
    pub fn insert(&mut self, metric: &str, direction: Direction) {
        self.map.insert(metric.to_lowercase(), direction);
    }

    /// Resolve a metric's direction, falling back to the default.
    pub fn direction_of(&self, metric: &str) -> Direction {
        self.map
            .get(&metric.to_lowercase())
            .copied()
            .unwrap_or(self.default)
    }
}

impl Default for DirectionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn boolean_like_coercion() {
        assert_eq!(MetricValue::Flag(true).as_boolean_like(), Some(1.0));
        assert_eq!(MetricValue::Text("1".into()).as_boolean_like(), Some(1.0));
        assert_eq!(MetricValue::Text("false".into()).as_boolean_like(), Some(0.0));
        assert_eq!(MetricValue::Text("maybe".into()).as_boolean_like(), None);
        assert_eq!(MetricValue::Number(3.5).as_boolean_like(), Some(3.5));
        assert_eq!(MetricValue::Number(f64::NAN).as_boolean_like(), None);
        assert_eq!(MetricValue::Number(f64::INFINITY).as_boolean_like(), None);
    }

    #[test]
    fn strict_numbers_reject_flags_and_text() {
        assert_eq!(MetricValue::Flag(true).as_number(), None);
        assert_eq!(MetricValue::Text("1".into()).as_number(), None);
        assert_eq!(MetricValue::Number(f64::NAN).as_number(), None);
        assert_eq!(MetricValue::Number(7.0).as_number(), Some(7.0));
    }

    #[test]
    fn record_lookup_prefers_top_level() {
        let mut rec = DailyRecord::new(date("2025-01-01"));
        rec.metrics.insert("hrv".into(), 55.0.into());
        rec.custom.insert("hrv".into(), 10.0.into());
        assert_eq!(rec.number("hrv"), Some(55.0));
    }

    #[test]
    fn crash_flag_accepts_coerced_forms() {
        let mut rec = DailyRecord::new(date("2025-01-01"));
        assert!(!rec.is_crash_day());
        rec.metrics
            .insert("crash".into(), MetricValue::Text("1".into()));
        assert!(rec.is_crash_day());
        rec.metrics.insert("crash".into(), MetricValue::Flag(false));
        assert!(!rec.is_crash_day());
    }

    #[test]
    fn intervention_open_end_is_active_forever() {
        let iv = Intervention {
            id: "x".into(),
            name: "LDN".into(),
            category: "medication".into(),
            start_date: date("2025-03-01"),
            end_date: None,
        };
        assert!(!iv.active_on(date("2025-02-28")));
        assert!(iv.active_on(date("2025-03-01")));
        assert!(iv.active_on(date("2030-01-01")));
    }

    #[test]
    fn registry_is_case_insensitive_with_default() {
        let reg = DirectionRegistry::with_defaults();
        assert_eq!(reg.direction_of("HRV"), Direction::HigherIsBetter);
        assert_eq!(reg.direction_of("Fatigue"), Direction::LowerIsBetter);
        assert_eq!(reg.direction_of("mystery_metric"), Direction::LowerIsBetter);
    }
}
