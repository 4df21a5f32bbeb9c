//! Closed per-analysis metric table.
//!
//! Records arrive as open-ended maps keyed by whatever metric names the
//! user happens to log. One discovery pass per analysis call closes the
//! metric set and materializes each metric as a column aligned to the
//! sorted record index, so the rest of the pipeline iterates a fixed
//! table instead of re-probing nested maps per day.

use std::collections::{BTreeMap, BTreeSet};

use crate::constants::is_excluded_metric;
use crate::types::{DailyRecord, MetricValue};

/// The discovered metrics of one record series, each materialized as a
/// column of per-day values aligned to the record index.
///
/// Discovery is the same for both constructors: a key qualifies when it
/// carries at least one strictly numeric value anywhere in the series
/// and is not on the exclusion list (identifiers, timestamps,
/// composite/derived fields, crash flags). The constructors differ only
/// in how cell values are read.
#[derive(Debug, Clone)]
pub struct MetricSeries {
    metrics: Vec<String>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl MetricSeries {
    /// Build with strictly numeric cells; flags and text read as absent.
    pub fn strict(records: &[DailyRecord]) -> Self {
        Self::build(records, MetricValue::as_number)
    }

    /// Build with boolean-like coercion for non-numeric cells
    /// (`1`/`true`/`"1"` → 1.0 and so on).
    pub fn coerced(records: &[DailyRecord]) -> Self {
        Self::build(records, |v| v.as_number().or_else(|| v.as_boolean_like()))
    }

    fn build(records: &[DailyRecord], read: impl Fn(&MetricValue) -> Option<f64>) -> Self {
        let metrics = discover(records);
        let columns = metrics
            .iter()
            .map(|metric| {
                let column = records
                    .iter()
                    .map(|r| r.value(metric).and_then(&read))
                    .collect();
                (metric.clone(), column)
            })
            .collect();

        Self { metrics, columns }
    }

    /// Discovered metric names, sorted.
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Full column of a metric, aligned to the record index.
    pub fn column(&self, metric: &str) -> Option<&[Option<f64>]> {
        self.columns.get(metric).map(Vec::as_slice)
    }

    /// Value of a metric on the day at `index`, if logged and readable.
    pub fn value(&self, metric: &str, index: usize) -> Option<f64> {
        self.columns
            .get(metric)?
            .get(index)
            .copied()
            .flatten()
    }
}

/// Keys with at least one strictly numeric value, minus the exclusion
/// list. Sorted for deterministic downstream iteration.
fn discover(records: &[DailyRecord]) -> Vec<String> {
    let mut found = BTreeSet::new();

    for record in records {
        for (name, value) in record.metrics.iter().chain(record.custom.iter()) {
            if value.as_number().is_some() && !is_excluded_metric(name) {
                found.insert(name.clone());
            }
        }
    }

    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn discovery_skips_excluded_and_non_numeric() {
        let mut rec = DailyRecord::new(date(1));
        rec.metrics.insert("hrv".into(), 50.0.into());
        rec.metrics.insert("crash".into(), MetricValue::Flag(true));
        rec.metrics.insert("user_id".into(), 42.0.into());
        rec.custom.insert("tinnitus".into(), 3.0.into());
        rec.custom.insert("note".into(), MetricValue::Text("bad day".into()));

        let series = MetricSeries::strict(&[rec]);
        assert_eq!(
            series.metrics(),
            &["hrv".to_string(), "tinnitus".to_string()]
        );
    }

    #[test]
    fn columns_align_to_record_order() {
        let mut a = DailyRecord::new(date(1));
        a.metrics.insert("hrv".into(), 40.0.into());
        let b = DailyRecord::new(date(2));
        let mut c = DailyRecord::new(date(3));
        c.metrics.insert("hrv".into(), 60.0.into());

        let series = MetricSeries::strict(&[a, b, c]);
        assert_eq!(series.column("hrv").unwrap(), &[Some(40.0), None, Some(60.0)]);
        assert_eq!(series.value("hrv", 2), Some(60.0));
        assert_eq!(series.value("hrv", 1), None);
        assert_eq!(series.value("unknown", 0), None);
    }

    #[test]
    fn coerced_cells_read_flag_shaped_values() {
        // "pacing" qualifies through its one numeric day; its flag days
        // are absent under strict reading but coerce to 0/1.
        let mut a = DailyRecord::new(date(1));
        a.metrics.insert("pacing".into(), 1.0.into());
        let mut b = DailyRecord::new(date(2));
        b.metrics.insert("pacing".into(), MetricValue::Flag(true));

        let records = vec![a, b];
        let strict = MetricSeries::strict(&records);
        let coerced = MetricSeries::coerced(&records);

        assert_eq!(strict.value("pacing", 1), None);
        assert_eq!(coerced.value("pacing", 1), Some(1.0));
    }
}
