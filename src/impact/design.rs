//! Design-matrix assembly over the closed metric table.
//!
//! The design matrix for a metric regression is
//! `[intercept | one indicator per intervention | lagged exertion confound]`
//! over the days where the metric was actually logged. Degenerate
//! columns are cleaned out before the solve so the normal equation has
//! a chance of being invertible: constant indicators carry no signal,
//! and exact duplicates (perfectly collinear interventions) make the
//! matrix singular outright.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use nalgebra::{DMatrix, DVector};

use crate::config::ImpactConfig;
use crate::series::MetricSeries;
use crate::types::{DailyRecord, Intervention};

/// What a retained design-matrix column represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// The all-ones intercept.
    Intercept,
    /// Activity indicator for the intervention at this input index.
    Intervention(usize),
    /// Previous-day exertion confound.
    LagConfound,
}

/// A cleaned, solvable design: response vector, design matrix, and the
/// role of each retained column.
#[derive(Debug, Clone)]
pub struct CleanDesign {
    /// Response vector over the metric's observed days.
    pub y: DVector<f64>,
    /// Design matrix with degenerate columns removed.
    pub x: DMatrix<f64>,
    /// Role of each column of `x`, in column order.
    pub roles: Vec<ColumnRole>,
}

/// Build and clean the design for one metric.
///
/// Returns `None` when fewer than the configured minimum rows have the
/// metric logged: that metric is skipped for this analysis call.
/// `records` must already be sorted by date, with `series` aligned to
/// the same index.
pub fn build_clean_design(
    records: &[DailyRecord],
    series: &MetricSeries,
    metric: &str,
    interventions: &[Intervention],
    config: &ImpactConfig,
) -> Option<CleanDesign> {
    // Rows: only days where the metric has a numeric value.
    let rows: Vec<(usize, f64)> = series
        .column(metric)?
        .iter()
        .enumerate()
        .filter_map(|(idx, v)| v.map(|v| (idx, v)))
        .collect();

    if rows.len() < config.min_rows {
        return None;
    }

    let n = rows.len();
    let y = DVector::from_iterator(n, rows.iter().map(|(_, v)| *v));

    // Candidate columns in fixed order, cleaned as we go.
    let mut columns: Vec<Vec<f64>> = vec![vec![1.0; n]];
    let mut roles: Vec<ColumnRole> = vec![ColumnRole::Intercept];

    for (iv_index, intervention) in interventions.iter().enumerate() {
        let col: Vec<f64> = rows
            .iter()
            .map(|(idx, _)| {
                if intervention.active_on(records[*idx].date) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        if is_constant(&col) {
            // All-zero (never overlaps the data) or all-one: no
            // contrast to estimate from.
            continue;
        }
        if columns.iter().any(|accepted| accepted == &col) {
            // Perfect collinearity: first encountered wins, later
            // duplicates get no estimate for this metric.
            continue;
        }

        columns.push(col);
        roles.push(ColumnRole::Intervention(iv_index));
    }

    let lag = lagged_confound(records, series, &rows, &config.exertion_metric);
    if !is_constant(&lag) && !columns.iter().any(|accepted| accepted == &lag) {
        columns.push(lag);
        roles.push(ColumnRole::LagConfound);
    }

    let k = columns.len();
    let x = DMatrix::from_fn(n, k, |r, c| columns[c][r]);

    Some(CleanDesign { y, x, roles })
}

/// Previous-calendar-day exertion value per row, with missing lags
/// imputed by the exertion metric's dataset mean.
fn lagged_confound(
    records: &[DailyRecord],
    series: &MetricSeries,
    rows: &[(usize, f64)],
    exertion_metric: &str,
) -> Vec<f64> {
    let index_of: HashMap<NaiveDate, usize> = records
        .iter()
        .enumerate()
        .map(|(idx, r)| (r.date, idx))
        .collect();

    let exertion = series.column(exertion_metric).unwrap_or(&[]);
    let logged: Vec<f64> = exertion.iter().copied().flatten().collect();
    let dataset_mean = if logged.is_empty() {
        0.0
    } else {
        logged.iter().sum::<f64>() / logged.len() as f64
    };

    rows.iter()
        .map(|(idx, _)| {
            index_of
                .get(&(records[*idx].date - Duration::days(1)))
                .and_then(|prev| exertion.get(*prev).copied().flatten())
                .unwrap_or(dataset_mean)
        })
        .collect()
}

fn is_constant(col: &[f64]) -> bool {
    match col.first() {
        Some(first) => col.iter().all(|v| v == first),
        None => true,
    }
}
