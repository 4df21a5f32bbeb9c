//! End-to-end tests for the experiment impact engine on synthetic
//! series with known ground truth.

use chrono::{Duration, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use healthlens::{
    analyze_impacts, DailyRecord, Direction, DirectionRegistry, EffectSize, ImpactConfig,
    Intervention, Significance,
};

const SEED: u64 = 0x6865616c7468; // "health"

fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(n)
}

fn intervention(id: &str, start: i64, end: Option<i64>) -> Intervention {
    Intervention {
        id: id.to_string(),
        name: id.to_string(),
        category: "test".to_string(),
        start_date: day(start),
        end_date: end.map(day),
    }
}

/// Uniform noise in [-amp, amp], deterministic per seed.
fn noise(rng: &mut Xoshiro256PlusPlus, amp: f64) -> f64 {
    (rng.gen::<f64>() - 0.5) * 2.0 * amp
}

/// Series where `metric` = base + shift per active intervention + noise.
fn synthetic_series(
    days: i64,
    metric: &str,
    base: f64,
    noise_amp: f64,
    shifts: &[(&Intervention, f64)],
) -> Vec<DailyRecord> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(SEED);
    (0..days)
        .map(|d| {
            let date = day(d);
            let mut value = base + noise(&mut rng, noise_amp);
            for (iv, shift) in shifts {
                if iv.active_on(date) {
                    value += shift;
                }
            }
            let mut rec = DailyRecord::new(date);
            rec.metrics.insert(metric.to_string(), value.into());
            rec
        })
        .collect()
}

// =============================================================================
// COEFFICIENT RECOVERY
// =============================================================================

#[test]
fn overlapping_interventions_recover_their_shifts() {
    let a = intervention("a", 30, Some(89));
    let b = intervention("b", 60, Some(119));
    let history = synthetic_series(120, "hrv", 50.0, 0.5, &[(&a, 5.0), (&b, 8.0)]);

    let registry = DirectionRegistry::with_defaults();
    let reports = analyze_impacts(
        &[a.clone(), b.clone()],
        &history,
        &registry,
        &ImpactConfig::default(),
    );

    assert_eq!(reports.len(), 2);
    let impact_a = &reports[0].impacts[0];
    let impact_b = &reports[1].impacts[0];

    assert!((impact_a.coefficient - 5.0).abs() < 0.5, "{}", impact_a.coefficient);
    assert!((impact_b.coefficient - 8.0).abs() < 0.5, "{}", impact_b.coefficient);
    assert!(impact_a.p_value < 0.01, "p = {}", impact_a.p_value);
    assert!(impact_b.p_value < 0.01, "p = {}", impact_b.p_value);

    // HRV is higher-is-better, both shifts are upward.
    assert_eq!(impact_a.significance, Significance::Positive);
    assert_eq!(impact_b.significance, Significance::Positive);

    assert_eq!(reports[0].significant().count(), 1);
    assert_eq!(reports[0].summary(), "a: 1 metric(s) analyzed, 1 significant");
}

#[test]
fn lower_is_better_metric_flips_significance() {
    let a = intervention("a", 30, Some(89));
    let history = synthetic_series(120, "fatigue", 6.0, 0.3, &[(&a, 2.0)]);

    let registry = DirectionRegistry::with_defaults();
    let reports =
        analyze_impacts(&[a], &history, &registry, &ImpactConfig::default());

    let impact = &reports[0].impacts[0];
    assert!(impact.coefficient > 0.0);
    assert_eq!(impact.significance, Significance::Negative);
}

#[test]
fn injected_registry_overrides_direction() {
    let a = intervention("a", 30, Some(89));
    let history = synthetic_series(120, "weird_metric", 10.0, 0.3, &[(&a, 3.0)]);

    let mut registry = DirectionRegistry::new();
    registry.insert("weird_metric", Direction::HigherIsBetter);
    let reports =
        analyze_impacts(&[a], &history, &registry, &ImpactConfig::default());

    assert_eq!(reports[0].impacts[0].significance, Significance::Positive);
}

// =============================================================================
// DEGENERATE DESIGNS
// =============================================================================

#[test]
fn perfectly_collinear_twin_yields_no_entry() {
    let first = intervention("first", 30, Some(89));
    let twin = intervention("twin", 30, Some(89));
    let history = synthetic_series(120, "hrv", 50.0, 0.5, &[(&first, 5.0)]);

    let registry = DirectionRegistry::with_defaults();
    let reports = analyze_impacts(
        &[first, twin],
        &history,
        &registry,
        &ImpactConfig::default(),
    );

    // First encountered wins and stays estimable.
    assert_eq!(reports[0].intervention_id, "first");
    assert_eq!(reports[0].impacts.len(), 1);
    assert!((reports[0].impacts[0].coefficient - 5.0).abs() < 0.5);

    // The exact duplicate is excluded from the fit entirely.
    assert_eq!(reports[1].intervention_id, "twin");
    assert!(reports[1].impacts.is_empty());
}

#[test]
fn non_overlapping_intervention_does_not_block_others() {
    let active = intervention("active", 30, Some(89));
    let never = intervention("never", 500, Some(600));
    let history = synthetic_series(120, "hrv", 50.0, 0.5, &[(&active, 5.0)]);

    let registry = DirectionRegistry::with_defaults();
    let reports = analyze_impacts(
        &[never, active],
        &history,
        &registry,
        &ImpactConfig::default(),
    );

    assert!(reports[0].impacts.is_empty());
    assert_eq!(reports[1].impacts.len(), 1);
    assert_eq!(reports[1].impacts[0].significance, Significance::Positive);
}

// =============================================================================
// DATA SUFFICIENCY
// =============================================================================

#[test]
fn short_history_always_yields_empty_reports() {
    let a = intervention("a", 2, Some(8));
    let history = synthetic_series(13, "hrv", 50.0, 0.5, &[(&a, 5.0)]);

    let registry = DirectionRegistry::with_defaults();
    let reports =
        analyze_impacts(&[a], &history, &registry, &ImpactConfig::default());
    assert!(reports.is_empty());
}

#[test]
fn no_discoverable_metric_yields_empty_reports() {
    // Only excluded keys are logged.
    let history: Vec<DailyRecord> = (0..30)
        .map(|d| {
            let mut rec = DailyRecord::new(day(d));
            rec.metrics.insert("user_id".into(), 7.0.into());
            rec.metrics.insert("crash".into(), false.into());
            rec
        })
        .collect();

    let a = intervention("a", 5, Some(20));
    let registry = DirectionRegistry::with_defaults();
    let reports =
        analyze_impacts(&[a], &history, &registry, &ImpactConfig::default());
    assert!(reports.is_empty());
}

#[test]
fn unsorted_history_is_sorted_before_use() {
    let a = intervention("a", 30, Some(89));
    let mut history = synthetic_series(120, "hrv", 50.0, 0.5, &[(&a, 5.0)]);
    history.reverse();

    let registry = DirectionRegistry::with_defaults();
    let reports =
        analyze_impacts(&[a], &history, &registry, &ImpactConfig::default());
    assert!((reports[0].impacts[0].coefficient - 5.0).abs() < 0.5);
}

// =============================================================================
// EFFECT SIZES
// =============================================================================

#[test]
fn two_sigma_shift_classifies_as_large() {
    // Uniform noise in [-0.5, 0.5] has std ~0.289; a shift of 0.9 is
    // roughly 3 baseline sigmas.
    let a = intervention("a", 100, Some(179));
    let history = synthetic_series(180, "hrv", 50.0, 0.5, &[(&a, 0.9)]);

    let registry = DirectionRegistry::with_defaults();
    let reports =
        analyze_impacts(&[a], &history, &registry, &ImpactConfig::default());

    let impact = &reports[0].impacts[0];
    assert!(impact.z_score_shift > 2.0, "z = {}", impact.z_score_shift);
    assert_eq!(impact.effect_size, EffectSize::Large);
}

#[test]
fn small_shift_with_large_sample_is_small_but_significant() {
    // ~0.35 baseline sigmas, detectable only because n is large.
    let a = intervention("a", 800, Some(1599));
    let history = synthetic_series(1600, "hrv", 50.0, 0.5, &[(&a, 0.10)]);

    let registry = DirectionRegistry::with_defaults();
    let reports =
        analyze_impacts(&[a], &history, &registry, &ImpactConfig::default());

    let impact = &reports[0].impacts[0];
    assert!(impact.p_value < 0.05, "p = {}", impact.p_value);
    assert_eq!(impact.effect_size, EffectSize::Small);
    assert!(impact.z_score_shift.abs() < 0.5);
}

#[test]
fn insignificant_effect_is_neutral_and_unclassified() {
    // Alternating ±0.25 with no true shift: the active window holds an
    // equal count of each sign, so the estimated coefficient is
    // exactly zero regardless of sampling luck.
    let a = intervention("a", 60, Some(119));
    let history: Vec<DailyRecord> = (0..180)
        .map(|d| {
            let wiggle = if d % 2 == 0 { 0.25 } else { -0.25 };
            let mut rec = DailyRecord::new(day(d));
            rec.metrics.insert("hrv".into(), (50.0 + wiggle).into());
            rec
        })
        .collect();

    let registry = DirectionRegistry::with_defaults();
    let reports =
        analyze_impacts(&[a], &history, &registry, &ImpactConfig::default());

    let impact = &reports[0].impacts[0];
    assert!(impact.p_value > 0.9, "p = {}", impact.p_value);
    assert_eq!(impact.significance, Significance::Neutral);
    assert_eq!(impact.effect_size, EffectSize::NotSignificant);
}

#[test]
fn noiseless_exact_fit_yields_no_entry() {
    // A metric that is an exact function of the indicator has zero
    // residuals and a zero standard error: no finite t statistic
    // exists, so the pairing is skipped rather than reported.
    // Power-of-two row counts (64 total, 32 active) keep the normal
    // equation exact in binary, so the residuals are exactly zero.
    let a = intervention("a", 16, Some(47));
    let history = synthetic_series(64, "hrv", 50.0, 0.0, &[(&a, 5.0)]);

    let registry = DirectionRegistry::with_defaults();
    let reports =
        analyze_impacts(&[a], &history, &registry, &ImpactConfig::default());

    assert_eq!(reports.len(), 1);
    assert!(reports[0].impacts.is_empty());
}
