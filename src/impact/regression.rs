//! OLS estimation and Newey-West HAC standard errors.
//!
//! Daily health metrics are autocorrelated (yesterday's fatigue
//! predicts today's) and rarely homoskedastic, so naive OLS standard
//! errors overstate confidence. The HAC sandwich estimator corrects
//! both: the "bread" is `(XᵗX)⁻¹`, the "meat" sums same-period score
//! outer products plus Bartlett-weighted lagged cross terms.
//!
//! Reference: Newey, W. K. & West, K. D. (1987). "A simple, positive
//! semi-definite, heteroskedasticity and autocorrelation consistent
//! covariance matrix." Econometrica 55(3):703-708.

use nalgebra::{DMatrix, DVector};

use crate::linalg::invert;

/// A solved ordinary-least-squares fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Estimated coefficients, one per design column.
    pub beta: DVector<f64>,
    /// `(XᵗX)⁻¹`, reused as the sandwich bread.
    pub xtx_inv: DMatrix<f64>,
}

/// Solve OLS via the normal equation `(XᵗX)⁻¹Xᵗy`.
///
/// Returns `None` when `XᵗX` is singular despite column cleaning;
/// callers skip the metric/intervention pairing.
pub fn fit_ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<OlsFit> {
    let xt = x.transpose();
    let xtx = &xt * x;
    let xtx_inv = invert(&xtx)?;
    let beta = &xtx_inv * (&xt * y);
    Some(OlsFit { beta, xtx_inv })
}

/// Newey-West HAC standard errors for a fitted model.
///
/// Bandwidth is `ceil(n^0.25)`; lag `l` cross terms are weighted by
/// the Bartlett kernel `1 − l/(bandwidth+1)`. The covariance is scaled
/// by the small-sample correction `n/(n−k)` so variance is not
/// underestimated on short series. Returns one standard error per
/// design column.
pub fn newey_west_standard_errors(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    fit: &OlsFit,
) -> Vec<f64> {
    let n = x.nrows();
    let k = x.ncols();

    // Residuals and per-period score vectors g_t = x_t * u_t.
    let fitted = x * &fit.beta;
    let residuals = y - fitted;
    let scores: Vec<DVector<f64>> = (0..n)
        .map(|t| x.row(t).transpose() * residuals[t])
        .collect();

    let bandwidth = (n as f64).powf(0.25).ceil() as usize;

    // Meat: same-period outer products.
    let mut meat = DMatrix::<f64>::zeros(k, k);
    for g in &scores {
        meat += g * g.transpose();
    }

    // Bartlett-weighted lagged cross terms, symmetrized.
    for lag in 1..=bandwidth {
        if lag >= n {
            break;
        }
        let weight = 1.0 - lag as f64 / (bandwidth as f64 + 1.0);
        for t in lag..n {
            let cross = &scores[t] * scores[t - lag].transpose();
            meat += weight * (&cross + cross.transpose());
        }
    }

    // Sandwich with the small-sample correction.
    let correction = if n > k { n as f64 / (n - k) as f64 } else { 1.0 };
    let cov = &fit.xtx_inv * meat * &fit.xtx_inv * correction;

    (0..k).map(|j| cov[(j, j)].max(0.0).sqrt()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y = 2 + 3x exactly: coefficients recovered, residuals zero.
    #[test]
    fn exact_linear_fit_recovers_coefficients() {
        let n = 12;
        let x = DMatrix::from_fn(n, 2, |r, c| if c == 0 { 1.0 } else { r as f64 });
        let y = DVector::from_fn(n, |r, _| 2.0 + 3.0 * r as f64);

        let fit = fit_ols(&x, &y).unwrap();
        assert!((fit.beta[0] - 2.0).abs() < 1e-9);
        assert!((fit.beta[1] - 3.0).abs() < 1e-9);

        let se = newey_west_standard_errors(&x, &y, &fit);
        assert_eq!(se.len(), 2);
        assert!(se.iter().all(|s| *s < 1e-6), "noiseless fit: {se:?}");
    }

    #[test]
    fn collinear_design_is_rejected() {
        // Second column duplicates the first.
        let x = DMatrix::from_fn(10, 2, |_, _| 1.0);
        let y = DVector::from_element(10, 5.0);
        assert!(fit_ols(&x, &y).is_none());
    }

    #[test]
    fn noisy_fit_has_positive_standard_errors() {
        // Deterministic pseudo-noise, no RNG needed.
        let n = 40;
        let x = DMatrix::from_fn(n, 2, |r, c| if c == 0 { 1.0 } else { (r % 7) as f64 });
        let y = DVector::from_fn(n, |r, _| {
            1.0 + 0.5 * (r % 7) as f64 + ((r * 2654435761) % 97) as f64 / 97.0 - 0.5
        });

        let fit = fit_ols(&x, &y).unwrap();
        let se = newey_west_standard_errors(&x, &y, &fit);
        assert!(se.iter().all(|s| *s > 0.0), "{se:?}");
    }

    #[test]
    fn autocorrelated_residuals_widen_errors() {
        // A slow sine imposed on the residuals should inflate the HAC
        // errors relative to treating the noise as white.
        let n = 60;
        let x = DMatrix::from_fn(n, 2, |r, c| if c == 0 { 1.0 } else { (r % 2) as f64 });

        let white = DVector::from_fn(n, |r, _| {
            10.0 + (((r * 2654435761) % 101) as f64 / 101.0 - 0.5)
        });
        let smooth = DVector::from_fn(n, |r, _| 10.0 + (r as f64 * 0.2).sin());

        let fit_w = fit_ols(&x, &white).unwrap();
        let fit_s = fit_ols(&x, &smooth).unwrap();
        let se_w = newey_west_standard_errors(&x, &white, &fit_w);
        let se_s = newey_west_standard_errors(&x, &smooth, &fit_s);

        // Not a strict theorem at this sample size, but the sine's
        // lag-1 correlation dominates and should show up.
        assert!(se_s[0] > se_w[0] * 0.8, "smooth {se_s:?} vs white {se_w:?}");
    }
}
