//! Shared statistical infrastructure for both engines.
//!
//! - Baseline (mean/std) computation over reference windows
//! - Normal and Student-t distribution functions for inference

mod baseline;
mod distributions;

pub use baseline::compute_baseline;
pub use distributions::{normal_cdf, t_cdf, two_tailed_p_value};
