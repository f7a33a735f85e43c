//! KL Divergence Estimation
//!
//! Estimates D(reference || approx) for a continuous scalar from two samples:
//! 1. Both samples are binned over the joint `[min, max]` into equal-width bins
//! 2. Each histogram is normalised to a density (integrates to 1 over the range)
//! 3. Densities are smoothed so that no bin has zero probability
//! 4. `sum(ln(p / q) * p * bin_width)` over all bins
//!
//! Degenerate inputs are rejected rather than producing NaN.

use crate::{DEFAULT_KL_BINS, DEFAULT_SMOOTHING};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// KL estimation configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KlConfig {
    /// Number of equal-width bins (default: 20)
    pub bins: usize,
    /// Smoothing amount passed to [`smooth`] (default: 0.1)
    pub smoothing: f64,
}

impl Default for KlConfig {
    fn default() -> Self {
        Self {
            bins: DEFAULT_KL_BINS,
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}

impl KlConfig {
    /// Check that the estimator can run with these settings
    pub fn validate(&self) -> Result<(), KlError> {
        if self.bins == 0 {
            return Err(KlError::ZeroBins);
        }
        if !(self.smoothing.is_finite() && self.smoothing > 0.0) {
            return Err(KlError::InvalidSmoothing(self.smoothing));
        }
        Ok(())
    }
}

/// Errors for inputs the estimator cannot handle
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KlError {
    /// One of the samples is empty
    #[error("KL divergence needs non-empty samples (reference: {reference}, approx: {approx})")]
    EmptyInput {
        /// Reference sample size
        reference: usize,
        /// Approximating sample size
        approx: usize,
    },

    /// Every sample has the same value
    #[error("All samples equal {value}; histogram bin width would be zero")]
    ZeroWidth {
        /// The shared value
        value: f64,
    },

    /// A sample is NaN or infinite
    #[error("Samples contain a non-finite value ({0})")]
    NonFinite(f64),

    /// `bins` is zero
    #[error("Histogram needs at least one bin")]
    ZeroBins,

    /// Smoothing must be finite and positive, or empty bins yield NaN
    #[error("Smoothing must be finite and positive, got {0}")]
    InvalidSmoothing(f64),
}

/// Density histogram of `samples` over `[min, max]` split into `bins` equal-width bins.
///
/// Each bin is half-open except the last, which also contains `max`. Values outside
/// the range are ignored. The result integrates to 1 over the range when any sample
/// falls inside it.
pub fn histogram(samples: &[f64], bins: usize, min: f64, max: f64) -> Vec<f64> {
    let mut counts = vec![0usize; bins];
    if bins == 0 || max <= min {
        return vec![0.0; bins];
    }

    let width = (max - min) / bins as f64;
    let mut inside = 0usize;
    for &x in samples {
        if x < min || x > max {
            continue;
        }
        let idx = (((x - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
        inside += 1;
    }

    if inside == 0 {
        return vec![0.0; bins];
    }

    let norm = inside as f64 * width;
    counts.into_iter().map(|c| c as f64 / norm).collect()
}

/// Spread `amount` uniformly over the bins and renormalise.
///
/// `(p + amount / n) / (1 + amount)` for every entry `p`.
pub fn smooth(pdf: &[f64], amount: f64) -> Vec<f64> {
    let n = pdf.len() as f64;
    pdf.iter().map(|p| (p + amount / n) / (1.0 + amount)).collect()
}

/// Estimate the KL divergence of `approx` from `reference`.
///
/// `reference` is treated as the "true" distribution. The estimate is not symmetric.
///
/// # Examples
///
/// ```
/// # use riplbench_stats::{KlConfig, compute_kl};
/// let xs: Vec<f64> = (0..100).map(|i| i as f64).collect();
/// let kl = compute_kl(&xs, &xs, &KlConfig::default()).unwrap();
/// assert!(kl.abs() < 1e-12);
/// ```
pub fn compute_kl(reference: &[f64], approx: &[f64], config: &KlConfig) -> Result<f64, KlError> {
    config.validate()?;
    if reference.is_empty() || approx.is_empty() {
        return Err(KlError::EmptyInput {
            reference: reference.len(),
            approx: approx.len(),
        });
    }
    if let Some(&bad) = reference.iter().chain(approx).find(|x| !x.is_finite()) {
        return Err(KlError::NonFinite(bad));
    }

    let (min, max) = reference
        .iter()
        .chain(approx)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    if max <= min {
        return Err(KlError::ZeroWidth { value: min });
    }

    let ref_pdf = smooth(
        &histogram(reference, config.bins, min, max),
        config.smoothing,
    );
    let apx_pdf = smooth(&histogram(approx, config.bins, min, max), config.smoothing);
    let width = (max - min) / config.bins as f64;

    Ok(ref_pdf
        .iter()
        .zip(&apx_pdf)
        .map(|(p, q)| (p / q).ln() * p * width)
        .sum())
}

/// [`compute_kl`] with 20 bins and 0.1 smoothing
pub fn compute_kl_default(reference: &[f64], approx: &[f64]) -> Result<f64, KlError> {
    compute_kl(reference, approx, &KlConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize, lo: f64, hi: f64) -> Vec<f64> {
        (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn test_histogram_integrates_to_one() {
        let samples = uniform(50, 0.0, 10.0);
        let hist = histogram(&samples, 20, 0.0, 10.0);
        let width = 10.0 / 20.0;
        let total: f64 = hist.iter().map(|d| d * width).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_max_lands_in_last_bin() {
        let hist = histogram(&[0.0, 1.0], 4, 0.0, 1.0);
        assert!(hist[0] > 0.0);
        assert!(hist[3] > 0.0);
        assert_eq!(hist[1], 0.0);
        assert_eq!(hist[2], 0.0);
    }

    #[test]
    fn test_smooth_fills_empty_bins() {
        // Smoothing never adds mass beyond the input histogram
        let pdf = vec![4.0, 0.0, 0.0, 0.0];
        let smoothed = smooth(&pdf, 0.1);
        let width = 0.25;
        let total: f64 = smoothed.iter().map(|d| d * width).sum();
        assert!(smoothed.iter().all(|&p| p > 0.0));
        assert!(total < 1.0 + 1e-9);
    }

    #[test]
    fn test_self_divergence_is_zero() {
        let xs = vec![0.1, 0.5, 0.5, 0.9, 1.3, 2.0, 2.2];
        let kl = compute_kl_default(&xs, &xs).unwrap();
        assert!(kl.abs() < 1e-12);
    }

    #[test]
    fn test_divergence_is_asymmetric() {
        let x = vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 5.0];
        let y = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 5.0, 5.0];
        let xy = compute_kl_default(&x, &y).unwrap();
        let yx = compute_kl_default(&y, &x).unwrap();
        assert!(xy > 0.0);
        assert!(yx > 0.0);
        assert!((xy - yx).abs() > 1e-6);
    }

    #[test]
    fn test_disjoint_samples_diverge() {
        let near = compute_kl_default(&uniform(40, 0.0, 1.0), &uniform(40, 0.0, 1.1)).unwrap();
        let far = compute_kl_default(&uniform(40, 0.0, 1.0), &uniform(40, 5.0, 6.0)).unwrap();
        assert!(far > near);
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = compute_kl_default(&[], &[1.0, 2.0]);
        assert!(matches!(result, Err(KlError::EmptyInput { reference: 0, approx: 2 })));
    }

    #[test]
    fn test_zero_width_rejected() {
        let result = compute_kl_default(&[3.0, 3.0], &[3.0]);
        assert_eq!(result, Err(KlError::ZeroWidth { value: 3.0 }));
    }

    #[test]
    fn test_non_finite_rejected() {
        let result = compute_kl_default(&[1.0, f64::NEG_INFINITY], &[2.0]);
        assert!(matches!(result, Err(KlError::NonFinite(_))));
    }

    #[test]
    fn test_zero_bins_rejected() {
        let config = KlConfig {
            bins: 0,
            ..Default::default()
        };
        assert_eq!(compute_kl(&[1.0], &[2.0], &config), Err(KlError::ZeroBins));
    }

    #[test]
    fn test_non_positive_smoothing_rejected() {
        for smoothing in [0.0, -0.5, f64::NAN] {
            let config = KlConfig {
                bins: 20,
                smoothing,
            };
            let result = compute_kl(&[0.0, 1.0], &[0.0, 0.05], &config);
            assert!(matches!(result, Err(KlError::InvalidSmoothing(_))));
        }
    }
}
