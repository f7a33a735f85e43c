//! Percentile Computation
//!
//! Quantiles of a recorded series, used to describe where a chain or a prior
//! sample concentrates its mass.

/// Quantiles reported for a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentiles {
    /// 5th percentile (lower end of a 90% central interval)
    pub p5: f64,
    /// First quartile
    pub p25: f64,
    /// Median
    pub p50: f64,
    /// Third quartile
    pub p75: f64,
    /// 95th percentile (upper end of a 90% central interval)
    pub p95: f64,
}

/// Compute a single percentile (0-100) with linear interpolation between ranks.
///
/// Returns 0.0 for an empty slice.
pub fn compute_percentile(samples: &[f64], percentile: f64) -> f64 {
    match samples {
        [] => 0.0,
        [only] => *only,
        _ => {
            let mut sorted = samples.to_vec();
            sorted.sort_by(f64::total_cmp);
            interpolate(&sorted, percentile)
        }
    }
}

/// Compute the standard quantile set, sorting the samples once.
pub fn compute_percentiles(samples: &[f64]) -> Percentiles {
    if samples.len() < 2 {
        let v = samples.first().copied().unwrap_or(0.0);
        return Percentiles {
            p5: v,
            p25: v,
            p50: v,
            p75: v,
            p95: v,
        };
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    Percentiles {
        p5: interpolate(&sorted, 5.0),
        p25: interpolate(&sorted, 25.0),
        p50: interpolate(&sorted, 50.0),
        p75: interpolate(&sorted, 75.0),
        p95: interpolate(&sorted, 95.0),
    }
}

/// `sorted` must hold at least two values
fn interpolate(sorted: &[f64], percentile: f64) -> f64 {
    let n = sorted.len();
    let rank = (percentile / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(n - 1);
    let fraction = rank - lower as f64;
    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        let samples = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        assert!((compute_percentile(&samples, 50.0) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_quartiles() {
        let samples: Vec<f64> = (1..=101).map(|x| x as f64).collect();
        let q = compute_percentiles(&samples);
        assert!((q.p25 - 26.0).abs() < 1e-9);
        assert!((q.p75 - 76.0).abs() < 1e-9);
        assert!((q.p5 - 6.0).abs() < 1e-9);
        assert!((q.p95 - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_sample() {
        let q = compute_percentiles(&[42.0]);
        assert_eq!(q.p5, 42.0);
        assert_eq!(q.p95, 42.0);
    }

    #[test]
    fn test_empty_samples() {
        assert_eq!(compute_percentile(&[], 50.0), 0.0);
        assert_eq!(compute_percentiles(&[]).p50, 0.0);
    }

    #[test]
    fn test_out_of_range_percentile_clamps() {
        let samples = vec![1.0, 2.0, 3.0];
        assert_eq!(compute_percentile(&samples, 150.0), 3.0);
        assert_eq!(compute_percentile(&samples, -10.0), 1.0);
    }
}
