//! Series Summary Statistics
//!
//! Describes one recorded series: how many values, where they sit and how
//! spread out they are. Non-finite values (an engine can report `-inf`
//! logscores) are counted but excluded from the moments and quantiles.

use crate::percentiles::{Percentiles, compute_percentiles};
use serde::{Deserialize, Serialize};

/// Summary of a single series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Number of values, finite or not
    pub count: usize,
    /// Number of non-finite values that were excluded
    pub non_finite: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
    /// Smallest finite value
    pub min: f64,
    /// Largest finite value
    pub max: f64,
    /// 50th percentile
    pub median: f64,
    /// 5th percentile
    pub p5: f64,
    /// 95th percentile
    pub p95: f64,
}

/// Summarise a series of numeric values
pub fn compute_summary(values: &[f64]) -> SeriesSummary {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let non_finite = values.len() - finite.len();

    if finite.is_empty() {
        return SeriesSummary {
            count: values.len(),
            non_finite,
            mean: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            median: 0.0,
            p5: 0.0,
            p95: 0.0,
        };
    }

    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let std_dev = if finite.len() < 2 {
        0.0
    } else {
        (finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    };

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let Percentiles { p5, p50, p95, .. } = compute_percentiles(&finite);

    SeriesSummary {
        count: values.len(),
        non_finite,
        mean,
        std_dev,
        min,
        max,
        median: p50,
        p5,
        p95,
    }
}

impl SeriesSummary {
    /// Width of the central 90% interval
    pub fn spread(&self) -> f64 {
        self.p95 - self.p5
    }
}
