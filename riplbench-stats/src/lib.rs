#![warn(missing_docs)]
//! riplbench Statistical Engine
//!
//! Provides the numeric side of the benchmarking harness:
//! - Binned-histogram KL divergence between two empirical samples
//! - Additive smoothing of density histograms
//! - Percentile calculation
//! - Per-series summary statistics for reports

mod kl;
mod percentiles;
mod summary;

pub use kl::{KlConfig, KlError, compute_kl, compute_kl_default, histogram, smooth};
pub use percentiles::{Percentiles, compute_percentile, compute_percentiles};
pub use summary::{SeriesSummary, compute_summary};

/// Default number of equal-width histogram bins for KL estimation
pub const DEFAULT_KL_BINS: usize = 20;

/// Default probability mass spread uniformly across bins before comparing densities
pub const DEFAULT_SMOOTHING: f64 = 0.1;
