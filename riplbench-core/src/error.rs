//! Benchmark driver errors

use crate::ripl::RiplError;
use riplbench_stats::KlError;
use thiserror::Error;

/// Errors surfaced by [`Benchmarker`](crate::Benchmarker) operations.
///
/// Value-type inconsistencies are not errors: they drop the affected series.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The engine rejected a call
    #[error(transparent)]
    Ripl(#[from] RiplError),

    /// KL settings the estimator cannot run with
    #[error("Invalid KL configuration: {0}")]
    KlConfig(#[from] KlError),

    /// Conditioning data does not line up with the model's observes
    #[error("Conditioning data has {got} values but the model has {expected} observes")]
    DataLength {
        /// Number of observes in the model
        expected: usize,
        /// Number of data values supplied
        got: usize,
    },

    /// The seed parameter is present but not an unsigned integer
    #[error("Seed parameter must be an unsigned integer, got {0}")]
    InvalidSeed(serde_json::Value),

    /// An unpruned model load did not register a predict for this observe
    #[error("No predict directive registered for observe {0}")]
    MissingPredict(usize),
}
