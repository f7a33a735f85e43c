//! RIPL capability contract
//!
//! The inference engine is an external collaborator. Everything the harness
//! needs from it is expressed by [`Ripl`]; implementations wrap whatever
//! transport the engine actually uses.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque handle to a registered assume/observe/predict.
///
/// Only valid for the model currently loaded; [`Ripl::clear`] invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DirectiveId(pub u64);

impl std::fmt::Display for DirectiveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "directive#{}", self.0)
    }
}

/// Entropy diagnostics reported by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntropyInfo {
    /// Random choices not pinned by an observation
    pub unconstrained_random_choices: u64,
}

/// Errors reported by an engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiplError {
    /// The expression is not valid in the model language
    #[error("Failed to parse `{expression}`: {message}")]
    Parse {
        /// Source that failed
        expression: String,
        /// Parser diagnostic
        message: String,
    },

    /// The directive is not part of the loaded model
    #[error("Unknown directive: {0}")]
    UnknownDirective(DirectiveId),

    /// Any other engine failure
    #[error("Engine error: {0}")]
    Engine(String),
}

/// Blocking interface to a probabilistic-programming engine.
///
/// Calls must complete before the next one is issued; the harness never
/// shares an engine between threads.
pub trait Ripl {
    /// Parsed model expression, passed through to the engine untouched
    type Expr;

    /// Parse a model expression
    fn parse(&self, source: &str) -> Result<Self::Expr, RiplError>;

    /// Reset engine-held model state to empty
    fn clear(&mut self) -> Result<(), RiplError>;

    /// Bind `symbol` to `expr`, returning the directive and its initial value
    fn assume(&mut self, symbol: &str, expr: Self::Expr) -> Result<(DirectiveId, Value), RiplError>;

    /// Register an unconstrained tracked expression
    fn predict(&mut self, expr: Self::Expr) -> Result<(DirectiveId, Value), RiplError>;

    /// Constrain `expr` to `literal`
    fn observe(&mut self, expr: Self::Expr, literal: &Value) -> Result<DirectiveId, RiplError>;

    /// Current value of a registered directive
    fn report_value(&mut self, directive: DirectiveId) -> Result<Value, RiplError>;

    /// Perform `steps` inference transitions
    fn infer(&mut self, steps: u64) -> Result<(), RiplError>;

    /// Entropy diagnostics for the current model state
    fn entropy_info(&mut self) -> Result<EntropyInfo, RiplError>;

    /// Log-probability of the current model state
    fn logscore(&mut self) -> Result<f64, RiplError>;

    /// Current engine seed
    fn seed(&mut self) -> Result<u64, RiplError>;

    /// Reseed the engine
    fn set_seed(&mut self, seed: u64) -> Result<(), RiplError>;
}
