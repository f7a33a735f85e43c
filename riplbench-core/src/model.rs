//! Model definitions
//!
//! A benchmark model is a list of assumes (the generative model) and a list of
//! observes (constraints with their default literal data). Concrete models
//! implement [`ModelDefinition`].

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form benchmark configuration attached to every history for provenance
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// Parameter holding the engine seed used by a benchmarker
pub const SEED_PARAMETER: &str = "random_seed";

/// A named generative-model binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assume {
    /// Name the value is bound to
    pub symbol: String,
    /// Model-language source
    pub expression: String,
}

/// A model constraint paired with its literal conditioning value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observe {
    /// Model-language source
    pub expression: String,
    /// Default conditioning value
    pub literal: Value,
}

impl Assume {
    /// Bind `symbol` to `expression`
    pub fn new(symbol: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            expression: expression.into(),
        }
    }
}

impl Observe {
    /// Constrain `expression` to `literal`
    pub fn new(expression: impl Into<String>, literal: impl Into<Value>) -> Self {
        Self {
            expression: expression.into(),
            literal: literal.into(),
        }
    }
}

/// A concrete benchmark model
pub trait ModelDefinition {
    /// The generative model, in registration order
    fn build_assumes(&self) -> Vec<Assume>;

    /// Observations with their default data, in registration order
    fn build_observes(&self) -> Vec<Observe> {
        Vec::new()
    }
}
