//! Engine value decoding
//!
//! Engines report values either natively (booleans, numbers) or as tagged
//! strings of the form `TYPE[DATA]`. Values are decoded once, at the
//! boundary, into [`Value`]; only scalar-like variants are ever recorded.
//!
//! | Representation | Decoded as | Recordable |
//! |----------------|------------|------------|
//! | `true`, `3`, `0.5` | `Boolean`, `Integer`, `Float` | yes |
//! | `a[5]` | `Atom(5)` | yes |
//! | `lambda[...]`, `<procedure foo>` | `Other` | no |

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Tag used by engines for integer-coded categorical atoms
pub const ATOM_TAG: &str = "a";

/// A value reported by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean
    Boolean(bool),
    /// Integer
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Integer-coded discrete category (`a[N]`)
    Atom(i64),
    /// Anything else (procedures, compound data), kept as its representation
    Other(String),
}

/// Discriminant of a [`Value`], compared when deciding whether a series stays consistent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Boolean`]
    Boolean,
    /// [`Value::Integer`]
    Integer,
    /// [`Value::Float`]
    Float,
    /// [`Value::Atom`]
    Atom,
    /// [`Value::Other`]
    Other,
}

/// Numeric form of a recordable value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean, kept as such so exports stay faithful
    Bool(bool),
    /// Integer (atoms decode to this)
    Int(i64),
    /// Float
    Float(f64),
}

/// Decoding failures for tagged representations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// `a[...]` whose payload is not an integer
    #[error("Atom payload is not an integer: {0}")]
    MalformedAtom(String),
}

fn tagged_re() -> &'static Regex {
    static TAGGED_RE: OnceLock<Regex> = OnceLock::new();
    // Safety: this regex literal is guaranteed to compile
    TAGGED_RE.get_or_init(|| Regex::new(r"^([^\[\]]*)\[(.*)\]$").unwrap())
}

impl Value {
    /// Decode a string representation reported by the engine.
    ///
    /// Atom tags are decoded to [`Value::Atom`]; any other tag, or a string
    /// without a tag, becomes [`Value::Other`].
    pub fn from_repr(repr: &str) -> Result<Self, ValueError> {
        let Some(caps) = tagged_re().captures(repr) else {
            return Ok(Value::Other(repr.to_string()));
        };

        if &caps[1] != ATOM_TAG {
            return Ok(Value::Other(repr.to_string()));
        }

        caps[2]
            .trim()
            .parse::<i64>()
            .map(Value::Atom)
            .map_err(|_| ValueError::MalformedAtom(repr.to_string()))
    }

    /// Like [`Value::from_repr`], but a malformed atom becomes [`Value::Other`]
    /// so the value is skipped instead of failing the caller.
    pub fn from_repr_lossy(repr: &str) -> Self {
        Self::from_repr(repr).unwrap_or_else(|err| {
            tracing::warn!("{err}; treating value as non-scalar");
            Value::Other(repr.to_string())
        })
    }

    /// Discriminant of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Atom(_) => ValueKind::Atom,
            Value::Other(_) => ValueKind::Other,
        }
    }

    /// Whether this value is scalar-like and may be recorded in a series
    pub fn is_recordable(&self) -> bool {
        !matches!(self, Value::Other(_))
    }

    /// Numeric form, or `None` if the value is not recordable
    pub fn scalar(&self) -> Option<Scalar> {
        match *self {
            Value::Boolean(b) => Some(Scalar::Bool(b)),
            Value::Integer(i) | Value::Atom(i) => Some(Scalar::Int(i)),
            Value::Float(f) => Some(Scalar::Float(f)),
            Value::Other(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Atom(i) => write!(f, "{ATOM_TAG}[{i}]"),
            Value::Other(repr) => f.write_str(repr),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl Scalar {
    /// Value as a float (`true` is 1.0)
    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Scalar::Int(i) => i as f64,
            Scalar::Float(x) => x,
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<u64> for Scalar {
    fn from(i: u64) -> Self {
        Scalar::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}
