//! In-memory reference engine
//!
//! [`SimulatedRipl`] implements [`Ripl`] for a tiny expression vocabulary so
//! the drivers can be exercised without an external engine:
//!
//! | Expression | Value | Random |
//! |------------|-------|--------|
//! | `(flip p)` | `Boolean` | yes |
//! | `(normal mean std)` | `Float`; `mean` may name an assumed symbol | yes |
//! | `(uniform_discrete lo hi)` | `Atom` in `[lo, hi)` | yes |
//! | `(lambda ...)` | `Other` (a procedure) | no |
//! | `(flaky)` | alternates `Integer` / `Float` on every report | no |
//! | `true`, `3`, `0.5`, `a[2]` | literal | no |
//!
//! Inference resamples one unconstrained choice from its prior per step.

use crate::ripl::{DirectiveId, EntropyInfo, Ripl, RiplError};
use crate::value::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Mean of a `normal`: a constant or an assumed symbol
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Numeric constant
    Const(f64),
    /// Current value of an assumed symbol
    Symbol(String),
}

/// Parsed expression understood by [`SimulatedRipl`]
#[derive(Debug, Clone, PartialEq)]
pub enum SimExpr {
    /// `(flip p)`
    Flip(f64),
    /// `(normal mean std)`
    Normal {
        /// Mean
        mean: Operand,
        /// Standard deviation
        std: f64,
    },
    /// `(uniform_discrete lo hi)`
    UniformDiscrete(i64, i64),
    /// `(lambda ...)`, kept as source
    Lambda(String),
    /// `(flaky)`
    Flaky,
    /// A literal value
    Literal(Value),
}

impl SimExpr {
    fn is_random(&self) -> bool {
        matches!(
            self,
            SimExpr::Flip(_) | SimExpr::Normal { .. } | SimExpr::UniformDiscrete(..)
        )
    }
}

#[derive(Debug, Clone)]
struct Directive {
    id: DirectiveId,
    symbol: Option<String>,
    expr: SimExpr,
    value: Value,
    observed: bool,
    reports: u64,
}

/// Deterministic in-memory [`Ripl`]
#[derive(Debug, Clone)]
pub struct SimulatedRipl {
    seed: u64,
    rng: StdRng,
    directives: Vec<Directive>,
    next_id: u64,
    steps: u64,
    latent: u64,
    latent_growth: u64,
    latent_cap: u64,
}

impl SimulatedRipl {
    /// Create an engine seeded with `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            directives: Vec::new(),
            next_id: 0,
            steps: 0,
            latent: 0,
            latent_growth: 0,
            latent_cap: 0,
        }
    }

    /// Add `growth` hidden unconstrained choices on every `infer` call, up to `cap`.
    ///
    /// Mimics models whose structure grows as inference proceeds.
    pub fn with_latent_growth(mut self, growth: u64, cap: u64) -> Self {
        self.latent_growth = growth;
        self.latent_cap = cap;
        self
    }

    /// Total inference steps performed since creation
    pub fn steps_taken(&self) -> u64 {
        self.steps
    }

    /// Directives currently registered
    pub fn directive_count(&self) -> usize {
        self.directives.len()
    }

    fn lookup(&self, id: DirectiveId) -> Result<usize, RiplError> {
        self.directives
            .iter()
            .position(|d| d.id == id)
            .ok_or(RiplError::UnknownDirective(id))
    }

    fn resolve(&self, operand: &Operand) -> Result<f64, RiplError> {
        match operand {
            Operand::Const(x) => Ok(*x),
            Operand::Symbol(name) => self
                .directives
                .iter()
                .find(|d| d.symbol.as_deref() == Some(name.as_str()))
                .and_then(|d| d.value.scalar())
                .map(|s| s.as_f64())
                .ok_or_else(|| RiplError::Engine(format!("Unbound numeric symbol: {name}"))),
        }
    }

    fn sample(&mut self, expr: &SimExpr) -> Result<Value, RiplError> {
        Ok(match expr {
            SimExpr::Flip(p) => Value::Boolean(self.rng.gen_bool(*p)),
            SimExpr::Normal { mean, std } => {
                let mean = self.resolve(mean)?;
                let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
                let u2: f64 = self.rng.gen_range(0.0..1.0);
                let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
                Value::Float(mean + std * z)
            }
            SimExpr::UniformDiscrete(lo, hi) => Value::Atom(self.rng.gen_range(*lo..*hi)),
            SimExpr::Lambda(src) => Value::Other(format!("lambda[{src}]")),
            SimExpr::Flaky => Value::Integer(0),
            SimExpr::Literal(value) => value.clone(),
        })
    }

    fn register(
        &mut self,
        symbol: Option<&str>,
        expr: SimExpr,
        observed: Option<&Value>,
    ) -> Result<(DirectiveId, Value), RiplError> {
        let value = match observed {
            Some(literal) => literal.clone(),
            None => self.sample(&expr)?,
        };
        let id = DirectiveId(self.next_id);
        self.next_id += 1;
        self.directives.push(Directive {
            id,
            symbol: symbol.map(str::to_string),
            expr,
            value: value.clone(),
            observed: observed.is_some(),
            reports: 0,
        });
        Ok((id, value))
    }

    fn unconstrained(&self) -> Vec<usize> {
        self.directives
            .iter()
            .enumerate()
            .filter(|(_, d)| d.expr.is_random() && !d.observed)
            .map(|(i, _)| i)
            .collect()
    }

    fn log_density(&self, directive: &Directive) -> Result<f64, RiplError> {
        Ok(match (&directive.expr, &directive.value) {
            (SimExpr::Flip(p), Value::Boolean(b)) => {
                if *b {
                    p.ln()
                } else {
                    (1.0 - p).ln()
                }
            }
            (SimExpr::Normal { mean, std }, value) => match value.scalar() {
                Some(x) => {
                    let z = (x.as_f64() - self.resolve(mean)?) / std;
                    -0.5 * (std::f64::consts::TAU).ln() - std.ln() - 0.5 * z * z
                }
                None => f64::NEG_INFINITY,
            },
            (SimExpr::UniformDiscrete(lo, hi), Value::Atom(k) | Value::Integer(k)) => {
                if (lo..hi).contains(&k) {
                    -((hi - lo) as f64).ln()
                } else {
                    f64::NEG_INFINITY
                }
            }
            (expr, _) if expr.is_random() => f64::NEG_INFINITY,
            _ => 0.0,
        })
    }
}

fn parse_error(source: &str, message: impl Into<String>) -> RiplError {
    RiplError::Parse {
        expression: source.to_string(),
        message: message.into(),
    }
}

fn parse_number<T: std::str::FromStr>(source: &str, token: Option<&str>) -> Result<T, RiplError> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| parse_error(source, "expected a number"))
}

fn parse_literal(source: &str) -> Result<Value, RiplError> {
    match source {
        "true" => return Ok(Value::Boolean(true)),
        "false" => return Ok(Value::Boolean(false)),
        _ => {}
    }
    if let Ok(i) = source.parse::<i64>() {
        return Ok(Value::Integer(i));
    }
    if let Ok(x) = source.parse::<f64>() {
        return Ok(Value::Float(x));
    }
    match Value::from_repr(source) {
        Ok(Value::Other(_)) => Err(parse_error(source, "unknown literal")),
        Ok(value) => Ok(value),
        Err(err) => Err(parse_error(source, err.to_string())),
    }
}

impl Ripl for SimulatedRipl {
    type Expr = SimExpr;

    fn parse(&self, source: &str) -> Result<SimExpr, RiplError> {
        let source = source.trim();
        let Some(inner) = source.strip_prefix('(').and_then(|s| s.strip_suffix(')')) else {
            return parse_literal(source).map(SimExpr::Literal);
        };

        let mut tokens = inner.split_whitespace();
        match tokens.next() {
            Some("flip") => {
                let p: f64 = parse_number(source, tokens.next())?;
                if !(0.0..=1.0).contains(&p) {
                    return Err(parse_error(source, "flip weight must lie in [0, 1]"));
                }
                Ok(SimExpr::Flip(p))
            }
            Some("normal") => {
                let mean = match tokens.next() {
                    Some(t) => t
                        .parse()
                        .map(Operand::Const)
                        .unwrap_or_else(|_| Operand::Symbol(t.to_string())),
                    None => return Err(parse_error(source, "normal needs a mean")),
                };
                let std: f64 = parse_number(source, tokens.next())?;
                if std <= 0.0 {
                    return Err(parse_error(source, "standard deviation must be positive"));
                }
                Ok(SimExpr::Normal { mean, std })
            }
            Some("uniform_discrete") => {
                let lo: i64 = parse_number(source, tokens.next())?;
                let hi: i64 = parse_number(source, tokens.next())?;
                if hi <= lo {
                    return Err(parse_error(source, "empty range"));
                }
                Ok(SimExpr::UniformDiscrete(lo, hi))
            }
            Some("lambda") => Ok(SimExpr::Lambda(inner.to_string())),
            Some("flaky") => Ok(SimExpr::Flaky),
            Some(other) => Err(parse_error(source, format!("unknown operator `{other}`"))),
            None => Err(parse_error(source, "empty expression")),
        }
    }

    fn clear(&mut self) -> Result<(), RiplError> {
        self.directives.clear();
        self.latent = 0;
        Ok(())
    }

    fn assume(&mut self, symbol: &str, expr: SimExpr) -> Result<(DirectiveId, Value), RiplError> {
        self.register(Some(symbol), expr, None)
    }

    fn predict(&mut self, expr: SimExpr) -> Result<(DirectiveId, Value), RiplError> {
        self.register(None, expr, None)
    }

    fn observe(&mut self, expr: SimExpr, literal: &Value) -> Result<DirectiveId, RiplError> {
        self.register(None, expr, Some(literal)).map(|(id, _)| id)
    }

    fn report_value(&mut self, directive: DirectiveId) -> Result<Value, RiplError> {
        let idx = self.lookup(directive)?;
        let entry = &mut self.directives[idx];
        if entry.expr == SimExpr::Flaky {
            entry.reports += 1;
            let n = entry.reports as i64;
            entry.value = if n % 2 == 1 {
                Value::Integer(n)
            } else {
                Value::Float(n as f64)
            };
        }
        Ok(entry.value.clone())
    }

    fn infer(&mut self, steps: u64) -> Result<(), RiplError> {
        self.steps += steps;
        self.latent = (self.latent + self.latent_growth).min(self.latent_cap);

        let candidates = self.unconstrained();
        let slots = candidates.len() as u64 + self.latent;
        if slots == 0 {
            return Ok(());
        }

        for _ in 0..steps {
            let slot = self.rng.gen_range(0..slots) as usize;
            if let Some(&idx) = candidates.get(slot) {
                let expr = self.directives[idx].expr.clone();
                self.directives[idx].value = self.sample(&expr)?;
            }
        }
        Ok(())
    }

    fn entropy_info(&mut self) -> Result<EntropyInfo, RiplError> {
        Ok(EntropyInfo {
            unconstrained_random_choices: self.unconstrained().len() as u64 + self.latent,
        })
    }

    fn logscore(&mut self) -> Result<f64, RiplError> {
        self.directives
            .iter()
            .map(|d| self.log_density(d))
            .sum()
    }

    fn seed(&mut self) -> Result<u64, RiplError> {
        Ok(self.seed)
    }

    fn set_seed(&mut self, seed: u64) -> Result<(), RiplError> {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
        Ok(())
    }
}
