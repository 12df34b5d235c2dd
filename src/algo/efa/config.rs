use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::laplacian::InverseMethod;
use crate::numerics::snap_threshold;

/// How the EFA chooses among several edges reaching their piece boundary at the same λ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PivotMode {
    /// Lexicographically smallest scaled column; never cycles.
    #[default]
    Lexicographic,
    /// Uniform choice from the seeded generator.
    Random,
    /// Lowest edge index.
    First,
}

impl FromStr for PivotMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lexicographic" | "lex" => Ok(Self::Lexicographic),
            "random" => Ok(Self::Random),
            "first" => Ok(Self::First),
            _ => Err(Error::InvalidPivotMode(s.to_string())),
        }
    }
}

impl fmt::Display for PivotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexicographic => f.write_str("lexicographic"),
            Self::Random => f.write_str("random"),
            Self::First => f.write_str("first"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EfaConfig {
    /// The run stops once λ would exceed this value.
    pub lambda_max: f64,
    pub inverse_method: InverseMethod,
    pub pivot_mode: PivotMode,
    pub max_iter: usize,
    /// Every `recompute_interval`-th pivot refactors the Laplacian from scratch; 0 never.
    pub recompute_interval: usize,
    /// Values below `max(10^round_abs_exponent, 10^round_rel_exponent · scale)` are zero.
    pub round_abs_exponent: i32,
    pub round_rel_exponent: i32,
    /// Log every iteration at info level instead of trace.
    pub verbose: bool,
    /// Seed for random pivoting and ambiguous tie breaking.
    pub seed: u64,
}

impl Default for EfaConfig {
    fn default() -> Self {
        Self {
            lambda_max: f64::INFINITY,
            inverse_method: InverseMethod::default(),
            pivot_mode: PivotMode::default(),
            max_iter: 10_000,
            recompute_interval: 0,
            round_abs_exponent: -12,
            round_rel_exponent: -10,
            verbose: false,
            seed: 0,
        }
    }
}

impl EfaConfig {
    pub fn with_lambda_max(mut self, lambda_max: f64) -> Self {
        self.lambda_max = lambda_max;
        self
    }

    pub fn with_pivot_mode(mut self, pivot_mode: PivotMode) -> Self {
        self.pivot_mode = pivot_mode;
        self
    }

    pub fn with_inverse_method(mut self, inverse_method: InverseMethod) -> Self {
        self.inverse_method = inverse_method;
        self
    }

    /// Sets a parameter from its textual form, as given on the command line.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let invalid = || Error::InvalidParameterValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let value = value.trim();
        match key {
            "lambda_max" => self.lambda_max = value.parse().map_err(|_| invalid())?,
            "inverse_method" => self.inverse_method = value.parse()?,
            "pivot_mode" => self.pivot_mode = value.parse()?,
            "max_iter" => self.max_iter = value.parse().map_err(|_| invalid())?,
            "recompute_interval" => {
                let n: i64 = value.parse().map_err(|_| invalid())?;
                self.recompute_interval = usize::try_from(n).unwrap_or(0);
            }
            "round_abs_exponent" => {
                self.round_abs_exponent = value.parse().map_err(|_| invalid())?
            }
            "round_rel_exponent" => {
                self.round_rel_exponent = value.parse().map_err(|_| invalid())?
            }
            "verbose" => self.verbose = value.parse().map_err(|_| invalid())?,
            "seed" => self.seed = value.parse().map_err(|_| invalid())?,
            _ => return Err(Error::UnknownParameter(key.to_string())),
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.lambda_max.is_nan() || self.lambda_max < 0.0 {
            return Err(Error::InvalidConfig("lambda_max must be non-negative"));
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidConfig("max_iter must be positive"));
        }
        Ok(())
    }

    pub(crate) fn snap_threshold(&self, scale: f64) -> f64 {
        snap_threshold(scale, self.round_abs_exponent, self.round_rel_exponent)
    }
}
