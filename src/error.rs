use displaydoc::Display;

use crate::algo::efa::Termination;

#[derive(Clone, Debug, PartialEq, Display)]
pub enum Error {
    /// Inconsistent {what} length: expected {expected}, found {found}
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// Node index {0} is out of range
    NodeOutOfRange(usize),
    /// Invalid edge from node {0} to itself
    SelfLoop(usize),
    /// Invalid flow bounds on edge {edge}: lower bound exceeds upper bound
    InvalidBounds { edge: usize },
    /// Invalid cost piece on edge {edge}: {reason}
    InvalidPiece { edge: usize, reason: &'static str },
    /// Breakpoints of edge {0} are not strictly increasing
    UnsortedBreakpoints(usize),
    /// Region {region} is out of range for edge {edge}
    RegionOutOfRange { edge: usize, region: isize },
    /// Cost function is not piecewise quadratic
    NotPiecewiseQuadratic,
    /// Demand has {0} commodities, expected a single commodity
    MultiCommodity(usize),
    /// Demand is not affine in the parameter
    NonAffineDemand,
    /// Demand does not sum to zero (imbalance {0})
    UnbalancedDemand(f64),
    /// Unknown configuration parameter `{0}`
    UnknownParameter(String),
    /// Invalid value `{value}` for configuration parameter `{key}`
    InvalidParameterValue { key: String, value: String },
    /// Invalid pivot mode `{0}`, expected one of: lexicographic, random, first
    InvalidPivotMode(String),
    /// Invalid inverse method `{0}`, expected one of: direct, cholesky
    InvalidInverseMethod(String),
    /// Invalid configuration: {0}
    InvalidConfig(&'static str),
    /// Interpolation of edge {edge} exceeded the limit of {limit} breakpoints
    TooManyBreakpoints { edge: usize, limit: usize },
    /// Interpolation rule found no admissible step on edge {edge} at x = {x}
    NoInterpolationStep { edge: usize, x: f64 },
    /// Bisection did not converge on edge {edge} at x = {x}
    BisectionLimit { edge: usize, x: f64 },
    /// Zero flow admits no consistent node potential
    InfeasibleStart,
    /// Laplacian of a connected region is numerically singular at λ = {0}
    NumericallySingular(f64),
    /// Start-region run stopped early: {0}
    NestedRun(Termination),
}

impl std::error::Error for Error {}
