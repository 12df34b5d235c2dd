use crate::cost::piecewise::{PiecewiseQuadratic, QuadraticPiece};
use crate::cost::CostFunction;
use crate::error::Error;

/// Chooses the distance from one interpolation breakpoint to the next.
pub trait InterpolationRule {
    /// Step from `x` to the next breakpoint of `edge`. `f64::INFINITY` means one
    /// quadratic piece represents the rest of the cost exactly.
    fn step(&self, cost: &dyn CostFunction, edge: usize, x: f64) -> Result<f64, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationOptions {
    /// Flows are interpolated on `[-x_max, x_max]` intersected with the edge bounds.
    pub x_max: f64,
    /// Hard limit on the number of pieces generated per edge.
    pub max_breakpoints: usize,
}

impl InterpolationOptions {
    pub fn new(x_max: f64) -> Self {
        Self {
            x_max,
            max_breakpoints: 10_000,
        }
    }
}

/// Breakpoints at a fixed distance; quadratic edges are left untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformRule {
    pub width: f64,
}

impl InterpolationRule for UniformRule {
    fn step(&self, cost: &dyn CostFunction, edge: usize, _x: f64) -> Result<f64, Error> {
        match cost.degree(edge) {
            Some(d) if d <= 2 => Ok(f64::INFINITY),
            _ => Ok(self.width),
        }
    }
}

impl PiecewiseQuadratic {
    /// Approximates `cost` by piecewise-quadratic pieces whose marginal cost is the
    /// linear interpolation of the true marginal cost between the breakpoints chosen by
    /// `rule`.
    ///
    /// Each piece matches the cost value only at its left breakpoint, so the model can
    /// be discontinuous in value (but not in marginal cost) at the breakpoints.
    pub fn interpolate(
        cost: &dyn CostFunction,
        lower: &[f64],
        upper: &[f64],
        rule: &dyn InterpolationRule,
        options: InterpolationOptions,
    ) -> Result<Self, Error> {
        let m = cost.edge_count();
        for (what, len) in [("lower bounds", lower.len()), ("upper bounds", upper.len())] {
            if len != m {
                return Err(Error::LengthMismatch {
                    what,
                    expected: m,
                    found: len,
                });
            }
        }
        if !(options.x_max > 0.0) || options.x_max.is_infinite() {
            return Err(Error::InvalidConfig("x_max must be positive and finite"));
        }

        let edges = (0..m)
            .map(|e| interpolate_edge(cost, e, lower[e], upper[e], rule, &options))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "interpolated {} edges into {} pieces",
            m,
            edges.iter().map(Vec::len).sum::<usize>()
        );
        Self::new(edges)
    }
}

fn interpolate_edge(
    cost: &dyn CostFunction,
    edge: usize,
    lower: f64,
    upper: f64,
    rule: &dyn InterpolationRule,
    options: &InterpolationOptions,
) -> Result<Vec<QuadraticPiece>, Error> {
    let x_max = options.x_max;
    let start = lower.max(-x_max);
    let end = upper.min(x_max);
    if lower.is_nan() || upper.is_nan() || start > end {
        return Err(Error::InvalidBounds { edge });
    }
    if start == end {
        return Err(Error::InvalidPiece {
            edge,
            reason: "fixed-flow edges cannot be interpolated",
        });
    }

    let mut pieces = Vec::new();
    if lower > -x_max {
        pieces.push(QuadraticPiece::lower_bound(cost.eval(edge, lower, 0)));
    }

    let mut x = start;
    let mut generated = 0;
    loop {
        let delta = rule.step(cost, edge, x)?;
        if !(delta > 0.0) {
            return Err(Error::NoInterpolationStep { edge, x });
        }
        let tau = if pieces.is_empty() { f64::NEG_INFINITY } else { x };
        let value = cost.eval(edge, x, 0);
        let marginal = cost.eval(edge, x, 1);

        let (a, next) = if delta.is_infinite() {
            (cost.eval(edge, x, 2) / 2.0, None)
        } else {
            let y = (x + delta).min(end);
            let a = (cost.eval(edge, y, 1) - marginal) / (2.0 * (y - x));
            (a, (y < end).then_some(y))
        };
        let b = marginal - 2.0 * a * x;
        pieces.push(QuadraticPiece::new(tau, a, b, value - (a * x + b) * x));

        generated += 1;
        if generated > options.max_breakpoints {
            return Err(Error::TooManyBreakpoints {
                edge,
                limit: options.max_breakpoints,
            });
        }
        match next {
            Some(y) => x = y,
            None => break,
        }
    }

    if upper < x_max {
        pieces.push(QuadraticPiece::upper_bound(upper, cost.eval(edge, upper, 0)));
    }
    Ok(pieces)
}
