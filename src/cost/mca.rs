//! Marginal-cost approximation (MCA) interpolation rule.
//!
//! For a cost whose marginal cost `f` is convex for positive flows (and concave for
//! negative ones), the rule picks the longest step `δ` from `x` such that
//!
//! ```text
//! δ²·max(|f''(x)|, |f''(x+δ)|) <= 8·[(α-1)·min(|f(x)|, |f(x+δ)|) + β/(m·x_max)]
//! ```
//!
//! which bounds the error of linearly interpolating `f` over `[x, x+δ]`. Summed over
//! all `m` edges, the optimum of the resulting piecewise-quadratic network costs at
//! most `α·OPT + β` under the true costs.

use crate::cost::interpolate::InterpolationRule;
use crate::cost::CostFunction;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mca {
    /// Relative error factor, greater than one.
    pub alpha: f64,
    /// Absolute error budget shared by all edges.
    pub beta: f64,
    /// Bound on the magnitude of any feasible flow.
    pub x_max: f64,
    pub edge_count: usize,
    /// Bisection stops once the bracket is narrower than `tolerance·max(1, |x|)`.
    pub tolerance: f64,
    pub max_bisections: usize,
}

impl Mca {
    pub fn new(alpha: f64, beta: f64, x_max: f64, edge_count: usize) -> Result<Self, Error> {
        if !(alpha > 1.0) || alpha.is_infinite() {
            return Err(Error::InvalidConfig("alpha must be finite and greater than 1"));
        }
        if !(beta > 0.0) || beta.is_infinite() {
            return Err(Error::InvalidConfig("beta must be finite and positive"));
        }
        if !(x_max > 0.0) || x_max.is_infinite() {
            return Err(Error::InvalidConfig("x_max must be finite and positive"));
        }
        if edge_count == 0 {
            return Err(Error::InvalidConfig("edge count must be positive"));
        }
        Ok(Self {
            alpha,
            beta,
            x_max,
            edge_count,
            tolerance: 1e-10,
            max_bisections: 200,
        })
    }

    fn budget(&self) -> f64 {
        self.beta / (self.edge_count as f64 * self.x_max)
    }
}

impl InterpolationRule for Mca {
    fn step(&self, cost: &dyn CostFunction, edge: usize, x: f64) -> Result<f64, Error> {
        if matches!(cost.degree(edge), Some(d) if d <= 2) {
            return Ok(f64::INFINITY);
        }

        // the curvature changes sign at zero, so zero is always a breakpoint
        let mut limit = self.x_max - x;
        if x < 0.0 {
            limit = limit.min(-x);
        }
        if !(limit > 0.0) {
            return Err(Error::NoInterpolationStep { edge, x });
        }

        let marginal = |y: f64| cost.eval(edge, y, 1).abs();
        let curvature = |y: f64| cost.eval(edge, y, 3).abs();
        let (fx, cx) = (marginal(x), curvature(x));
        let budget = self.budget();
        let slack = |delta: f64| {
            let y = x + delta;
            8.0 * ((self.alpha - 1.0) * fx.min(marginal(y)) + budget)
                - delta * delta * cx.max(curvature(y))
        };

        if slack(limit) >= 0.0 {
            return Ok(limit);
        }

        let width = self.tolerance * x.abs().max(1.0);
        let (mut lo, mut hi) = (0.0, limit);
        for _ in 0..self.max_bisections {
            if hi - lo <= width {
                return if lo > 0.0 {
                    Ok(lo)
                } else {
                    Err(Error::NoInterpolationStep { edge, x })
                };
            }
            let mid = 0.5 * (lo + hi);
            let s = slack(mid);
            if s.is_nan() {
                return Err(Error::NoInterpolationStep { edge, x });
            }
            if s >= 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Err(Error::BisectionLimit { edge, x })
    }
}
