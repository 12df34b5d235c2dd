//! Edge cost functions.
//!
//! [`CostFunction`] is the common view used by the interpolation driver: a per-edge
//! convex function that can be differentiated. [`PiecewiseQuadratic`] is the only
//! representation the EFA accepts; smooth costs such as [`PolynomialCost`] are turned
//! into one with [`PiecewiseQuadratic::interpolate`].

pub mod interpolate;
pub mod mca;
pub mod piecewise;

pub use interpolate::{InterpolationOptions, InterpolationRule, UniformRule};
pub use mca::Mca;
pub use piecewise::{Piece, PiecewiseQuadratic, QuadraticPiece};

use crate::error::Error;

pub trait CostFunction {
    fn edge_count(&self) -> usize;

    /// `derivative`-th derivative of the cost of `edge` at flow `x`.
    fn eval(&self, edge: usize, x: f64, derivative: u32) -> f64;

    /// Polynomial degree of the cost of `edge`, if known.
    fn degree(&self, _edge: usize) -> Option<usize> {
        None
    }

    fn as_piecewise_quadratic(&self) -> Option<&PiecewiseQuadratic> {
        None
    }
}

/// Per-edge polynomial cost `Σ_k coeffs[e][k]·x^k`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolynomialCost {
    coefficients: Vec<Vec<f64>>,
}

impl PolynomialCost {
    pub fn new(coefficients: Vec<Vec<f64>>) -> Result<Self, Error> {
        if let Some(edge) = coefficients
            .iter()
            .position(|c| c.iter().any(|v| !v.is_finite()))
        {
            return Err(Error::InvalidPiece {
                edge,
                reason: "polynomial coefficients must be finite",
            });
        }
        Ok(Self { coefficients })
    }

    pub fn coefficients(&self, edge: usize) -> &[f64] {
        &self.coefficients[edge]
    }
}

impl CostFunction for PolynomialCost {
    fn edge_count(&self) -> usize {
        self.coefficients.len()
    }

    fn eval(&self, edge: usize, x: f64, derivative: u32) -> f64 {
        let d = derivative as usize;
        // Horner on the derivative coefficients k!/(k-d)! · c_k
        self.coefficients[edge]
            .iter()
            .enumerate()
            .skip(d)
            .rev()
            .fold(0.0, |acc, (k, &c)| {
                let falling: f64 = ((k - d + 1)..=k).map(|i| i as f64).product();
                acc * x + falling * c
            })
    }

    fn degree(&self, edge: usize) -> Option<usize> {
        Some(
            self.coefficients[edge]
                .iter()
                .rposition(|&c| c != 0.0)
                .unwrap_or(0),
        )
    }
}
