#![deny(
    warnings,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]
#![forbid(unsafe_code)]

//! Parametric minimum-cost flows.
//!
//! Given a network whose edges carry convex costs and a demand `b₀ + λ·b₁`, this crate
//! computes the optimal flow for every λ at once, as a list of [`Breakpoint`]s between
//! which the flow is linear. Edge costs must be piecewise quadratic for the exact
//! algorithm ([`Efa`]); smooth convex costs are brought into that form by
//! [`PiecewiseQuadratic::interpolate`] with an error guarantee from the [`Mca`] rule.

pub mod algo;
pub mod breakpoints;
pub mod cost;
pub mod demand;
pub mod error;
pub mod laplacian;
pub mod network;
pub mod numerics;
pub mod observer;

pub use algo::efa::{Efa, EfaConfig, PivotMode, State, Termination};
pub use algo::ParametricFlow;
pub use breakpoints::{Breakpoint, Breakpoints, Tail};
pub use cost::{
    CostFunction, InterpolationOptions, InterpolationRule, Mca, PiecewiseQuadratic,
    PolynomialCost, QuadraticPiece, UniformRule,
};
pub use demand::{AffineDemand, Demand, SparseVector};
pub use error::Error;
pub use laplacian::InverseMethod;
pub use network::{Incidence, Network};
pub use observer::{IterationRecord, Observer};

/// Runs the EFA to completion and returns its breakpoints.
///
/// `costs` must be piecewise quadratic; interpolate other costs first.
pub fn solve(
    network: &Network,
    costs: &dyn CostFunction,
    demand: &dyn Demand,
    config: EfaConfig,
) -> Result<Breakpoints, Error> {
    let mut efa = Efa::from_costs(network, costs, demand, config)?;
    let termination = efa.run()?;
    log::debug!("solve finished: {termination}");
    Ok(efa.into_breakpoints())
}
