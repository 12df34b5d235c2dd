use core::fmt::Debug;

use crate::breakpoints::Breakpoints;

pub mod efa;

/// An algorithm that traces the optimal flow of a network as a function of the
/// demand parameter λ.
pub trait ParametricFlow {
    type Termination;
    type Error: Debug;

    fn run(&mut self) -> Result<Self::Termination, Self::Error>;

    fn breakpoints(&self) -> &Breakpoints;
}
