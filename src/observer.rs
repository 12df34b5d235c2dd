use crate::breakpoints::Breakpoint;

/// Summary of one EFA iteration, handed to observers after the pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    pub iteration: usize,
    /// λ at which the iteration started.
    pub lambda: f64,
    /// λ at which the pivoted edge leaves its piece.
    pub next_lambda: f64,
    /// Pivoted edge and the direction its region moved.
    pub pivot: Option<(usize, isize)>,
    pub boundary_size: usize,
    /// Whether the iteration resolved an ambiguous region instead of a regular pivot.
    pub ambiguous: bool,
}

/// Callbacks invoked while an EFA runs.
///
/// Observers of a two-phase run see the breakpoints of the start-region run first,
/// then those of the main run.
pub trait Observer {
    fn on_breakpoint(&mut self, _breakpoint: &Breakpoint) {}

    fn on_iteration(&mut self, _record: &IterationRecord) {}
}
