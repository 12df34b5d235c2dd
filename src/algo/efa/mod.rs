//! Exact parametric flow algorithm (EFA).
//!
//! For a network with piecewise-quadratic edge costs and a demand `b₀ + λ·b₁`, the
//! optimal flow is piecewise linear in λ. Inside a *region* (one active piece per
//! edge) the optimality conditions are linear:
//!
//! ```text
//! x = C·Γᵀπ - d,    Γx = b₀ + λ·b₁    =>    π(λ) = L*·(Γd + b₀) + λ·L*·b₁
//! ```
//!
//! with `C = diag(c)` and `L = Γ·C·Γᵀ`. The algorithm walks λ upwards from zero,
//! emitting a breakpoint whenever some edge's potential difference leaves the marginal
//! cost window of its piece, and pivots that edge into the neighbouring piece.
//!
//! A region whose active edges do not connect the network makes `L` singular. Such
//! *ambiguous* regions are left by raising the potential of a set of components until
//! another edge changes piece.

mod bootstrap;
pub mod config;
mod pivot;

use displaydoc::Display;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::algo::ParametricFlow;
use crate::breakpoints::{Breakpoint, Breakpoints, Tail};
use crate::cost::{CostFunction, Piece, PiecewiseQuadratic};
use crate::demand::{affine_parts, Demand};
use crate::error::Error;
use crate::laplacian::{invert, Components, Inverted, LaplacianInverse};
use crate::network::{Incidence, Network};
use crate::numerics::{max_abs, snap_to_zero, TIE_EPSILON};
use crate::observer::{IterationRecord, Observer};
use bootstrap::{zero_flow_start, Start};
pub use config::{EfaConfig, PivotMode};
use pivot::Candidate;

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum Termination {
    /// λ exceeded the configured maximum
    LambdaLargerMax,
    /// the solution is linear up to λ = +∞
    LambdaInf,
    /// no edge limits the growth of an ambiguous region
    NoBoundary,
    /// no edge attains the next breakpoint
    EmptyBoundary,
    /// iteration limit reached
    MaxIter,
}

#[derive(Clone, Debug, PartialEq)]
pub enum State {
    Initializing,
    Iterating,
    Ambiguous,
    Terminated(Termination),
    Failed(Error),
}

/// Data of an ambiguous region: a valid potential and the components of the active
/// subgraph.
#[derive(Debug, Clone)]
struct Ambiguity {
    potential: Vec<f64>,
    components: Components,
}

enum Phase {
    Initializing,
    Iterating(LaplacianInverse),
    Ambiguous(Ambiguity),
    Terminated(Termination),
    Failed(Error),
}

pub struct Efa {
    incidence: Incidence,
    costs: PiecewiseQuadratic,
    config: EfaConfig,
    base: Vec<f64>,
    slope: Vec<f64>,
    phase: Phase,
    region: Vec<usize>,
    initial_region: Vec<usize>,
    coeffs: Vec<Piece>,
    initial_weights: Vec<f64>,
    lambda: f64,
    potential: Vec<f64>,
    breakpoints: Breakpoints,
    observers: Vec<Box<dyn Observer>>,
    rng: Xoshiro256PlusPlus,
    iterations: usize,
    pivots: usize,
    ambiguous_resolutions: usize,
}

impl Efa {
    /// Validates the inputs; the starting region is computed by the first [`Efa::step`].
    pub fn new(
        incidence: Incidence,
        costs: PiecewiseQuadratic,
        demand: &dyn Demand,
        config: EfaConfig,
    ) -> Result<Self, Error> {
        if costs.edge_count() != incidence.edge_count() {
            return Err(Error::LengthMismatch {
                what: "edge costs",
                expected: incidence.edge_count(),
                found: costs.edge_count(),
            });
        }
        config.validate()?;
        let (base, slope) = affine_parts(demand, incidence.node_count())?;
        Ok(Self::with_parts(incidence, costs, base, slope, config))
    }

    pub fn from_network(
        network: &Network,
        costs: PiecewiseQuadratic,
        demand: &dyn Demand,
        config: EfaConfig,
    ) -> Result<Self, Error> {
        Self::new(network.incidence(), costs, demand, config)
    }

    /// Like [`Efa::from_network`], for costs that must turn out to be piecewise quadratic.
    pub fn from_costs(
        network: &Network,
        costs: &dyn CostFunction,
        demand: &dyn Demand,
        config: EfaConfig,
    ) -> Result<Self, Error> {
        let costs = costs
            .as_piecewise_quadratic()
            .ok_or(Error::NotPiecewiseQuadratic)?
            .clone();
        Self::from_network(network, costs, demand, config)
    }

    fn with_parts(
        incidence: Incidence,
        costs: PiecewiseQuadratic,
        base: Vec<f64>,
        slope: Vec<f64>,
        config: EfaConfig,
    ) -> Self {
        let rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        Self {
            incidence,
            costs,
            config,
            base,
            slope,
            phase: Phase::Initializing,
            region: Vec::new(),
            initial_region: Vec::new(),
            coeffs: Vec::new(),
            initial_weights: Vec::new(),
            lambda: 0.0,
            potential: Vec::new(),
            breakpoints: Breakpoints::new(),
            observers: Vec::new(),
            rng,
            iterations: 0,
            pivots: 0,
            ambiguous_resolutions: 0,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn into_observers(self) -> Vec<Box<dyn Observer>> {
        self.observers
    }

    pub fn into_breakpoints(self) -> Breakpoints {
        self.breakpoints
    }

    /// Runs until a termination condition is met.
    pub fn run(&mut self) -> Result<Termination, Error> {
        loop {
            match self.step()? {
                State::Terminated(t) => return Ok(t),
                State::Failed(e) => return Err(e),
                _ => {}
            }
        }
    }

    /// Advances the state machine by one transition.
    pub fn step(&mut self) -> Result<State, Error> {
        let phase = std::mem::replace(&mut self.phase, Phase::Initializing);
        let next = match phase {
            Phase::Initializing => self.initialize(),
            Phase::Iterating(inverse) => self.iterate(inverse),
            Phase::Ambiguous(ambiguity) => self.resolve(ambiguity),
            done @ (Phase::Terminated(_) | Phase::Failed(_)) => Ok(done),
        };
        match next {
            Ok(phase) => {
                self.phase = phase;
                Ok(self.state())
            }
            Err(e) => {
                log::info!("EFA failed at λ = {}: {e}", self.lambda);
                self.phase = Phase::Failed(e.clone());
                Err(e)
            }
        }
    }

    pub fn state(&self) -> State {
        match &self.phase {
            Phase::Initializing => State::Initializing,
            Phase::Iterating(_) => State::Iterating,
            Phase::Ambiguous(_) => State::Ambiguous,
            Phase::Terminated(t) => State::Terminated(*t),
            Phase::Failed(e) => State::Failed(e.clone()),
        }
    }

    pub fn termination(&self) -> Option<Termination> {
        match self.phase {
            Phase::Terminated(t) => Some(t),
            _ => None,
        }
    }

    pub fn config(&self) -> &EfaConfig {
        &self.config
    }

    /// Current λ, the lower end of the region being explored.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn region(&self) -> &[usize] {
        &self.region
    }

    pub fn initial_region(&self) -> &[usize] {
        &self.initial_region
    }

    pub fn edge_coeffs(&self) -> &[Piece] {
        &self.coeffs
    }

    /// Node potentials at the current λ.
    pub fn node_potentials(&self) -> &[f64] {
        &self.potential
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn ambiguous_resolutions(&self) -> usize {
        self.ambiguous_resolutions
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    fn weights(&self) -> Vec<f64> {
        self.coeffs.iter().map(|p| p.c).collect()
    }

    fn initialize(&mut self) -> Result<Phase, Error> {
        log::info!(
            "EFA start: {} nodes, {} edges, pivot mode {}, {} inverse",
            self.incidence.node_count(),
            self.incidence.edge_count(),
            self.config.pivot_mode,
            self.config.inverse_method,
        );
        let start = if self.base.iter().all(|&b| b == 0.0) {
            zero_flow_start(&self.incidence, &self.costs)?
        } else {
            self.start_from_base()?
        };

        self.coeffs = self.costs.get_coefficients(&start.region)?;
        self.initial_region = start.region.clone();
        self.region = start.region;
        self.initial_weights = self.weights();
        self.potential = start.potential;
        self.lambda = 0.0;

        Ok(
            match invert(&self.incidence, &self.initial_weights, self.config.inverse_method)? {
                Inverted::Regular(inverse) => Phase::Iterating(inverse),
                Inverted::Singular(components) => {
                    log::debug!("start region is ambiguous ({} components)", components.count);
                    Phase::Ambiguous(Ambiguity {
                        potential: self.potential.clone(),
                        components,
                    })
                }
            },
        )
    }

    /// Solves the base demand alone, as a linear demand up to λ = 1, and starts from
    /// the region and potentials that run ends in.
    fn start_from_base(&mut self) -> Result<Start, Error> {
        log::debug!("running start-region EFA on the base demand");
        let mut config = self.config.clone();
        config.lambda_max = 1.0;
        let zero = vec![0.0; self.incidence.node_count()];
        let mut inner = Self::with_parts(
            self.incidence.clone(),
            self.costs.clone(),
            zero,
            self.base.clone(),
            config,
        );
        inner.observers = std::mem::take(&mut self.observers);
        let result = inner.run();
        self.observers = std::mem::take(&mut inner.observers);
        self.ambiguous_resolutions += inner.ambiguous_resolutions;

        let termination = result?;
        if !matches!(
            termination,
            Termination::LambdaLargerMax | Termination::LambdaInf
        ) {
            return Err(Error::NestedRun(termination));
        }
        let potential = inner
            .breakpoints
            .potential_at(1.0)
            .ok_or(Error::NestedRun(termination))?;
        Ok(Start {
            potential,
            region: inner.region,
        })
    }

    fn iterate(&mut self, inverse: LaplacianInverse) -> Result<Phase, Error> {
        if self.iterations >= self.config.max_iter {
            return Ok(self.terminate(Termination::MaxIter));
        }
        self.iterations += 1;
        let lambda = self.lambda;

        // π(λ) = π_t + λ·Δπ
        let d: Vec<f64> = self.coeffs.iter().map(|p| p.d).collect();
        let mut rhs = self.incidence.apply(&d);
        rhs.iter_mut().zip(&self.base).for_each(|(r, b)| *r += b);
        let pi_t = inverse.solve(&rhs);
        let d_pi = inverse.solve(&self.slope);

        let g0 = self.incidence.transpose_apply(&pi_t);
        let mut g1 = self.incidence.transpose_apply(&d_pi);
        let threshold = self.config.snap_threshold(max_abs(&g1));
        g1.iter_mut().for_each(|g| *g = snap_to_zero(*g, threshold));

        // λ at which each edge leaves the window of its piece
        let bounds: Vec<(Candidate, f64)> = self
            .coeffs
            .iter()
            .enumerate()
            .filter(|&(e, _)| g1[e] != 0.0)
            .filter_map(|(e, p)| {
                let sigma = if g1[e] > 0.0 { p.sigma_u } else { p.sigma_l };
                sigma.is_finite().then(|| {
                    let at = ((sigma - g0[e]) / g1[e]).max(lambda);
                    (Candidate { edge: e, slope: g1[e] }, at)
                })
            })
            .collect();

        let current = self.breakpoint(lambda, &pi_t, &d_pi);
        self.potential = current.potential.clone();

        // no edge ever leaves its piece: the solution is linear from here on
        if bounds.is_empty() {
            self.emit(current);
            let flow_slope = self.coeffs.iter().zip(&g1).map(|(p, g)| p.c * g).collect();
            self.breakpoints.set_tail(Tail {
                flow_slope,
                potential_slope: d_pi,
            });
            return Ok(self.terminate(Termination::LambdaInf));
        }

        let next = bounds.iter().map(|&(_, at)| at).fold(f64::INFINITY, f64::min);
        let tie = TIE_EPSILON * next.abs().max(1.0);
        let boundary: Vec<Candidate> = bounds
            .iter()
            .filter(|&&(_, at)| at <= next + tie)
            .map(|&(c, _)| c)
            .collect();

        if boundary.is_empty() {
            self.emit(current);
            return Ok(self.terminate(Termination::EmptyBoundary));
        }
        if next > self.config.lambda_max {
            self.emit(current);
            self.emit_clamped(lambda, &pi_t, &d_pi);
            return Ok(self.terminate(Termination::LambdaLargerMax));
        }
        self.emit(current);

        let chosen = boundary[self.choose(&boundary, &inverse)];
        let step = chosen.step();
        self.trace(format_args!(
            "iteration {}: λ = {lambda} -> {next}, {} boundary edges, pivot edge {} by {step}",
            self.iterations,
            boundary.len(),
            chosen.edge,
        ));
        self.notify(IterationRecord {
            iteration: self.iterations,
            lambda,
            next_lambda: next,
            pivot: Some((chosen.edge, step)),
            boundary_size: boundary.len(),
            ambiguous: false,
        });

        let potential: Vec<f64> = pi_t.iter().zip(&d_pi).map(|(p, d)| p + next * d).collect();
        self.lambda = next;
        self.pivot(inverse, chosen.edge, step, potential)
    }

    fn choose(&mut self, boundary: &[Candidate], inverse: &LaplacianInverse) -> usize {
        match self.config.pivot_mode {
            PivotMode::First => pivot::first(boundary),
            PivotMode::Random => pivot::random(boundary, &mut self.rng),
            PivotMode::Lexicographic => {
                let config = &self.config;
                pivot::lexicographic(
                    boundary,
                    &self.incidence,
                    inverse,
                    &self.initial_weights,
                    |scale| config.snap_threshold(scale),
                )
            }
        }
    }

    /// Moves `edge` by `step` pieces and brings the inverse up to date.
    fn pivot(
        &mut self,
        inverse: LaplacianInverse,
        edge: usize,
        step: isize,
        potential: Vec<f64>,
    ) -> Result<Phase, Error> {
        let delta_c = self.costs.delta_c(&self.region, step, edge)?;
        self.move_region(edge, step)?;

        let interval = self.config.recompute_interval;
        let inverted = if interval > 0 && self.pivots % interval == 0 {
            log::debug!("recomputing laplacian inverse after {} pivots", self.pivots);
            invert(&self.incidence, &self.weights(), self.config.inverse_method)?
        } else {
            inverse.update(&self.incidence, edge, delta_c)?
        };
        Ok(match inverted {
            Inverted::Regular(inverse) => Phase::Iterating(inverse),
            Inverted::Singular(components) => {
                log::debug!(
                    "pivot of edge {edge} disconnects the active subgraph into {} components",
                    components.count
                );
                Phase::Ambiguous(Ambiguity {
                    potential,
                    components,
                })
            }
        })
    }

    fn move_region(&mut self, edge: usize, step: isize) -> Result<(), Error> {
        let position = self.costs.position(edge, self.region[edge] as isize + step)?;
        self.region[edge] = position - self.costs.first_pos(edge);
        self.coeffs[edge] = self.costs.table()[position];
        self.pivots += 1;
        Ok(())
    }

    /// Raises the potential of the components with non-negative aggregate demand slope
    /// until some edge reaches its window boundary, and pivots that edge.
    fn resolve(&mut self, ambiguity: Ambiguity) -> Result<Phase, Error> {
        if self.iterations >= self.config.max_iter {
            return Ok(self.terminate(Termination::MaxIter));
        }
        self.iterations += 1;
        let Ambiguity {
            mut potential,
            components,
        } = ambiguity;

        if components.count < 2 {
            log::warn!(
                "laplacian at λ = {} is connected but numerically singular",
                self.lambda
            );
            return Err(Error::NumericallySingular(self.lambda));
        }

        let mut aggregate = vec![0.0; components.count];
        for (v, &label) in components.labels.iter().enumerate() {
            aggregate[label] += self.slope[v];
        }
        let tolerance = 1e-9 * max_abs(&self.slope).max(1.0);
        let mut raised: Vec<bool> = aggregate.iter().map(|&a| a >= -tolerance).collect();
        if raised.iter().all(|&r| r) || raised.iter().all(|&r| !r) {
            let anchor = components.labels[0];
            raised = (0..components.count).map(|k| k != anchor).collect();
        }
        let direction: Vec<f64> = components
            .labels
            .iter()
            .map(|&label| if raised[label] { 1.0 } else { 0.0 })
            .collect();

        let g0 = self.incidence.transpose_apply(&potential);
        let g1 = self.incidence.transpose_apply(&direction);
        let bounds: Vec<(Candidate, f64)> = self
            .coeffs
            .iter()
            .enumerate()
            .filter(|&(e, _)| g1[e] != 0.0)
            .filter_map(|(e, p)| {
                let sigma = if g1[e] > 0.0 { p.sigma_u } else { p.sigma_l };
                sigma.is_finite().then(|| {
                    let shift = ((sigma - g0[e]) / g1[e]).max(0.0);
                    (Candidate { edge: e, slope: g1[e] }, shift)
                })
            })
            .collect();

        if bounds.is_empty() {
            log::info!("ambiguous region at λ = {} has no boundary", self.lambda);
            return Ok(self.terminate(Termination::NoBoundary));
        }
        let shift = bounds.iter().map(|&(_, s)| s).fold(f64::INFINITY, f64::min);
        let tie = TIE_EPSILON * shift.abs().max(1.0);
        let ties: Vec<Candidate> = bounds
            .iter()
            .filter(|&&(_, s)| s <= shift + tie)
            .map(|&(c, _)| c)
            .collect();
        let chosen = ties[self.rng.gen_range(0..ties.len())];
        let step = chosen.step();

        potential
            .iter_mut()
            .zip(&direction)
            .for_each(|(p, d)| *p += shift * d);
        self.potential = potential.clone();
        self.ambiguous_resolutions += 1;
        log::debug!(
            "ambiguous region at λ = {}: {} components, raising {} by {shift}, pivot edge {} by {step}",
            self.lambda,
            components.count,
            raised.iter().filter(|&&r| r).count(),
            chosen.edge,
        );
        self.notify(IterationRecord {
            iteration: self.iterations,
            lambda: self.lambda,
            next_lambda: self.lambda,
            pivot: Some((chosen.edge, step)),
            boundary_size: ties.len(),
            ambiguous: true,
        });

        self.move_region(chosen.edge, step)?;
        Ok(
            match invert(&self.incidence, &self.weights(), self.config.inverse_method)? {
                Inverted::Regular(inverse) => Phase::Iterating(inverse),
                Inverted::Singular(components) => Phase::Ambiguous(Ambiguity {
                    potential,
                    components,
                }),
            },
        )
    }

    fn breakpoint(&self, lambda: f64, pi_t: &[f64], d_pi: &[f64]) -> Breakpoint {
        let potential: Vec<f64> = pi_t.iter().zip(d_pi).map(|(p, d)| p + lambda * d).collect();
        let flow = self
            .coeffs
            .iter()
            .zip(self.incidence.transpose_apply(&potential))
            .map(|(p, g)| p.flow(g))
            .collect();
        Breakpoint {
            lambda,
            flow,
            potential,
        }
    }

    /// Emits the breakpoint at `lambda_max` when it lies beyond `lambda`.
    fn emit_clamped(&mut self, lambda: f64, pi_t: &[f64], d_pi: &[f64]) {
        let lambda_max = self.config.lambda_max;
        if lambda_max > lambda {
            let last = self.breakpoint(lambda_max, pi_t, d_pi);
            self.potential = last.potential.clone();
            self.lambda = lambda_max;
            self.emit(last);
        }
    }

    fn emit(&mut self, breakpoint: Breakpoint) {
        self.observers
            .iter_mut()
            .for_each(|o| o.on_breakpoint(&breakpoint));
        self.breakpoints.push(breakpoint);
    }

    fn notify(&mut self, record: IterationRecord) {
        self.observers
            .iter_mut()
            .for_each(|o| o.on_iteration(&record));
    }

    fn trace(&self, message: std::fmt::Arguments<'_>) {
        let level = if self.config.verbose {
            log::Level::Info
        } else {
            log::Level::Trace
        };
        log::log!(level, "{message}");
    }

    fn terminate(&mut self, termination: Termination) -> Phase {
        self.breakpoints.freeze();
        log::info!(
            "EFA terminated ({termination}) at λ = {} after {} iterations, {} breakpoints, {} ambiguous regions",
            self.lambda,
            self.iterations,
            self.breakpoints.len(),
            self.ambiguous_resolutions,
        );
        Phase::Terminated(termination)
    }
}

impl ParametricFlow for Efa {
    type Termination = Termination;
    type Error = Error;

    fn run(&mut self) -> Result<Termination, Error> {
        Efa::run(self)
    }

    fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::AffineDemand;

    fn path() -> (Network, PiecewiseQuadratic) {
        let mut net = Network::new(3);
        net.add_edge(0, 1, 0.0, f64::INFINITY).unwrap();
        net.add_edge(1, 2, 0.0, f64::INFINITY).unwrap();
        let costs =
            PiecewiseQuadratic::quadratic(&net, &[(1.0, 0.0, 0.0), (0.5, 1.0, 0.0)]).unwrap();
        (net, costs)
    }

    #[test]
    fn state_machine_walks_through_its_phases() {
        let (net, costs) = path();
        let demand = AffineDemand::single_commodity(0, 2, 1.0);
        let mut efa = Efa::from_network(&net, costs, &demand, EfaConfig::default()).unwrap();
        assert_eq!(efa.state(), State::Initializing);
        // edge 1 has marginal cost 1 at zero flow, so the start region is ambiguous
        assert_eq!(efa.step(), Ok(State::Ambiguous));
        assert_eq!(efa.initial_region(), &[1, 0]);
        assert_eq!(efa.step(), Ok(State::Iterating));
        assert_eq!(efa.region(), &[1, 1]);
        // node 2 is raised until edge 1 reaches its marginal cost at zero flow
        assert_eq!(efa.node_potentials(), &[0.0, 0.0, 1.0]);
        assert_eq!(efa.run(), Ok(Termination::LambdaInf));
        assert_eq!(efa.termination(), Some(Termination::LambdaInf));
        assert_eq!(efa.ambiguous_resolutions(), 1);

        let bp = efa.breakpoints();
        assert!(bp.is_frozen());
        assert_eq!(bp.lambdas(), vec![0.0]);
        let tail = bp.tail().unwrap();
        assert!((tail.flow_slope[0] - 1.0).abs() < 1e-12);
        // flow λ costs 2λ on the first edge and λ + 1 on the second
        let pi = bp.potential_at(2.0).unwrap();
        assert!((pi[1] - 4.0).abs() < 1e-12 && (pi[2] - 7.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_invalid_inputs() {
        let (net, costs) = path();
        let demand = AffineDemand::single_commodity(0, 2, 1.0);
        let polynomial = crate::cost::PolynomialCost::default();
        assert!(matches!(
            Efa::from_costs(&net, &polynomial, &demand, EfaConfig::default()),
            Err(Error::NotPiecewiseQuadratic)
        ));
        let unbalanced = AffineDemand::linear(vec![(2, 1.0)]);
        assert_eq!(
            Efa::from_network(&net, costs.clone(), &unbalanced, EfaConfig::default()).err(),
            Some(Error::UnbalancedDemand(1.0))
        );
        let config = EfaConfig::default().with_lambda_max(-1.0);
        assert!(Efa::from_network(&net, costs, &demand, config).is_err());
    }

    #[test]
    fn connected_singular_region_is_an_error() {
        let (net, costs) = path();
        let demand = AffineDemand::single_commodity(0, 2, 1.0);
        let mut efa = Efa::from_network(&net, costs, &demand, EfaConfig::default()).unwrap();
        efa.step().unwrap();
        // one component leaves nothing to raise
        let ambiguity = Ambiguity {
            potential: vec![0.0; 3],
            components: Components {
                count: 1,
                labels: vec![0; 3],
            },
        };
        assert!(matches!(
            efa.resolve(ambiguity),
            Err(Error::NumericallySingular(l)) if l == 0.0
        ));
    }

    #[test]
    fn iteration_limit_stops_the_run() {
        let (net, costs) = path();
        let demand = AffineDemand::single_commodity(0, 2, 1.0);
        let config = EfaConfig {
            max_iter: 1,
            ..EfaConfig::default()
        };
        let mut efa = Efa::from_network(&net, costs, &demand, config).unwrap();
        assert_eq!(efa.run(), Ok(Termination::MaxIter));
        assert!(efa.breakpoints().is_empty());
        assert_eq!(Termination::MaxIter.to_string(), "iteration limit reached");
    }
}
