use itertools::Itertools;

use crate::cost::CostFunction;
use crate::error::Error;
use crate::network::Network;
use crate::numerics::{is_close, ROUND_BIAS};

/// One quadratic piece `a·x² + b·x + offset` valid from breakpoint `tau` on.
///
/// An infinite `a` pins the flow to the finite breakpoint adjacent to the piece and
/// encodes a hard flow bound; `offset` is then the cost at that bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticPiece {
    pub tau: f64,
    pub a: f64,
    pub b: f64,
    pub offset: f64,
}

impl QuadraticPiece {
    pub fn new(tau: f64, a: f64, b: f64, offset: f64) -> Self {
        Self { tau, a, b, offset }
    }

    /// Pins the flow to the start of the next piece.
    pub fn lower_bound(offset: f64) -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY, 0.0, offset)
    }

    /// Pins the flow to `tau`.
    pub fn upper_bound(tau: f64, offset: f64) -> Self {
        Self::new(tau, f64::INFINITY, 0.0, offset)
    }
}

/// A piece together with the quantities the EFA needs, cached at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Piece {
    pub tau: f64,
    pub a: f64,
    pub b: f64,
    pub offset: f64,
    /// Laplace weight `1/(2a)`, zero on bound pieces.
    pub c: f64,
    /// `b/(2a)`, or the negated bound on bound pieces, so that flow = `c·Δπ - d`.
    pub d: f64,
    /// Marginal cost at the lower breakpoint.
    pub sigma_l: f64,
    /// Marginal cost at the upper breakpoint.
    pub sigma_u: f64,
}

impl Piece {
    pub fn is_bound(&self) -> bool {
        self.a.is_infinite()
    }

    /// Flow induced by a potential difference while this piece is active.
    pub fn flow(&self, potential_diff: f64) -> f64 {
        self.c * potential_diff - self.d
    }

    fn eval(&self, x: f64, derivative: u32) -> f64 {
        if self.is_bound() {
            let bound = -self.d;
            return match derivative {
                0 if (x - bound).abs() <= 1e-9 * bound.abs().max(1.0) => self.offset,
                0 => f64::INFINITY,
                1 if self.sigma_l.is_infinite() => self.sigma_u,
                1 => self.sigma_l,
                2 => f64::INFINITY,
                _ => 0.0,
            };
        }
        match derivative {
            0 => (self.a * x + self.b) * x + self.offset,
            1 => 2.0 * self.a * x + self.b,
            2 => 2.0 * self.a,
            _ => 0.0,
        }
    }
}

/// Piecewise-quadratic costs of all edges, stored as one flattened table.
///
/// Pieces of edge `e` occupy rows `first_pos[e]..=last_pos[e]`; the region of an edge
/// is the offset of its active piece within that range.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseQuadratic {
    table: Vec<Piece>,
    first_pos: Vec<usize>,
    last_pos: Vec<usize>,
}

impl PiecewiseQuadratic {
    pub fn new(edges: Vec<Vec<QuadraticPiece>>) -> Result<Self, Error> {
        let mut table = Vec::with_capacity(edges.iter().map(Vec::len).sum());
        let mut first_pos = Vec::with_capacity(edges.len());
        let mut last_pos = Vec::with_capacity(edges.len());

        for (edge, pieces) in edges.iter().enumerate() {
            first_pos.push(table.len());
            table.extend(derive_pieces(edge, pieces)?);
            last_pos.push(table.len() - 1);
        }

        Ok(Self {
            table,
            first_pos,
            last_pos,
        })
    }

    /// One quadratic `a·x² + b·x + offset` per edge, with bound pieces for the finite
    /// flow bounds of `network`.
    pub fn quadratic(network: &Network, coefficients: &[(f64, f64, f64)]) -> Result<Self, Error> {
        if coefficients.len() != network.edge_count() {
            return Err(Error::LengthMismatch {
                what: "quadratic coefficients",
                expected: network.edge_count(),
                found: coefficients.len(),
            });
        }
        let edges = coefficients
            .iter()
            .zip(network.lower_bounds())
            .zip(network.upper_bounds())
            .map(|((&(a, b, offset), lower), upper)| {
                let cost = |x: f64| (a * x + b) * x + offset;
                let mut pieces = Vec::with_capacity(3);
                if lower.is_finite() {
                    pieces.push(QuadraticPiece::lower_bound(cost(lower)));
                    pieces.push(QuadraticPiece::new(lower, a, b, offset));
                } else {
                    pieces.push(QuadraticPiece::new(f64::NEG_INFINITY, a, b, offset));
                }
                if upper.is_finite() {
                    pieces.push(QuadraticPiece::upper_bound(upper, cost(upper)));
                }
                pieces
            })
            .collect();
        Self::new(edges)
    }

    /// Builds the model from flattened columns; `edge_index` names the edge of each row
    /// and must be sorted.
    pub fn from_columns(
        edge_count: usize,
        edge_index: &[usize],
        tau: &[f64],
        a: &[f64],
        b: &[f64],
        offset: &[f64],
    ) -> Result<Self, Error> {
        for (what, len) in [
            ("breakpoint column", tau.len()),
            ("quadratic column", a.len()),
            ("linear column", b.len()),
            ("offset column", offset.len()),
        ] {
            if len != edge_index.len() {
                return Err(Error::LengthMismatch {
                    what,
                    expected: edge_index.len(),
                    found: len,
                });
            }
        }
        let mut edges = vec![Vec::new(); edge_count];
        for (row, &e) in edge_index.iter().enumerate() {
            let pieces = edges.get_mut(e).ok_or(Error::LengthMismatch {
                what: "edge index",
                expected: edge_count,
                found: e + 1,
            })?;
            pieces.push(QuadraticPiece::new(tau[row], a[row], b[row], offset[row]));
        }
        Self::new(edges)
    }

    pub fn edge_count(&self) -> usize {
        self.first_pos.len()
    }

    pub fn piece_count(&self, edge: usize) -> usize {
        self.last_pos[edge] - self.first_pos[edge] + 1
    }

    pub fn first_pos(&self, edge: usize) -> usize {
        self.first_pos[edge]
    }

    pub fn last_pos(&self, edge: usize) -> usize {
        self.last_pos[edge]
    }

    pub fn table(&self) -> &[Piece] {
        &self.table
    }

    pub fn pieces(&self, edge: usize) -> &[Piece] {
        &self.table[self.first_pos[edge]..=self.last_pos[edge]]
    }

    /// Position of `region` of `edge` in the flattened table.
    pub fn position(&self, edge: usize, region: isize) -> Result<usize, Error> {
        usize::try_from(region)
            .ok()
            .map(|r| self.first_pos[edge] + r)
            .filter(|&pos| pos <= self.last_pos[edge])
            .ok_or(Error::RegionOutOfRange { edge, region })
    }

    pub fn piece(&self, edge: usize, region: usize) -> Result<&Piece, Error> {
        let pos = self.position(edge, region as isize)?;
        Ok(&self.table[pos])
    }

    /// Region of `edge` whose `[τ_i, τ_{i+1})` contains `x`, ties going up.
    pub fn region_of_flow_edge(&self, edge: usize, x: f64) -> usize {
        let biased = x + ROUND_BIAS * x.abs().max(1.0);
        self.pieces(edge)
            .partition_point(|p| p.tau <= biased)
            .saturating_sub(1)
    }

    /// Region of `edge` whose `[σ_l, σ_u)` contains the potential difference, ties going up.
    pub fn region_of_potential_edge(&self, edge: usize, diff: f64) -> usize {
        let biased = diff + ROUND_BIAS * diff.abs().max(1.0);
        self.pieces(edge)
            .partition_point(|p| p.sigma_l <= biased)
            .saturating_sub(1)
    }

    pub fn region_of_flow(&self, flow: &[f64]) -> Vec<usize> {
        flow.iter()
            .enumerate()
            .map(|(e, &x)| self.region_of_flow_edge(e, x))
            .collect()
    }

    pub fn region_of_potential(&self, potential_diff: &[f64]) -> Vec<usize> {
        potential_diff
            .iter()
            .enumerate()
            .map(|(e, &p)| self.region_of_potential_edge(e, p))
            .collect()
    }

    /// Active piece of every edge under the region vector `region`.
    pub fn get_coefficients(&self, region: &[usize]) -> Result<Vec<Piece>, Error> {
        if region.len() != self.edge_count() {
            return Err(Error::LengthMismatch {
                what: "region vector",
                expected: self.edge_count(),
                found: region.len(),
            });
        }
        region
            .iter()
            .enumerate()
            .map(|(e, &r)| self.piece(e, r).copied())
            .collect()
    }

    /// Laplace weight change of `edge` when its region moves by `step`.
    pub fn delta_c(&self, region: &[usize], step: isize, edge: usize) -> Result<f64, Error> {
        let from = self.position(edge, region[edge] as isize)?;
        let to = self.position(edge, region[edge] as isize + step)?;
        Ok(self.table[to].c - self.table[from].c)
    }

    /// `derivative`-th derivative of every edge's cost at the flow `x`.
    pub fn value(&self, x: &[f64], derivative: u32) -> Vec<f64> {
        x.iter()
            .enumerate()
            .map(|(e, &xe)| self.eval(e, xe, derivative))
            .collect()
    }

    pub fn total_cost(&self, x: &[f64]) -> f64 {
        self.value(x, 0).into_iter().sum()
    }

    /// Whether adjacent finite pieces agree in their `order`-th derivative at the shared
    /// breakpoint, within a relative/absolute `margin`.
    pub fn is_smooth(&self, order: u32, margin: f64) -> bool {
        (0..self.edge_count()).all(|e| {
            self.pieces(e)
                .iter()
                .tuple_windows()
                .filter(|(l, r)| !l.is_bound() && !r.is_bound())
                .all(|(l, r)| is_close(l.eval(r.tau, order), r.eval(r.tau, order), margin, margin))
        })
    }

    /// Drops the given edges; remaining edges keep their order and are renumbered.
    pub fn delete_edges(&mut self, edges: &[usize]) {
        let mut table = Vec::with_capacity(self.table.len());
        let mut first_pos = Vec::with_capacity(self.edge_count());
        let mut last_pos = Vec::with_capacity(self.edge_count());
        for e in (0..self.edge_count()).filter(|e| !edges.contains(e)) {
            first_pos.push(table.len());
            table.extend_from_slice(self.pieces(e));
            last_pos.push(table.len() - 1);
        }
        self.table = table;
        self.first_pos = first_pos;
        self.last_pos = last_pos;
    }
}

impl CostFunction for PiecewiseQuadratic {
    fn edge_count(&self) -> usize {
        self.first_pos.len()
    }

    fn eval(&self, edge: usize, x: f64, derivative: u32) -> f64 {
        let region = self.region_of_flow_edge(edge, x);
        self.pieces(edge)[region].eval(x, derivative)
    }

    fn degree(&self, edge: usize) -> Option<usize> {
        match self.pieces(edge) {
            [p] if !p.is_bound() => Some(2),
            _ => None,
        }
    }

    fn as_piecewise_quadratic(&self) -> Option<&PiecewiseQuadratic> {
        Some(self)
    }
}

fn derive_pieces(edge: usize, pieces: &[QuadraticPiece]) -> Result<Vec<Piece>, Error> {
    let invalid = |reason| Error::InvalidPiece { edge, reason };

    let first = pieces.first().ok_or_else(|| invalid("edge has no pieces"))?;
    if first.tau != f64::NEG_INFINITY {
        return Err(invalid("first breakpoint must be -inf"));
    }
    if pieces.iter().tuple_windows().any(|(l, r)| !(l.tau < r.tau)) {
        return Err(Error::UnsortedBreakpoints(edge));
    }
    let last = pieces.len() - 1;
    for (i, p) in pieces.iter().enumerate() {
        if p.a.is_nan() || p.a == 0.0 || (p.a.is_finite() && p.a < 0.0) {
            return Err(invalid("quadratic coefficient must be positive or infinite"));
        }
        if !p.b.is_finite() || !p.offset.is_finite() {
            return Err(invalid("linear coefficient and offset must be finite"));
        }
        if p.a.is_infinite() && ((i != 0 && i != last) || pieces.len() == 1) {
            return Err(invalid("bound pieces must be first or last"));
        }
    }

    // marginal cost at each interior breakpoint, taken from a finite neighbour
    let boundary: Vec<f64> = (1..pieces.len())
        .map(|k| {
            let (l, r) = (&pieces[k - 1], &pieces[k]);
            let tau = r.tau;
            if r.a.is_finite() {
                Ok(2.0 * r.a * tau + r.b)
            } else if l.a.is_finite() {
                Ok(2.0 * l.a * tau + l.b)
            } else {
                Err(invalid("adjacent bound pieces"))
            }
        })
        .collect::<Result<_, _>>()?;

    Ok(pieces
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let sigma_l = if i == 0 {
                f64::NEG_INFINITY
            } else {
                boundary[i - 1]
            };
            let sigma_u = boundary.get(i).copied().unwrap_or(f64::INFINITY);
            let (c, d) = if p.a.is_infinite() {
                let bound = if i == 0 { pieces[1].tau } else { p.tau };
                (0.0, -bound)
            } else {
                (1.0 / (2.0 * p.a), p.b / (2.0 * p.a))
            };
            Piece {
                tau: p.tau,
                a: p.a,
                b: p.b,
                offset: p.offset,
                c,
                d,
                sigma_l,
                sigma_u,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded_quadratic() -> PiecewiseQuadratic {
        // x^2 + x on [0, 2], plus a free edge 0.5x^2 - x
        let mut net = Network::new(2);
        net.add_edge(0, 1, 0.0, 2.0).unwrap();
        net.add_free_edge(0, 1).unwrap();
        PiecewiseQuadratic::quadratic(&net, &[(1.0, 1.0, 0.0), (0.5, -1.0, 0.0)]).unwrap()
    }

    #[test]
    fn derives_weights_and_marginal_windows() {
        let pwq = bounded_quadratic();
        assert_eq!(pwq.piece_count(0), 3);
        assert_eq!(pwq.piece_count(1), 1);
        assert_eq!((pwq.first_pos(1), pwq.last_pos(1)), (3, 3));

        let p = pwq.pieces(0);
        assert_eq!((p[0].c, p[0].d), (0.0, 0.0));
        assert_eq!((p[0].sigma_l, p[0].sigma_u), (f64::NEG_INFINITY, 1.0));
        assert_eq!((p[1].c, p[1].d), (0.5, 0.5));
        assert_eq!((p[1].sigma_l, p[1].sigma_u), (1.0, 5.0));
        assert_eq!((p[2].c, p[2].d), (0.0, -2.0));
        assert_eq!((p[2].sigma_l, p[2].sigma_u), (5.0, f64::INFINITY));

        // flow pinned at the bound, or following the marginal cost inside the piece
        assert_eq!(p[0].flow(-3.0), 0.0);
        assert_eq!(p[1].flow(3.0), 1.0);
        assert_eq!(p[2].flow(9.0), 2.0);
    }

    #[test]
    fn region_lookup_breaks_ties_upwards() {
        let pwq = bounded_quadratic();
        assert_eq!(pwq.region_of_flow(&[-1.0, 0.0]), vec![0, 0]);
        assert_eq!(pwq.region_of_flow(&[0.0, 0.0]), vec![1, 0]);
        assert_eq!(pwq.region_of_flow(&[2.0, 0.0]), vec![2, 0]);
        assert_eq!(pwq.region_of_potential(&[0.5, 0.0]), vec![0, 0]);
        assert_eq!(pwq.region_of_potential(&[1.0, 0.0]), vec![1, 0]);
        assert_eq!(pwq.region_of_potential(&[7.0, 0.0]), vec![2, 0]);
    }

    #[test]
    fn coefficients_and_delta_c() {
        let pwq = bounded_quadratic();
        let coeffs = pwq.get_coefficients(&[1, 0]).unwrap();
        assert_eq!(coeffs[0].c, 0.5);
        assert_eq!(coeffs[1].c, 1.0);
        assert_eq!(pwq.delta_c(&[0, 0], 1, 0), Ok(0.5));
        assert_eq!(pwq.delta_c(&[1, 0], 1, 0), Ok(-0.5));
        assert_eq!(
            pwq.delta_c(&[0, 0], 1, 1),
            Err(Error::RegionOutOfRange { edge: 1, region: 1 })
        );
        assert!(pwq.get_coefficients(&[0]).is_err());
    }

    #[test]
    fn value_follows_active_piece() {
        let pwq = bounded_quadratic();
        assert_eq!(pwq.value(&[1.0, 2.0], 0), vec![2.0, 0.0]);
        assert_eq!(pwq.value(&[1.0, 2.0], 1), vec![3.0, 1.0]);
        assert_eq!(pwq.value(&[2.0, 0.0], 0)[0], 6.0);
        assert_eq!(pwq.value(&[3.0, 0.0], 0)[0], f64::INFINITY);
        assert_eq!(pwq.total_cost(&[1.0, 2.0]), 2.0);
    }

    #[test]
    fn rejects_malformed_pieces() {
        let bad_first = vec![vec![QuadraticPiece::new(0.0, 1.0, 0.0, 0.0)]];
        assert!(matches!(
            PiecewiseQuadratic::new(bad_first),
            Err(Error::InvalidPiece { edge: 0, .. })
        ));
        let unsorted = vec![vec![
            QuadraticPiece::new(f64::NEG_INFINITY, 1.0, 0.0, 0.0),
            QuadraticPiece::new(1.0, 1.0, 0.0, 0.0),
            QuadraticPiece::new(1.0, 2.0, 0.0, 0.0),
        ]];
        assert_eq!(
            PiecewiseQuadratic::new(unsorted),
            Err(Error::UnsortedBreakpoints(0))
        );
        let linear = vec![vec![QuadraticPiece::new(f64::NEG_INFINITY, 0.0, 1.0, 0.0)]];
        assert!(PiecewiseQuadratic::new(linear).is_err());
        assert!(matches!(
            PiecewiseQuadratic::from_columns(1, &[0, 0], &[f64::NEG_INFINITY], &[1.0], &[0.0], &[0.0]),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn smoothness_detects_marginal_jumps() {
        let smooth = vec![vec![
            QuadraticPiece::new(f64::NEG_INFINITY, 1.0, 0.0, 0.0),
            QuadraticPiece::new(1.0, 2.0, -2.0, 1.0),
        ]];
        let pwq = PiecewiseQuadratic::new(smooth).unwrap();
        // x^2 and 2x^2 - 2x + 1 agree in value and slope at x = 1
        assert!(pwq.is_smooth(1, 1e-12));
        assert!(!pwq.is_smooth(2, 1e-12));

        let kinked = vec![vec![
            QuadraticPiece::new(f64::NEG_INFINITY, 1.0, 0.0, 0.0),
            QuadraticPiece::new(1.0, 1.0, 1.0, -1.0),
        ]];
        let pwq = PiecewiseQuadratic::new(kinked).unwrap();
        assert!(pwq.is_smooth(0, 1e-12));
        assert!(!pwq.is_smooth(1, 1e-12));
    }

    #[test]
    fn delete_edges_compacts_positions() {
        let mut pwq = bounded_quadratic();
        pwq.delete_edges(&[0]);
        assert_eq!(pwq.edge_count(), 1);
        assert_eq!((pwq.first_pos(0), pwq.last_pos(0)), (0, 0));
        assert_eq!(pwq.pieces(0)[0].c, 1.0);
    }
}
