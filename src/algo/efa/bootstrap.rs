use petgraph::algo::bellman_ford;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::cost::PiecewiseQuadratic;
use crate::error::Error;
use crate::network::Incidence;

/// Potentials at which the zero flow is optimal, and the region they select.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Start {
    pub potential: Vec<f64>,
    pub region: Vec<usize>,
}

/// Range `[m⁻, m⁺]` of potential differences at which edge `edge` carries no flow.
fn zero_flow_window(costs: &PiecewiseQuadratic, edge: usize) -> Result<(f64, f64), Error> {
    costs
        .pieces(edge)
        .iter()
        .filter_map(|p| {
            if p.is_bound() {
                (p.d == 0.0).then_some((p.sigma_l, p.sigma_u))
            } else {
                // c·g - d = 0 at g = d/c, the marginal cost at zero
                let g = p.d / p.c;
                let slack = 1e-12 * g.abs().max(1.0);
                (g >= p.sigma_l - slack && g <= p.sigma_u + slack).then_some((g, g))
            }
        })
        .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
        .ok_or(Error::InfeasibleStart)
}

/// Finds potentials consistent with the zero flow, i.e. with every potential difference
/// inside the window of its edge, by a shortest-path computation on the difference
/// constraints. Node 0 gets potential zero.
pub(crate) fn zero_flow_start(
    incidence: &Incidence,
    costs: &PiecewiseQuadratic,
) -> Result<Start, Error> {
    let n = incidence.node_count();
    let windows = (0..incidence.edge_count())
        .map(|e| zero_flow_window(costs, e))
        .collect::<Result<Vec<_>, _>>()?;

    // π_head - π_tail <= m⁺ and π_tail - π_head <= -m⁻
    let mut graph = DiGraph::<(), f64>::with_capacity(n + 1, 2 * windows.len() + n);
    let nodes: Vec<NodeIndex> = (0..n).map(|_| graph.add_node(())).collect();
    let mut negative = false;
    for (e, &(lo, hi)) in windows.iter().enumerate() {
        let (t, h) = (nodes[incidence.tail(e)], nodes[incidence.head(e)]);
        if hi.is_finite() {
            graph.add_edge(t, h, hi);
            negative |= hi < 0.0;
        }
        if lo.is_finite() {
            graph.add_edge(h, t, -lo);
            negative |= lo > 0.0;
        }
    }

    let potential = if negative {
        let root = graph.add_node(());
        for &v in &nodes {
            graph.add_edge(root, v, 0.0);
        }
        let distances = bellman_ford(&graph, root)
            .map_err(|_| Error::InfeasibleStart)?
            .distances;
        let shift = distances[0];
        distances[..n].iter().map(|d| d - shift).collect()
    } else {
        vec![0.0; n]
    };

    let region = costs.region_of_potential(&incidence.transpose_apply(&potential));
    log::debug!("zero-flow start region: {region:?}");
    Ok(Start { potential, region })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::QuadraticPiece;

    fn path_costs() -> PiecewiseQuadratic {
        // x^2 + x, x^2, x^2 with zero lower bounds
        let edge = |b: f64| {
            vec![
                QuadraticPiece::lower_bound(0.0),
                QuadraticPiece::new(0.0, 1.0, b, 0.0),
            ]
        };
        PiecewiseQuadratic::new(vec![edge(1.0), edge(0.0), edge(0.0)]).unwrap()
    }

    #[test]
    fn non_negative_windows_start_at_zero() {
        let inc = Incidence::new(4, vec![0, 1, 2], vec![1, 2, 3]).unwrap();
        let start = zero_flow_start(&inc, &path_costs()).unwrap();
        assert_eq!(start.potential, vec![0.0; 4]);
        assert_eq!(start.region, vec![0, 1, 1]);
    }

    #[test]
    fn negative_marginals_shift_potentials() {
        let inc = Incidence::new(2, vec![0], vec![1]).unwrap();
        let costs = PiecewiseQuadratic::new(vec![vec![
            QuadraticPiece::lower_bound(1.0),
            QuadraticPiece::new(0.0, 1.0, 2.0, 1.0),
        ]])
        .unwrap();
        // window (-inf, 2]: zero potentials already work
        let start = zero_flow_start(&inc, &costs).unwrap();
        assert_eq!(start.potential, vec![0.0, 0.0]);

        let reversed = Incidence::new(2, vec![1], vec![0]).unwrap();
        let costs = PiecewiseQuadratic::new(vec![vec![
            QuadraticPiece::lower_bound(0.0),
            QuadraticPiece::new(0.0, 1.0, -2.0, 0.0),
        ]])
        .unwrap();
        // window (-inf, -2] on π_0 - π_1
        let start = zero_flow_start(&reversed, &costs).unwrap();
        assert_eq!(start.potential, vec![0.0, 2.0]);
        // the difference sits on the breakpoint, which belongs to the upper piece
        assert_eq!(start.region, vec![1]);
    }

    #[test]
    fn forced_flow_is_infeasible() {
        // flow must lie in [1, 2]
        let inc = Incidence::new(2, vec![0], vec![1]).unwrap();
        let costs = PiecewiseQuadratic::new(vec![vec![
            QuadraticPiece::lower_bound(1.0),
            QuadraticPiece::new(1.0, 1.0, 0.0, 0.0),
            QuadraticPiece::upper_bound(2.0, 4.0),
        ]])
        .unwrap();
        assert_eq!(zero_flow_start(&inc, &costs), Err(Error::InfeasibleStart));
    }
}
