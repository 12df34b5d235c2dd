use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::error::Error;

/// Flow bounds of a single arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub lower: f64,
    pub upper: f64,
}

impl Default for Arc {
    fn default() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }
}

/// A flow network: nodes `0..n` and arcs `0..m` with lower/upper flow bounds.
#[derive(Debug, Clone, Default)]
pub struct Network {
    graph: DiGraph<(), Arc, u32>,
}

impl Network {
    pub fn new(node_count: usize) -> Self {
        let mut graph = DiGraph::with_capacity(node_count, 0);
        (0..node_count).for_each(|_| {
            graph.add_node(());
        });
        Self { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Adds an arc and returns its index. Indices are assigned consecutively.
    pub fn add_edge(
        &mut self,
        source: usize,
        target: usize,
        lower: f64,
        upper: f64,
    ) -> Result<usize, Error> {
        let n = self.node_count();
        if source >= n {
            return Err(Error::NodeOutOfRange(source));
        }
        if target >= n {
            return Err(Error::NodeOutOfRange(target));
        }
        if source == target {
            return Err(Error::SelfLoop(source));
        }
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(Error::InvalidBounds {
                edge: self.edge_count(),
            });
        }
        let e = self.graph.add_edge(
            NodeIndex::new(source),
            NodeIndex::new(target),
            Arc { lower, upper },
        );
        Ok(e.index())
    }

    /// Adds an arc without flow bounds.
    pub fn add_free_edge(&mut self, source: usize, target: usize) -> Result<usize, Error> {
        self.add_edge(source, target, f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn endpoints(&self, edge: usize) -> Option<(usize, usize)> {
        self.graph
            .edge_endpoints(EdgeIndex::new(edge))
            .map(|(s, t)| (s.index(), t.index()))
    }

    pub fn bounds(&self, edge: usize) -> Option<Arc> {
        self.graph.edge_weight(EdgeIndex::new(edge)).copied()
    }

    pub fn lower_bounds(&self) -> Vec<f64> {
        self.graph.edge_weights().map(|a| a.lower).collect()
    }

    pub fn upper_bounds(&self) -> Vec<f64> {
        self.graph.edge_weights().map(|a| a.upper).collect()
    }

    pub fn graph(&self) -> &DiGraph<(), Arc, u32> {
        &self.graph
    }

    /// Removes the given arcs; the remaining arcs keep their relative order and are
    /// renumbered consecutively.
    pub fn delete_edges(&mut self, edges: &[usize]) {
        let mut graph = DiGraph::with_capacity(self.node_count(), self.edge_count());
        (0..self.node_count()).for_each(|_| {
            graph.add_node(());
        });
        self.graph
            .edge_references()
            .filter(|e| !edges.contains(&e.id().index()))
            .for_each(|e| {
                graph.add_edge(e.source(), e.target(), *e.weight());
            });
        self.graph = graph;
    }

    pub fn incidence(&self) -> Incidence {
        let (tails, heads) = self
            .graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
            .unzip();
        Incidence {
            node_count: self.node_count(),
            tails,
            heads,
        }
    }
}

/// The node-arc incidence operator Γ: +1 at the head of an arc, -1 at its tail.
///
/// `apply` maps an edge vector to net inflow per node, `transpose_apply` maps a
/// node potential to the head-minus-tail difference per arc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incidence {
    node_count: usize,
    tails: Vec<usize>,
    heads: Vec<usize>,
}

impl Incidence {
    pub fn new(node_count: usize, tails: Vec<usize>, heads: Vec<usize>) -> Result<Self, Error> {
        if tails.len() != heads.len() {
            return Err(Error::LengthMismatch {
                what: "incidence heads",
                expected: tails.len(),
                found: heads.len(),
            });
        }
        if let Some(&v) = tails.iter().chain(&heads).find(|&&v| v >= node_count) {
            return Err(Error::NodeOutOfRange(v));
        }
        if let Some((&v, _)) = tails.iter().zip(&heads).find(|(t, h)| t == h) {
            return Err(Error::SelfLoop(v));
        }
        Ok(Self {
            node_count,
            tails,
            heads,
        })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.tails.len()
    }

    pub fn tail(&self, edge: usize) -> usize {
        self.tails[edge]
    }

    pub fn head(&self, edge: usize) -> usize {
        self.heads[edge]
    }

    /// Signed column of arc `edge`: `[(tail, -1), (head, +1)]`.
    pub fn column(&self, edge: usize) -> [(usize, f64); 2] {
        [(self.tails[edge], -1.0), (self.heads[edge], 1.0)]
    }

    /// Dense column of arc `edge` as a node vector.
    pub fn dense_column(&self, edge: usize) -> Vec<f64> {
        let mut out = vec![0.0; self.node_count];
        self.column(edge).iter().for_each(|&(v, s)| out[v] += s);
        out
    }

    /// Γx: net inflow per node.
    pub fn apply(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.edge_count());
        let mut out = vec![0.0; self.node_count];
        self.tails
            .iter()
            .zip(&self.heads)
            .zip(x)
            .for_each(|((&t, &h), &xe)| {
                out[t] -= xe;
                out[h] += xe;
            });
        out
    }

    /// Γᵀπ: potential difference (head minus tail) per arc.
    pub fn transpose_apply(&self, potential: &[f64]) -> Vec<f64> {
        debug_assert_eq!(potential.len(), self.node_count);
        self.tails
            .iter()
            .zip(&self.heads)
            .map(|(&t, &h)| potential[h] - potential[t])
            .collect()
    }

    /// Γ·diag(w)·Γᵀ applied to a node vector.
    pub fn laplacian_apply(&self, weights: &[f64], potential: &[f64]) -> Vec<f64> {
        let scaled: Vec<f64> = self
            .transpose_apply(potential)
            .into_iter()
            .zip(weights)
            .map(|(g, w)| g * w)
            .collect();
        self.apply(&scaled)
    }

    /// Connected components of the subgraph of arcs with a non-zero weight.
    pub fn components(&self, weights: &[f64]) -> Components {
        let mut uf = UnionFind::<usize>::new(self.node_count);
        self.tails
            .iter()
            .zip(&self.heads)
            .zip(weights)
            .filter(|(_, &w)| w != 0.0)
            .for_each(|((&t, &h), _)| {
                uf.union(t, h);
            });

        // relabel representatives to 0..count in node order
        let reps = uf.into_labeling();
        let mut map = vec![usize::MAX; self.node_count];
        let mut count = 0;
        let labels = reps
            .into_iter()
            .map(|r| {
                if map[r] == usize::MAX {
                    map[r] = count;
                    count += 1;
                }
                map[r]
            })
            .collect();
        Components { count, labels }
    }
}

/// Connected components of a weighted subgraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components {
    pub count: usize,
    /// Component label per node, numbered by first occurrence.
    pub labels: Vec<usize>,
}
