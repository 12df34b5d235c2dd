//! Generalized inverse `L*` of a weighted graph Laplacian `L = Γ·diag(w)·Γᵀ`.
//!
//! Node 0 is the reference node: its row and column are dropped, the reduced
//! `(n-1)×(n-1)` system is inverted, and results are padded with a zero so the
//! reference node always has potential zero. Two realizations are available,
//! selected by [`InverseMethod`]: an explicit dense inverse kept current with
//! Sherman-Morrison updates, and a Cholesky factor kept current with rank-one
//! up/downdates.
//!
//! A Laplacian whose non-zero-weight subgraph is disconnected is not an error: it is
//! reported as [`Inverted::Singular`] together with the connected components.

pub mod cholesky;
pub mod dense;

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};

pub use crate::network::Components;
use crate::error::Error;
use crate::network::Incidence;
pub use cholesky::CholeskyInverse;
pub use dense::DenseInverse;

/// Weights this small relative to the update that produced them are treated as zero.
const WEIGHT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InverseMethod {
    /// Explicit dense inverse with Sherman-Morrison updates.
    Direct,
    /// Cholesky factor with rank-one updates and lazily materialized inverse.
    #[default]
    Cholesky,
}

impl FromStr for InverseMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" | "dense" | "direct_inverse" => Ok(Self::Direct),
            "cholesky" => Ok(Self::Cholesky),
            _ => Err(Error::InvalidInverseMethod(s.to_string())),
        }
    }
}

impl fmt::Display for InverseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Cholesky => f.write_str("cholesky"),
        }
    }
}

/// Outcome of inverting or updating a Laplacian.
#[derive(Debug, Clone)]
pub enum Inverted {
    Regular(LaplacianInverse),
    Singular(Components),
}

#[derive(Debug, Clone)]
pub enum LaplacianInverse {
    Dense(DenseInverse),
    Cholesky(CholeskyInverse),
}

/// Inverts the Laplacian of `incidence` weighted by `weights`.
pub fn invert(
    incidence: &Incidence,
    weights: &[f64],
    method: InverseMethod,
) -> Result<Inverted, Error> {
    if weights.len() != incidence.edge_count() {
        return Err(Error::LengthMismatch {
            what: "laplacian weights",
            expected: incidence.edge_count(),
            found: weights.len(),
        });
    }
    let components = incidence.components(weights);
    if components.count > 1 {
        return Ok(Inverted::Singular(components));
    }

    let reduced = reduced_laplacian(incidence, weights);
    let inverse = match method {
        InverseMethod::Direct => {
            DenseInverse::from_reduced(reduced, weights.to_vec()).map(LaplacianInverse::Dense)
        }
        InverseMethod::Cholesky => {
            CholeskyInverse::from_reduced(reduced, weights.to_vec()).map(LaplacianInverse::Cholesky)
        }
    };
    Ok(match inverse {
        Some(inverse) => Inverted::Regular(inverse),
        None => {
            log::debug!("laplacian is connected but numerically singular");
            Inverted::Singular(components)
        }
    })
}

impl LaplacianInverse {
    pub fn method(&self) -> InverseMethod {
        match self {
            Self::Dense(_) => InverseMethod::Direct,
            Self::Cholesky(_) => InverseMethod::Cholesky,
        }
    }

    /// Shape of the padded inverse, `(n, n)`.
    pub fn shape(&self) -> (usize, usize) {
        let n = self.reduced_dim() + 1;
        (n, n)
    }

    /// Edge weights the inverse currently reflects.
    pub fn weights(&self) -> &[f64] {
        match self {
            Self::Dense(inv) => inv.weights(),
            Self::Cholesky(inv) => inv.weights(),
        }
    }

    fn reduced_dim(&self) -> usize {
        match self {
            Self::Dense(inv) => inv.reduced_dim(),
            Self::Cholesky(inv) => inv.reduced_dim(),
        }
    }

    /// `L*·rhs`; the reference node gets potential zero.
    pub fn solve(&self, rhs: &[f64]) -> Vec<f64> {
        let k = self.reduced_dim();
        debug_assert_eq!(rhs.len(), k + 1);
        let reduced = DVector::from_iterator(k, rhs[1..].iter().copied());
        let x = match self {
            Self::Dense(inv) => inv.solve_reduced(&reduced),
            Self::Cholesky(inv) => inv.solve_reduced(&reduced),
        };
        std::iter::once(0.0).chain(x.iter().copied()).collect()
    }

    /// The explicit padded `n×n` generalized inverse.
    pub fn materialize(&self) -> DMatrix<f64> {
        let k = self.reduced_dim();
        let mut out = DMatrix::zeros(k + 1, k + 1);
        let reduced = match self {
            Self::Dense(inv) => inv.reduced(),
            Self::Cholesky(inv) => inv.materialize_reduced(),
        };
        out.view_mut((1, 1), (k, k)).copy_from(reduced);
        out
    }

    /// Inverse after the weight of `edge` changes by `delta_c`, without refactoring.
    ///
    /// Falls back to a full inversion if the incremental update breaks down numerically
    /// while the active subgraph stays connected.
    pub fn update(
        self,
        incidence: &Incidence,
        edge: usize,
        delta_c: f64,
    ) -> Result<Inverted, Error> {
        if delta_c == 0.0 {
            return Ok(Inverted::Regular(self));
        }
        let method = self.method();
        let mut weights = self.weights().to_vec();
        let old = weights[edge];
        weights[edge] += delta_c;
        if weights[edge].abs() <= WEIGHT_EPSILON * old.abs().max(delta_c.abs()) {
            weights[edge] = 0.0;
        }

        if weights[edge] == 0.0 {
            let components = incidence.components(&weights);
            if components.count > 1 {
                return Ok(Inverted::Singular(components));
            }
        }

        let column = reduced_column(incidence, edge);
        let updated = match self {
            Self::Dense(inv) => inv
                .rank_one_update(&column, delta_c, weights.clone())
                .map(Self::Dense),
            Self::Cholesky(inv) => inv
                .rank_one_update(&column, delta_c, weights.clone())
                .map(Self::Cholesky),
        };
        match updated {
            Some(inverse) => Ok(Inverted::Regular(inverse)),
            None => {
                log::debug!("rank-one update of edge {edge} failed, refactoring");
                invert(incidence, &weights, method)
            }
        }
    }
}

/// Laplacian with the reference node's row and column removed.
pub(crate) fn reduced_laplacian(incidence: &Incidence, weights: &[f64]) -> DMatrix<f64> {
    let k = incidence.node_count().saturating_sub(1);
    let mut l = DMatrix::zeros(k, k);
    for (e, &w) in weights.iter().enumerate().filter(|(_, &w)| w != 0.0) {
        let (t, h) = (incidence.tail(e), incidence.head(e));
        if t > 0 {
            l[(t - 1, t - 1)] += w;
        }
        if h > 0 {
            l[(h - 1, h - 1)] += w;
        }
        if t > 0 && h > 0 {
            l[(t - 1, h - 1)] -= w;
            l[(h - 1, t - 1)] -= w;
        }
    }
    l
}

/// Signed incidence column of `edge` without the reference node's entry.
pub(crate) fn reduced_column(incidence: &Incidence, edge: usize) -> DVector<f64> {
    let k = incidence.node_count().saturating_sub(1);
    let mut g = DVector::zeros(k);
    for (v, s) in incidence.column(edge) {
        if v > 0 {
            g[v - 1] += s;
        }
    }
    g
}
