use std::cell::OnceCell;

use nalgebra::linalg::Cholesky;
use nalgebra::{DMatrix, DVector};

/// A pivot whose square shrinks below this fraction of its old value is treated as a
/// breakdown of the rank-one update.
const BREAKDOWN_EPSILON: f64 = 1e-14;

/// Lower Cholesky factor of the reduced Laplacian.
///
/// The explicit inverse is only formed when asked for, and cached until the next
/// update.
#[derive(Debug, Clone)]
pub struct CholeskyInverse {
    factor: DMatrix<f64>,
    inverse: OnceCell<DMatrix<f64>>,
    weights: Vec<f64>,
}

impl CholeskyInverse {
    pub(super) fn from_reduced(laplacian: DMatrix<f64>, weights: Vec<f64>) -> Option<Self> {
        let factor = Cholesky::new(laplacian)?.unpack();
        Some(Self {
            factor,
            inverse: OnceCell::new(),
            weights,
        })
    }

    pub fn factor(&self) -> &DMatrix<f64> {
        &self.factor
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub(super) fn reduced_dim(&self) -> usize {
        self.factor.nrows()
    }

    pub(super) fn solve_reduced(&self, rhs: &DVector<f64>) -> DVector<f64> {
        let mut x = rhs.clone();
        let solved = self.factor.solve_lower_triangular_mut(&mut x)
            && self.factor.tr_solve_lower_triangular_mut(&mut x);
        debug_assert!(solved, "cholesky factor has a zero pivot");
        x
    }

    pub(super) fn materialize_reduced(&self) -> &DMatrix<f64> {
        self.inverse.get_or_init(|| {
            let k = self.reduced_dim();
            let mut inv = DMatrix::identity(k, k);
            let solved = self.factor.solve_lower_triangular_mut(&mut inv)
                && self.factor.tr_solve_lower_triangular_mut(&mut inv);
            debug_assert!(solved, "cholesky factor has a zero pivot");
            inv
        })
    }

    /// Updates the factor of `L` to the factor of `L + σ·γγᵀ`.
    ///
    /// Returns `None` when a pivot vanishes or stops being finite, in which case the
    /// updated matrix is (numerically) not positive definite.
    pub(super) fn rank_one_update(
        mut self,
        column: &DVector<f64>,
        sigma: f64,
        weights: Vec<f64>,
    ) -> Option<Self> {
        let n = self.reduced_dim();
        let mut x = column.clone();
        let mut beta = 1.0;
        for j in 0..n {
            let diag = self.factor[(j, j)];
            let diag2 = diag * diag;
            let xj = x[j];
            let sigma_xj2 = sigma * xj * xj;
            let gamma = diag2 * beta + sigma_xj2;
            let new_diag2 = diag2 + sigma_xj2 / beta;
            if !new_diag2.is_finite() || new_diag2 <= BREAKDOWN_EPSILON * diag2 {
                return None;
            }
            let new_diag = new_diag2.sqrt();
            self.factor[(j, j)] = new_diag;
            beta += sigma_xj2 / diag2;

            for i in (j + 1)..n {
                x[i] -= xj / diag * self.factor[(i, j)];
                if gamma != 0.0 {
                    self.factor[(i, j)] = new_diag / diag * self.factor[(i, j)]
                        + new_diag * sigma * xj / gamma * x[i];
                }
            }
        }
        self.inverse = OnceCell::new();
        self.weights = weights;
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::laplacian::{reduced_column, reduced_laplacian};
    use crate::network::Incidence;

    fn diamond() -> Incidence {
        Incidence::new(4, vec![0, 0, 1, 1, 2], vec![1, 2, 2, 3, 3]).unwrap()
    }

    fn build(inc: &Incidence, weights: &[f64]) -> CholeskyInverse {
        CholeskyInverse::from_reduced(reduced_laplacian(inc, weights), weights.to_vec()).unwrap()
    }

    #[test]
    fn updates_and_downdates_match_refactoring() {
        let inc = diamond();
        let start = [0.5, 1.0, 0.5, 1.0, 0.5];
        let raised = [0.5, 1.0, 2.0, 1.0, 0.5];
        let lowered = [0.5, 1.0, 2.0, 1.0, 0.25];

        let up = build(&inc, &start)
            .rank_one_update(&reduced_column(&inc, 2), 1.5, raised.to_vec())
            .unwrap();
        assert!((up.factor() - build(&inc, &raised).factor()).amax() < 1e-12);

        let down = up
            .rank_one_update(&reduced_column(&inc, 4), -0.25, lowered.to_vec())
            .unwrap();
        let fresh = build(&inc, &lowered);
        assert!((down.factor() - fresh.factor()).amax() < 1e-12);
        assert!((down.materialize_reduced() - fresh.materialize_reduced()).amax() < 1e-10);
    }

    #[test]
    fn materialized_inverse_is_refreshed_after_update() {
        let inc = diamond();
        let start = [1.0; 5];
        let mut raised = start;
        raised[0] = 3.0;
        let inv = build(&inc, &start);
        let before = inv.materialize_reduced().clone();
        let inv = inv
            .rank_one_update(&reduced_column(&inc, 0), 2.0, raised.to_vec())
            .unwrap();
        let after = inv.materialize_reduced();
        assert!((after - &before).amax() > 1e-3);
        let l = reduced_laplacian(&inc, &raised);
        assert!((&l * after - DMatrix::identity(3, 3)).amax() < 1e-12);
    }

    #[test]
    fn indefinite_downdate_breaks_down() {
        let inc = Incidence::new(2, vec![0], vec![1]).unwrap();
        let inv = build(&inc, &[1.0]);
        assert!(inv
            .rank_one_update(&reduced_column(&inc, 0), -1.0, vec![0.0])
            .is_none());
    }
}
