use nalgebra::linalg::Cholesky;
use nalgebra::{DMatrix, DVector};

/// A Sherman-Morrison denominator this small relative to its terms means the update
/// makes the Laplacian singular.
const SINGULAR_EPSILON: f64 = 1e-10;

/// Explicit inverse of the reduced Laplacian.
#[derive(Debug, Clone)]
pub struct DenseInverse {
    reduced: DMatrix<f64>,
    weights: Vec<f64>,
}

impl DenseInverse {
    pub(super) fn from_reduced(laplacian: DMatrix<f64>, weights: Vec<f64>) -> Option<Self> {
        let reduced = Cholesky::new(laplacian)?.inverse();
        Some(Self { reduced, weights })
    }

    pub fn reduced(&self) -> &DMatrix<f64> {
        &self.reduced
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub(super) fn reduced_dim(&self) -> usize {
        self.reduced.nrows()
    }

    pub(super) fn solve_reduced(&self, rhs: &DVector<f64>) -> DVector<f64> {
        &self.reduced * rhs
    }

    /// `(L + Δc·γγᵀ)⁻¹ = L⁻¹ - Δc·(L⁻¹γ)(L⁻¹γ)ᵀ / (1 + Δc·γᵀL⁻¹γ)`.
    pub(super) fn rank_one_update(
        mut self,
        column: &DVector<f64>,
        delta_c: f64,
        weights: Vec<f64>,
    ) -> Option<Self> {
        let u = &self.reduced * column;
        let q = delta_c * column.dot(&u);
        let denominator = 1.0 + q;
        if !denominator.is_finite() || denominator.abs() <= SINGULAR_EPSILON * (1.0 + q.abs()) {
            return None;
        }
        self.reduced.ger(-delta_c / denominator, &u, &u, 1.0);
        self.weights = weights;
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::laplacian::{reduced_column, reduced_laplacian};
    use crate::network::Incidence;

    fn triangle() -> Incidence {
        Incidence::new(3, vec![0, 1, 0], vec![1, 2, 2]).unwrap()
    }

    #[test]
    fn sherman_morrison_matches_refactoring() {
        let inc = triangle();
        let before = [1.0, 2.0, 0.5];
        let after = [1.0, 2.0, 3.0];
        let inv = DenseInverse::from_reduced(reduced_laplacian(&inc, &before), before.to_vec())
            .unwrap()
            .rank_one_update(&reduced_column(&inc, 2), 2.5, after.to_vec())
            .unwrap();
        let fresh =
            DenseInverse::from_reduced(reduced_laplacian(&inc, &after), after.to_vec()).unwrap();
        assert!((inv.reduced() - fresh.reduced()).amax() < 1e-12);
        assert_eq!(inv.weights(), &after);
    }

    #[test]
    fn cutting_the_last_link_is_rejected() {
        // node 2 hangs on edge 1 only
        let inc = Incidence::new(3, vec![0, 1], vec![1, 2]).unwrap();
        let weights = [1.0, 2.0];
        let inv = DenseInverse::from_reduced(reduced_laplacian(&inc, &weights), weights.to_vec())
            .unwrap();
        assert!(inv
            .rank_one_update(&reduced_column(&inc, 1), -2.0, vec![1.0, 0.0])
            .is_none());
    }
}
