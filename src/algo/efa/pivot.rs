//! Pivot selection among the edges that reach their piece boundary at the same λ.

use std::cmp::Ordering;

use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::laplacian::LaplacianInverse;
use crate::network::Incidence;
use crate::numerics::{max_abs, snap_to_zero};

/// An edge on the boundary together with the slope of its potential difference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub edge: usize,
    pub slope: f64,
}

impl Candidate {
    /// Direction the region of the edge moves when it is pivoted.
    pub fn step(&self) -> isize {
        if self.slope > 0.0 {
            1
        } else {
            -1
        }
    }
}

pub(crate) fn first(boundary: &[Candidate]) -> usize {
    boundary
        .iter()
        .enumerate()
        .min_by_key(|(_, c)| c.edge)
        .map_or(0, |(i, _)| i)
}

pub(crate) fn random(boundary: &[Candidate], rng: &mut Xoshiro256PlusPlus) -> usize {
    rng.gen_range(0..boundary.len())
}

/// Position of the candidate whose column `L0·L*·γ_e·(-1/slope_e)` is lexicographically
/// smallest.
///
/// `L0` is the Laplacian of the starting region. Entries below `threshold(scale)` are
/// zero, and two entries closer than the threshold compare equal.
pub(crate) fn lexicographic(
    boundary: &[Candidate],
    incidence: &Incidence,
    inverse: &LaplacianInverse,
    initial_weights: &[f64],
    threshold: impl Fn(f64) -> f64,
) -> usize {
    let columns: Vec<Vec<f64>> = boundary
        .iter()
        .map(|c| {
            let u = inverse.solve(&incidence.dense_column(c.edge));
            let mut v = incidence.laplacian_apply(initial_weights, &u);
            let scale = -1.0 / c.slope;
            v.iter_mut().for_each(|x| *x *= scale);
            let thr = threshold(max_abs(&v));
            v.into_iter().map(|x| snap_to_zero(x, thr)).collect()
        })
        .collect();

    let compare = |a: &[f64], b: &[f64]| {
        a.iter()
            .zip(b)
            .map(|(&x, &y)| {
                if (x - y).abs() <= threshold(x.abs().max(y.abs())) {
                    Ordering::Equal
                } else {
                    x.total_cmp(&y)
                }
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    };

    (1..columns.len()).fold(0, |best, i| {
        match compare(&columns[i], &columns[best]) {
            Ordering::Less => i,
            Ordering::Equal if boundary[i].edge < boundary[best].edge => i,
            _ => best,
        }
    })
}
