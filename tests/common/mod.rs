#![allow(dead_code)]

use parametric_mcf::{Network, PiecewiseQuadratic, QuadraticPiece};

pub fn assert_close(actual: f64, expected: f64) {
    let tol = 1e-8_f64.max(1e-5 * expected.abs());
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual}"
    );
}

pub fn assert_all_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (a, e) in actual.iter().zip(expected) {
        assert_close(*a, *e);
    }
}

/// s=0, v1=1, v2=2, t=3 with arcs s→v1, s→v2, v1→v2, v1→t, v2→t.
pub fn diamond() -> (Network, PiecewiseQuadratic) {
    let mut net = Network::new(4);
    for (s, t) in [(0, 1), (0, 2), (1, 2), (1, 3), (2, 3)] {
        net.add_edge(s, t, 0.0, f64::INFINITY).unwrap();
    }
    let costs = PiecewiseQuadratic::quadratic(
        &net,
        &[
            (1.0, 0.0, 0.0),
            (0.5, 3.0, 0.0),
            (0.5, 0.0, 0.0),
            (0.5, 3.0, 0.0),
            (1.0, 0.0, 0.0),
        ],
    )
    .unwrap();
    (net, costs)
}

/// Path 0→1→2→3 with costs x²+x, x², x² and non-negative flows.
pub fn ambiguous_path() -> (Network, PiecewiseQuadratic) {
    let mut net = Network::new(4);
    for v in 0..3 {
        net.add_edge(v, v + 1, 0.0, f64::INFINITY).unwrap();
    }
    let edge = |b: f64| {
        vec![
            QuadraticPiece::lower_bound(0.0),
            QuadraticPiece::new(0.0, 1.0, b, 0.0),
        ]
    };
    let costs = PiecewiseQuadratic::new(vec![edge(1.0), edge(0.0), edge(0.0)]).unwrap();
    (net, costs)
}
