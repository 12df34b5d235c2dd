use parametric_mcf::{
    AffineDemand, Breakpoints, Efa, EfaConfig, InverseMethod, Network, PiecewiseQuadratic,
    PivotMode, Termination,
};
use proptest::prelude::*;

const LAMBDA_MAX: f64 = 5.0;

#[derive(Debug, Clone)]
struct Instance {
    node_count: usize,
    arcs: Vec<(usize, usize)>,
    /// (a, b) of the cost a·x² + b·x per arc
    costs: Vec<(f64, f64)>,
}

impl Instance {
    fn build(&self) -> (Network, PiecewiseQuadratic) {
        let mut net = Network::new(self.node_count);
        for &(s, t) in &self.arcs {
            net.add_edge(s, t, 0.0, f64::INFINITY).unwrap();
        }
        let coefficients: Vec<_> = self.costs.iter().map(|&(a, b)| (a, b, 0.0)).collect();
        let costs = PiecewiseQuadratic::quadratic(&net, &coefficients).unwrap();
        (net, costs)
    }

    fn sink(&self) -> usize {
        self.node_count - 1
    }
}

/// Directed path 0→…→n-1 plus chords in either direction, all with non-negative flow.
fn instance() -> impl Strategy<Value = Instance> {
    (3usize..8).prop_flat_map(|n| {
        let chords = prop::collection::vec((0..n, 0..n), 0..2 * n);
        (Just(n), chords).prop_flat_map(|(n, chords)| {
            let mut arcs: Vec<(usize, usize)> = (0..n - 1).map(|v| (v, v + 1)).collect();
            arcs.extend(chords.into_iter().filter(|(a, b)| a != b));
            let costs = prop::collection::vec((0.5f64..2.0, 0.0f64..3.0), arcs.len());
            (Just(n), Just(arcs), costs).prop_map(|(node_count, arcs, costs)| Instance {
                node_count,
                arcs,
                costs,
            })
        })
    })
}

fn run(instance: &Instance, config: EfaConfig) -> Breakpoints {
    let (net, costs) = instance.build();
    let demand = AffineDemand::single_commodity(0, instance.sink(), 1.0);
    let mut efa = Efa::from_network(&net, costs, &demand, config).unwrap();
    match efa.run() {
        Ok(Termination::LambdaLargerMax) => {}
        Ok(Termination::LambdaInf) => assert!(efa.breakpoints().tail().is_some()),
        other => panic!("unexpected end of run: {other:?}"),
    }
    efa.into_breakpoints()
}

/// Breakpoints plus, for a run that is linear to infinity, the point at `LAMBDA_MAX`.
fn samples(bp: &Breakpoints) -> Vec<(f64, Vec<f64>, Vec<f64>)> {
    let mut out: Vec<_> = bp
        .iter()
        .map(|b| (b.lambda, b.flow.clone(), b.potential.clone()))
        .collect();
    if bp.tail().is_some() {
        out.push((
            LAMBDA_MAX,
            bp.flow_at(LAMBDA_MAX).unwrap(),
            bp.potential_at(LAMBDA_MAX).unwrap(),
        ));
    }
    out
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn breakpoints_are_optimal_flows(instance in instance()) {
        let (net, costs) = instance.build();
        let incidence = net.incidence();
        let bp = run(&instance, EfaConfig::default().with_lambda_max(LAMBDA_MAX));

        prop_assert!(!bp.is_empty());
        prop_assert_eq!(bp.first().unwrap().lambda, 0.0);
        if bp.tail().is_none() {
            prop_assert!(close(bp.last().unwrap().lambda, LAMBDA_MAX));
        }

        let points = samples(&bp);
        let mut previous_cost = f64::NEG_INFINITY;
        for (i, (lambda, flow, potential)) in points.iter().enumerate() {
            let lambda = *lambda;
            if i > 0 {
                prop_assert!(lambda >= points[i - 1].0);
            }

            // conservation: net inflow is λ at the sink and -λ at the source
            let inflow = incidence.apply(flow);
            for (v, &f) in inflow.iter().enumerate() {
                let expected = if v == 0 {
                    -lambda
                } else if v == instance.sink() {
                    lambda
                } else {
                    0.0
                };
                prop_assert!(close(f, expected), "node {} inflow {} at λ={}", v, f, lambda);
            }

            // complementary slackness against the node potentials
            let diff = incidence.transpose_apply(potential);
            for (e, &(a, slope)) in instance.costs.iter().enumerate() {
                let x = flow[e];
                prop_assert!(x >= -1e-7, "edge {} flow {}", e, x);
                if x > 1e-7 {
                    prop_assert!(close(2.0 * a * x + slope, diff[e]));
                } else {
                    prop_assert!(diff[e] <= slope + 1e-6);
                }
            }

            let cost = costs.total_cost(&flow.iter().map(|x| x.max(0.0)).collect::<Vec<_>>());
            prop_assert!(cost >= previous_cost - 1e-7);
            previous_cost = cost;
        }
    }

    #[test]
    fn flow_is_linear_between_breakpoints(instance in instance()) {
        let bp = run(&instance, EfaConfig::default().with_lambda_max(LAMBDA_MAX));
        let (left, right) = bp
            .as_slice()
            .windows(2)
            .map(|w| (w[0].lambda, w[1].lambda))
            .fold((0.0, 0.0), |best, gap| {
                if gap.1 - gap.0 > best.1 - best.0 { gap } else { best }
            });
        prop_assume!(right - left > 1e-3);
        let mid = 0.5 * (left + right);

        // mid lies before the last breakpoint, so the truncated run is clamped there
        let truncated = run(&instance, EfaConfig::default().with_lambda_max(mid));
        prop_assert!(truncated.tail().is_none());
        let last = truncated.last().unwrap();
        prop_assert!(close(last.lambda, mid));
        let expected = bp.flow_at(mid).unwrap();
        for (x, y) in last.flow.iter().zip(&expected) {
            prop_assert!(close(*x, *y), "{:?} vs {:?}", last.flow, expected);
        }
    }

    #[test]
    fn configurations_agree(instance in instance()) {
        let reference = run(&instance, EfaConfig::default().with_lambda_max(LAMBDA_MAX));
        for (pivot, inverse, interval) in [
            (PivotMode::First, InverseMethod::Direct, 0),
            (PivotMode::Random, InverseMethod::Cholesky, 1),
            (PivotMode::Lexicographic, InverseMethod::Direct, 3),
        ] {
            let config = EfaConfig {
                recompute_interval: interval,
                seed: 5,
                ..EfaConfig::default()
                    .with_lambda_max(LAMBDA_MAX)
                    .with_pivot_mode(pivot)
                    .with_inverse_method(inverse)
            };
            let other = run(&instance, config);
            for k in 0..=20 {
                let lambda = LAMBDA_MAX * k as f64 / 20.0;
                let (a, b) = (reference.flow_at(lambda).unwrap(), other.flow_at(lambda).unwrap());
                for (x, y) in a.iter().zip(&b) {
                    prop_assert!(close(*x, *y), "λ={}: {:?} vs {:?}", lambda, a, b);
                }
            }
        }
    }
}
