#![warn(clippy::all, clippy::pedantic)]
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use csv::Writer;
use serde::{Deserialize, Serialize};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use parametric_mcf::{
    AffineDemand, Breakpoints, CostFunction, EfaConfig, InterpolationOptions, InverseMethod, Mca,
    Network, PiecewiseQuadratic, PivotMode, PolynomialCost,
};

/// Traces the optimal flow of a network as the demand between two nodes grows.
#[derive(Parser, Debug)]
#[command(name = "pmcf-cli", author, version, about, long_about = None)]
struct Args {
    /// Arc list with the columns source,target,lower,upper,c0,c1,c2,c3,c4.
    input: PathBuf,
    /// Output CSV of (lambda, edge, flow) rows; standard output if omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Node the demand leaves from.
    #[arg(short, long)]
    source: usize,
    /// Node the demand arrives at.
    #[arg(short = 't', long)]
    sink: usize,
    /// Units of demand per unit of lambda.
    #[arg(long, default_value_t = 1.0)]
    rate: f64,
    /// Constant shipment from source to sink on top of the parametric one.
    #[arg(long, default_value_t = 0.0)]
    base: f64,
    #[arg(long)]
    lambda_max: Option<f64>,
    #[arg(long, default_value = "lexicographic")]
    pivot_mode: PivotMode,
    #[arg(long, default_value = "cholesky")]
    inverse_method: InverseMethod,
    /// Further EFA parameter, e.g. --set max_iter=500.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
    /// Relative error of the interpolated costs.
    #[arg(long, default_value_t = 1.1)]
    alpha: f64,
    /// Absolute error of the interpolated costs.
    #[arg(long, default_value_t = 0.01)]
    beta: f64,
    /// Bound on any flow; required when some cost has degree above two.
    #[arg(long)]
    x_max: Option<f64>,
    /// Log more; repeat for debug and trace output.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Deserialize)]
struct ArcRow {
    source: usize,
    target: usize,
    lower: Option<f64>,
    upper: Option<f64>,
    c0: Option<f64>,
    c1: Option<f64>,
    c2: Option<f64>,
    c3: Option<f64>,
    c4: Option<f64>,
}

#[derive(Debug, Serialize)]
struct FlowRow {
    lambda: f64,
    edge: usize,
    flow: f64,
}

fn read_arcs(path: &Path) -> Result<Vec<ArcRow>, Box<dyn Error>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let rows: Result<Vec<ArcRow>, _> = rdr.deserialize().collect();
    Ok(rows?)
}

fn build_network(arcs: &[ArcRow], min_nodes: usize) -> Result<Network, Box<dyn Error>> {
    let node_count = arcs
        .iter()
        .map(|a| a.source.max(a.target) + 1)
        .fold(min_nodes, usize::max);
    let mut network = Network::new(node_count);
    for arc in arcs {
        network.add_edge(
            arc.source,
            arc.target,
            arc.lower.unwrap_or(f64::NEG_INFINITY),
            arc.upper.unwrap_or(f64::INFINITY),
        )?;
    }
    Ok(network)
}

// Quadratic costs are used as they are; anything steeper is interpolated with MCA
fn piecewise_costs(
    arcs: &[ArcRow],
    network: &Network,
    args: &Args,
) -> Result<PiecewiseQuadratic, Box<dyn Error>> {
    let coefficients = arcs
        .iter()
        .map(|a| {
            [a.c0, a.c1, a.c2, a.c3, a.c4]
                .map(|c| c.unwrap_or(0.0))
                .to_vec()
        })
        .collect();
    let poly = PolynomialCost::new(coefficients)?;
    let m = poly.edge_count();

    if (0..m).all(|e| poly.degree(e).is_some_and(|d| d <= 2)) {
        let quadratic: Vec<(f64, f64, f64)> = (0..m)
            .map(|e| {
                let c = poly.coefficients(e);
                (c[2], c[1], c[0])
            })
            .collect();
        return Ok(PiecewiseQuadratic::quadratic(network, &quadratic)?);
    }

    let x_max = args
        .x_max
        .ok_or("--x-max is required for costs of degree above two")?;
    let rule = Mca::new(args.alpha, args.beta, x_max, m)?;
    let costs = PiecewiseQuadratic::interpolate(
        &poly,
        &network.lower_bounds(),
        &network.upper_bounds(),
        &rule,
        InterpolationOptions::new(x_max),
    )?;
    log::info!(
        "interpolated {m} edges into {} pieces",
        costs.table().len()
    );
    Ok(costs)
}

fn write_breakpoints(
    breakpoints: &Breakpoints,
    output: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let sink: Box<dyn io::Write> = match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(io::stdout()),
    };
    let mut wtr = Writer::from_writer(sink);
    for bp in breakpoints {
        for (edge, &flow) in bp.flow.iter().enumerate() {
            wtr.serialize(FlowRow {
                lambda: bp.lambda,
                edge,
                flow,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let mut config = EfaConfig::default()
        .with_pivot_mode(args.pivot_mode)
        .with_inverse_method(args.inverse_method);
    if let Some(lambda_max) = args.lambda_max {
        config.lambda_max = lambda_max;
    }
    for pair in &args.set {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got `{pair}`"))?;
        config.set(key.trim(), value)?;
    }

    let arcs = read_arcs(&args.input)?;
    let network = build_network(&arcs, args.source.max(args.sink) + 1)?;
    let costs = piecewise_costs(&arcs, &network, &args)?;

    let mut demand = AffineDemand::single_commodity(args.source, args.sink, args.rate);
    if args.base != 0.0 {
        demand = demand.with_base(args.source, args.sink, args.base);
    }

    let breakpoints = parametric_mcf::solve(&network, &costs, &demand, config)?;
    log::info!("{} breakpoints", breakpoints.len());
    write_breakpoints(&breakpoints, args.output.as_deref())
}
