use crate::error::Error;

/// Sparse node vector as `(node, value)` pairs; repeated nodes add up.
pub type SparseVector = Vec<(usize, f64)>;

pub fn to_dense(sparse: &[(usize, f64)], len: usize) -> Result<Vec<f64>, Error> {
    let mut out = vec![0.0; len];
    for &(v, value) in sparse {
        *out.get_mut(v).ok_or(Error::NodeOutOfRange(v))? += value;
    }
    Ok(out)
}

/// A node demand parametrized by λ. Positive entries are sinks (net inflow),
/// negative entries are sources.
pub trait Demand {
    fn value(&self, lambda: f64) -> SparseVector;
    fn derivative(&self, lambda: f64) -> SparseVector;

    fn commodity_count(&self) -> usize {
        1
    }

    /// Whether `value(λ) = value(0) + λ·derivative(0)` holds for every λ.
    fn is_affine(&self) -> bool;
}

/// Single-commodity demand `base + λ·slope`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffineDemand {
    base: SparseVector,
    slope: SparseVector,
}

impl AffineDemand {
    pub fn new(base: SparseVector, slope: SparseVector) -> Self {
        Self { base, slope }
    }

    /// Purely linear demand `λ·slope`.
    pub fn linear(slope: SparseVector) -> Self {
        Self::new(Vec::new(), slope)
    }

    /// λ·`value` units sent from `source` to `sink`.
    pub fn single_commodity(source: usize, sink: usize, value: f64) -> Self {
        Self::linear(vec![(source, -value), (sink, value)])
    }

    /// Adds a constant shipment of `value` units from `source` to `sink`.
    pub fn with_base(mut self, source: usize, sink: usize, value: f64) -> Self {
        self.base.push((source, -value));
        self.base.push((sink, value));
        self
    }

    pub fn base(&self) -> &[(usize, f64)] {
        &self.base
    }

    pub fn slope(&self) -> &[(usize, f64)] {
        &self.slope
    }
}

impl Demand for AffineDemand {
    fn value(&self, lambda: f64) -> SparseVector {
        self.base
            .iter()
            .copied()
            .chain(self.slope.iter().map(|&(v, s)| (v, lambda * s)))
            .collect()
    }

    fn derivative(&self, _lambda: f64) -> SparseVector {
        self.slope.clone()
    }

    fn is_affine(&self) -> bool {
        true
    }
}

/// Dense `(base, slope)` of an affine single-commodity demand on `node_count` nodes.
pub(crate) fn affine_parts(
    demand: &dyn Demand,
    node_count: usize,
) -> Result<(Vec<f64>, Vec<f64>), Error> {
    if demand.commodity_count() != 1 {
        return Err(Error::MultiCommodity(demand.commodity_count()));
    }
    if !demand.is_affine() {
        return Err(Error::NonAffineDemand);
    }
    let base = to_dense(&demand.value(0.0), node_count)?;
    let slope = to_dense(&demand.derivative(0.0), node_count)?;
    for v in [&base, &slope] {
        let imbalance: f64 = v.iter().sum();
        let scale = v.iter().map(|x| x.abs()).fold(1.0, f64::max);
        if imbalance.abs() > 1e-9 * scale {
            return Err(Error::UnbalancedDemand(imbalance));
        }
    }
    Ok((base, slope))
}
