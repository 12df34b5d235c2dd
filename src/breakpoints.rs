use serde::Serialize;

/// Optimal flow and node potentials at one value of λ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakpoint {
    pub lambda: f64,
    pub flow: Vec<f64>,
    pub potential: Vec<f64>,
}

/// Rate of change of flow and potentials beyond the last breakpoint, recorded when the
/// solution stays linear up to λ = +∞.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tail {
    pub flow_slope: Vec<f64>,
    pub potential_slope: Vec<f64>,
}

/// Append-only list of breakpoints with non-decreasing λ.
///
/// Between two consecutive breakpoints the optimal flow is linear in λ, so the list
/// describes the whole solution path on `[first λ, last λ]` (or `[first λ, ∞)` when a
/// tail is recorded).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Breakpoints {
    points: Vec<Breakpoint>,
    tail: Option<Tail>,
    frozen: bool,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, breakpoint: Breakpoint) {
        debug_assert!(!self.frozen, "breakpoint list is frozen");
        debug_assert!(
            self.points
                .last()
                .map_or(true, |last| last.lambda <= breakpoint.lambda),
            "breakpoints must be pushed in λ order"
        );
        self.points.push(breakpoint);
    }

    pub(crate) fn set_tail(&mut self, tail: Tail) {
        self.tail = Some(tail);
    }

    /// Marks the list as final; happens when a run terminates.
    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Breakpoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[Breakpoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&Breakpoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Breakpoint> {
        self.points.last()
    }

    pub fn lambdas(&self) -> Vec<f64> {
        self.points.iter().map(|b| b.lambda).collect()
    }

    pub fn tail(&self) -> Option<&Tail> {
        self.tail.as_ref()
    }

    /// First breakpoint at exactly `lambda`.
    pub fn at(&self, lambda: f64) -> Option<&Breakpoint> {
        self.points.iter().find(|b| b.lambda == lambda)
    }

    /// Breakpoint closest to `lambda`; the earlier one wins a tie.
    pub fn nearest(&self, lambda: f64) -> Option<&Breakpoint> {
        self.points.iter().fold(None, |best: Option<&Breakpoint>, b| match best {
            Some(best) if (best.lambda - lambda).abs() <= (b.lambda - lambda).abs() => Some(best),
            _ => Some(b),
        })
    }

    /// Optimal flow at `lambda`, or `None` outside the computed range.
    pub fn flow_at(&self, lambda: f64) -> Option<Vec<f64>> {
        self.interpolate(lambda, |b| &b.flow, |t| &t.flow_slope)
    }

    /// Node potentials at `lambda`, or `None` outside the computed range.
    pub fn potential_at(&self, lambda: f64) -> Option<Vec<f64>> {
        self.interpolate(lambda, |b| &b.potential, |t| &t.potential_slope)
    }

    fn interpolate(
        &self,
        lambda: f64,
        values: impl Fn(&Breakpoint) -> &[f64],
        slope: impl Fn(&Tail) -> &[f64],
    ) -> Option<Vec<f64>> {
        let first = self.points.first()?;
        if lambda.is_nan() || lambda < first.lambda {
            return None;
        }
        let i = self.points.partition_point(|b| b.lambda <= lambda);
        let left = &self.points[i - 1];
        let offset = lambda - left.lambda;

        match self.points.get(i) {
            Some(right) => {
                let t = offset / (right.lambda - left.lambda);
                Some(
                    values(left)
                        .iter()
                        .zip(values(right))
                        .map(|(l, r)| l + t * (r - l))
                        .collect(),
                )
            }
            None if offset == 0.0 => Some(values(left).to_vec()),
            None => {
                let tail = self.tail.as_ref()?;
                Some(
                    values(left)
                        .iter()
                        .zip(slope(tail))
                        .map(|(v, s)| v + offset * s)
                        .collect(),
                )
            }
        }
    }
}

impl<'a> IntoIterator for &'a Breakpoints {
    type Item = &'a Breakpoint;
    type IntoIter = std::slice::Iter<'a, Breakpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
