use num_traits::Float;

/// Relative tolerance used when deciding whether two parameter values coincide.
pub const TIE_EPSILON: f64 = 1e-12;

/// Upward bias applied when locating a value among sorted breakpoints.
pub const ROUND_BIAS: f64 = 1e-12;

/// Snap threshold `max(10^abs_exp, 10^rel_exp · scale)`.
pub fn snap_threshold<T: Float>(scale: T, abs_exp: i32, rel_exp: i32) -> T {
    let ten = T::from(10.0).unwrap_or_else(T::one);
    ten.powi(abs_exp).max(ten.powi(rel_exp) * scale.abs())
}

pub fn snap_to_zero<T: Float>(value: T, threshold: T) -> T {
    if value.abs() < threshold {
        T::zero()
    } else {
        value
    }
}

/// Largest magnitude in a slice, zero if empty.
pub fn max_abs<T: Float>(values: &[T]) -> T {
    values
        .iter()
        .fold(T::zero(), |acc, v| if v.abs() > acc { v.abs() } else { acc })
}

pub fn is_close<T: Float>(a: T, b: T, rel: T, abs: T) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= abs.max(rel * a.abs().max(b.abs()))
}
