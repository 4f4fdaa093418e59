//! Safe arithmetic helpers - no unwrap, no panics

/// Add u128 with saturation at MAX
pub fn add_u128(a: u128, b: u128) -> u128 {
    a.saturating_add(b)
}

/// Multiply u128 with saturation
pub fn mul_u128(a: u128, b: u128) -> u128 {
    a.saturating_mul(b)
}

/// Divide u128, `None` if divisor is 0
pub fn div_u128(a: u128, b: u128) -> Option<u128> {
    a.checked_div(b)
}

/// Add i128 with saturation
pub fn add_i128(a: i128, b: i128) -> i128 {
    a.saturating_add(b)
}

/// Subtract i128 with saturation
pub fn sub_i128(a: i128, b: i128) -> i128 {
    a.saturating_sub(b)
}

/// Convert u128 to i128 with saturation at i128::MAX
pub fn u128_to_i128(x: u128) -> i128 {
    i128::try_from(x).unwrap_or(i128::MAX)
}

/// Exact `floor(total * weight / weight_sum)` without forming `total * weight`.
///
/// With `total = q * weight_sum + r` the quotient is `q * weight + floor(r * weight / weight_sum)`,
/// and `r * weight < weight_sum^2`, so only the weight sum needs to stay small.
pub fn mul_div_floor(total: u128, weight: u128, weight_sum: u128) -> u128 {
    let (Some(q), Some(r)) = (total.checked_div(weight_sum), total.checked_rem(weight_sum)) else {
        return 0;
    };
    add_u128(mul_u128(q, weight), mul_u128(r, weight) / weight_sum)
}

/// Round a non-negative real up to the next integer, saturating at u128::MAX.
/// NaN and negative inputs map to 0.
pub fn ceil_to_u128(x: f64) -> u128 {
    if x.is_nan() || x <= 0.0 {
        0
    } else {
        // `as` saturates for out-of-range floats
        x.ceil() as u128
    }
}

/// Probability that `calls` independent calls all go unflagged.
pub fn survival(per_call_risk: f64, calls: u128) -> f64 {
    if calls == 0 || per_call_risk <= 0.0 {
        return 1.0;
    }
    (calls as f64 * (-per_call_risk).ln_1p()).exp()
}

/// Cumulative detection risk `1 - prod_i (1 - p_i)^n_i` over `(p_i, n_i)` pairs.
pub fn cumulative_risk<I>(calls: I) -> f64
where
    I: IntoIterator<Item = (f64, u128)>,
{
    let undetected = calls
        .into_iter()
        .fold(1.0_f64, |acc, (p, n)| acc * survival(p, n));
    1.0 - undetected
}
