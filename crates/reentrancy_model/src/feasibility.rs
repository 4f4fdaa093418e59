//! Per-victim admissible call counts

use crate::math::{div_u128, mul_u128};
use crate::state::{Params, Victim};

/// Call limits for one victim at one withdrawal amount
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallBound {
    /// `floor(balance / amount)`
    pub n_balance: u128,
    /// `floor(gas_budget / gas_per_call)`
    pub n_gas: u128,
    /// Detection-risk limit for this victim in isolation
    pub n_detect: u128,
    pub gas_per_call: u128,
}

impl CallBound {
    /// The binding call count: the tightest of the three limits
    pub fn binding(&self) -> u128 {
        self.n_balance.min(self.n_gas).min(self.n_detect)
    }

    /// Gas for `calls` repetitions at this amount
    pub fn gas_for(&self, calls: u128) -> u128 {
        mul_u128(calls, self.gas_per_call)
    }
}

/// Calls a single victim can absorb before cumulative risk exceeds `max_detection_risk`:
/// `floor(ln(1 - max) / ln(1 - p))`. `None` when either probability is zero, which
/// makes the detection limit vacuous.
///
/// This treats the victim as if it spent the whole risk budget alone, so it is an
/// upper bound only; the joint risk over all victims is checked by the search.
pub fn detection_call_limit(per_call_risk: f64, max_detection_risk: f64) -> Option<u128> {
    if per_call_risk <= 0.0 || max_detection_risk <= 0.0 {
        return None;
    }
    // ln_1p keeps tiny probabilities from rounding `1 - p` to 1
    let ratio = (-max_detection_risk).ln_1p() / (-per_call_risk).ln_1p();
    if !ratio.is_finite() || ratio < 0.0 {
        return Some(0);
    }
    // `as` saturates for out-of-range floats
    Some(ratio.floor() as u128)
}

/// Compute every per-victim limit. `amount` must be positive; a zero amount
/// yields a bound of zero calls.
pub fn call_bound(victim: &Victim, amount: u128, params: &Params) -> CallBound {
    let n_balance = div_u128(victim.balance, amount).unwrap_or(0);
    let gas_per_call = victim.gas_per_call(amount);
    // Free calls are not limited by gas
    let n_gas = div_u128(params.gas_budget, gas_per_call).unwrap_or(u128::MAX);
    let n_detect = detection_call_limit(params.per_call_risk, params.max_detection_risk)
        .unwrap_or(n_balance);

    CallBound {
        n_balance,
        n_gas,
        n_detect,
        gas_per_call,
    }
}

/// Admissible call count for one victim, `None` when the victim cannot take a
/// single call at this amount (which rejects the whole multi-victim candidate)
pub fn admissible_calls(victim: &Victim, amount: u128, params: &Params) -> Option<(u128, CallBound)> {
    if amount == 0 {
        return None;
    }
    let bound = call_bound(victim, amount, params);
    match bound.binding() {
        0 => None,
        n => Some((n, bound)),
    }
}
