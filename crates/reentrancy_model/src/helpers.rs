//! Scoring and invariant checking helpers

use crate::math::*;
use crate::state::*;

/// Constraint an explicit allocation fails
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Violation {
    /// Amount or call vector length differs from the victim count
    Shape { victims: usize, amounts: usize, calls: usize },
    /// A victim is skipped; strategies are all-or-nothing
    ZeroCalls { victim: usize },
    /// `amount * calls > balance`
    Capital { victim: usize },
    /// Joint gas over budget
    Gas,
    /// Joint cumulative detection risk over the limit
    Risk,
}

/// Aggregates of one allocation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tally {
    pub gas_used: u128,
    pub detection_risk: f64,
    pub profit: i128,
    pub utility: f64,
}

/// Joint gas, cumulative risk, profit and utility of `(amount, calls, gas_per_call)` triples
pub fn tally<I>(legs: I, params: &Params) -> Tally
where
    I: IntoIterator<Item = (u128, u128, u128)>,
{
    let mut gas_used = 0u128;
    let mut profit = 0i128;
    let mut undetected = 1.0_f64;

    for (amount, calls, gas_per_call) in legs {
        let gas = mul_u128(calls, gas_per_call);
        let extracted = mul_u128(amount, calls);
        let gas_cost = mul_u128(params.gas_price, gas);

        gas_used = add_u128(gas_used, gas);
        undetected *= survival(params.per_call_risk, calls);
        profit = add_i128(profit, sub_i128(u128_to_i128(extracted), u128_to_i128(gas_cost)));
    }

    // Same fold order as `cumulative_risk`, so re-checks agree bit for bit
    let detection_risk = 1.0 - undetected;
    let utility = profit as f64 - params.risk_weight * detection_risk;

    Tally {
        gas_used,
        detection_risk,
        profit,
        utility,
    }
}

impl Tally {
    pub fn into_result(self, amounts: PerVictim<u128>, calls: PerVictim<u128>) -> OptimizationResult {
        OptimizationResult {
            amounts,
            calls,
            profit: self.profit,
            gas_used: self.gas_used,
            detection_risk: self.detection_risk,
            utility: self.utility,
        }
    }
}

/// Score an explicit allocation, checking every constraint the search enforces
pub fn evaluate_allocation(
    victims: &[Victim],
    amounts: &[u128],
    calls: &[u128],
    params: &Params,
) -> Result<OptimizationResult, Violation> {
    if amounts.len() != victims.len() || calls.len() != victims.len() {
        return Err(Violation::Shape {
            victims: victims.len(),
            amounts: amounts.len(),
            calls: calls.len(),
        });
    }

    for (i, ((v, a), n)) in victims.iter().zip(amounts).zip(calls).enumerate() {
        if *n == 0 || *a == 0 {
            return Err(Violation::ZeroCalls { victim: i });
        }
        if a.checked_mul(*n).map_or(true, |total| total > v.balance) {
            return Err(Violation::Capital { victim: i });
        }
    }

    let legs = victims
        .iter()
        .zip(amounts)
        .zip(calls)
        .map(|((v, a), n)| (*a, *n, v.gas_per_call(*a)));
    let t = tally(legs, params);

    if t.gas_used > params.gas_budget {
        return Err(Violation::Gas);
    }
    if t.detection_risk > params.max_detection_risk {
        return Err(Violation::Risk);
    }

    Ok(t.into_result(amounts.to_vec(), calls.to_vec()))
}

/// Capital: `amount_i * calls_i <= balance_i` for every victim
pub fn capital_ok(victims: &[Victim], r: &OptimizationResult) -> bool {
    victims.len() == r.amounts.len()
        && victims.len() == r.calls.len()
        && victims
            .iter()
            .zip(r.amounts.iter().zip(r.calls.iter()))
            .all(|(v, (a, n))| a.checked_mul(*n).map_or(false, |total| total <= v.balance))
}

/// Joint gas recomputed from the victims' cost model
pub fn gas_ok(victims: &[Victim], r: &OptimizationResult, params: &Params) -> bool {
    let gas = victims
        .iter()
        .zip(r.amounts.iter().zip(r.calls.iter()))
        .fold(0u128, |acc, (v, (a, n))| add_u128(acc, mul_u128(*n, v.gas_per_call(*a))));
    gas == r.gas_used && gas <= params.gas_budget
}

/// Joint cumulative detection risk recomputed from the call counts
pub fn risk_ok(r: &OptimizationResult, params: &Params) -> bool {
    let risk = cumulative_risk(r.calls.iter().map(|n| (params.per_call_risk, *n)));
    risk <= params.max_detection_risk && (0.0..1.0).contains(&risk)
}

/// Every victim contributes at least one call
pub fn all_victims_called(r: &OptimizationResult) -> bool {
    r.calls.iter().all(|n| *n > 0) && r.amounts.iter().all(|a| *a > 0)
}

/// Capital, joint gas, joint risk and all-or-nothing hold
pub fn satisfies_invariants(victims: &[Victim], r: &OptimizationResult, params: &Params) -> bool {
    capital_ok(victims, r) && gas_ok(victims, r, params) && risk_ok(r, params) && all_victims_called(r)
}
