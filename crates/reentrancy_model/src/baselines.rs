//! Naive reference strategies the search should never lose to

use crate::helpers::evaluate_allocation;
use crate::state::*;

/// One call per victim withdrawing the whole balance.
/// `None` when the strategy breaks a budget.
pub fn sequential_baseline(victims: &[Victim], params: &Params) -> Option<OptimizationResult> {
    let amounts: Vec<u128> = victims.iter().map(|v| v.balance).collect();
    let calls = vec![1u128; victims.len()];
    evaluate_allocation(victims, &amounts, &calls, params).ok()
}

/// `splits` equal withdrawals per victim of `floor(balance / splits)` each.
/// `None` when the strategy breaks a budget or `splits` is zero.
pub fn equal_split_baseline(
    victims: &[Victim],
    params: &Params,
    splits: u128,
) -> Option<OptimizationResult> {
    if splits == 0 {
        return None;
    }
    let amounts: Vec<u128> = victims.iter().map(|v| v.balance / splits).collect();
    let calls = vec![splits; victims.len()];
    evaluate_allocation(victims, &amounts, &calls, params).ok()
}
