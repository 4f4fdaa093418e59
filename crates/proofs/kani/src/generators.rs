//! Generators for arbitrary model inputs (for Kani)

#[cfg(kani)]
use kani::any;
#[cfg(kani)]
use reentrancy_model::{Params, Victim};

#[cfg(kani)]
use crate::sanitizer::*;

#[cfg(kani)]
pub fn any_victim() -> Victim {
    let balance_raw: u16 = any();
    let gas_base_raw: u8 = any();

    Victim::new(balance_raw as u128, gas_base_raw as u128).sanitize()
}

/// Detection is kept vacuous: the proofs target the integer constraints,
/// the float risk fold is covered by the property tests
#[cfg(kani)]
pub fn any_params() -> Params {
    let budget_raw: u16 = any();
    let price_raw: u8 = any();

    Params {
        gas_budget: budget_raw as u128,
        gas_price: price_raw as u128,
        max_detection_risk: 0.0,
        per_call_risk: 0.0,
        risk_weight: 0.0,
    }
    .sanitize()
}

#[cfg(kani)]
pub fn any_amount() -> u128 {
    let raw: u16 = any();
    (raw as u128 % MAX_BALANCE).max(1)
}

#[cfg(kani)]
pub fn any_victims() -> Vec<Victim> {
    (0..N_VICTIMS).map(|_| any_victim()).collect()
}
