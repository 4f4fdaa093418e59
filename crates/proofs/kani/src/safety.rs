//! Kani safety proofs for the allocation constraints

use kani::{any, assume};
use reentrancy_model::helpers::*;
use reentrancy_model::math::mul_div_floor;
use reentrancy_model::*;

use crate::{generators::*, sanitizer::*};

/// Capital and gas: admissible call counts never overdraw the victim or the budget
#[kani::proof]
fn admissible_calls_respect_capital_and_gas() {
    let v = any_victim();
    let p = any_params();
    let amount = any_amount();

    if let Some((n, bound)) = admissible_calls(&v, amount, &p) {
        kani::assert(n > 0, "admissible count is positive");
        kani::assert(n * amount <= v.balance, "capital: n * amount <= balance");
        kani::assert(bound.gas_for(n) <= p.gas_budget, "gas: n * gas_per_call <= budget");
    }
}

/// Share rounding: `floor(total * w / s)` never exceeds the exact share and
/// falls short by less than one unit
#[kani::proof]
fn mul_div_floor_is_exact_floor() {
    let total: u32 = any();
    let weight: u16 = any();
    let weight_sum: u16 = any();
    assume(weight_sum > 0 && weight <= weight_sum);

    let (t, w, s) = (total as u128, weight as u128, weight_sum as u128);
    let share = mul_div_floor(t, w, s);

    kani::assert(share * s <= t * w, "share never exceeds exact value");
    kani::assert((share + 1) * s > t * w, "share is the floor");
}

/// Distribution: deterministic shapes never hand out more than the total
#[kani::proof]
#[kani::unwind(5)]
fn deterministic_shapes_conserve_total() {
    let total: u32 = any();
    let count: u8 = any();
    let victim_count = (count % 3) as usize + 1;
    let shape = if any::<bool>() {
        DistributionShape::Equal
    } else {
        DistributionShape::Pyramid
    };

    if let Ok(balances) = distribute(victim_count, shape, total as u128) {
        let sum: u128 = balances.iter().sum();
        kani::assert(balances.len() == victim_count, "one balance per victim");
        kani::assert(sum <= total as u128, "sum never exceeds total");
        kani::assert(total as u128 - sum < victim_count as u128, "shortfall below victim count");
    }
}

/// Breakpoints are positive, bounded by the balance and strictly decreasing
#[kani::proof]
#[kani::unwind(6)]
fn breakpoints_are_bounded_and_decreasing() {
    let v = any_victim();
    let resolution_raw: u8 = any();
    let resolution = (resolution_raw as usize % MAX_RESOLUTION) + 1;

    let schedule = breakpoints(v.balance, resolution);

    kani::assert(schedule.len() <= resolution, "at most one breakpoint per step");
    for (i, amount) in schedule.iter().enumerate() {
        kani::assert(*amount > 0, "zero amounts end the schedule");
        kani::assert(*amount <= v.balance, "breakpoint within balance");
        if i > 0 {
            kani::assert(*amount < schedule[i - 1], "strictly decreasing");
        }
    }
}

/// Scoring: any allocation the evaluator accepts satisfies every invariant
#[kani::proof]
#[kani::unwind(3)]
fn accepted_allocations_satisfy_invariants() {
    let victims = any_victims();
    let p = any_params();
    let amounts = [any_amount(), any_amount()];
    let calls_raw: [u8; N_VICTIMS] = any();
    let calls = calls_raw.map(|n| (n % 4) as u128);

    if let Ok(r) = evaluate_allocation(&victims, &amounts, &calls, &p) {
        kani::assert(capital_ok(&victims, &r), "capital holds");
        kani::assert(gas_ok(&victims, &r, &p), "joint gas holds");
        kani::assert(all_victims_called(&r), "every victim is called");
    }
}
