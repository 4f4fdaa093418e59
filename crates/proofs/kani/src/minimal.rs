//! Minimal Kani proofs using concrete values

use reentrancy_model::*;

/// A single funded victim is drained in one call when nothing else binds
#[kani::proof]
#[kani::unwind(4)]
fn concrete_single_victim_full_withdrawal() {
    let victims = [Victim::new(100, 10)];
    let params = Params {
        gas_budget: 30,
        gas_price: 1,
        max_detection_risk: 0.0,
        per_call_risk: 0.0,
        risk_weight: 0.0,
    };
    let config = SearchConfig { breakpoints: 2, max_iterations: 10 };

    let report = optimize(&victims, &params, &config);
    let best = report.ok().and_then(|r| r.outcome.into_optimal());

    match best {
        Some(r) => {
            assert_eq!(r.amounts[0], 100);
            assert_eq!(r.calls[0], 1);
            assert_eq!(r.gas_used, 10);
            assert_eq!(r.profit, 90);
        }
        None => kani::assert(false, "single victim must be feasible"),
    }
}

/// A budget below one call's base cost leaves nothing feasible
#[kani::proof]
#[kani::unwind(4)]
fn concrete_budget_below_base_cost() {
    let victims = [Victim::new(100, 10)];
    let params = Params {
        gas_budget: 9,
        gas_price: 1,
        max_detection_risk: 0.0,
        per_call_risk: 0.0,
        risk_weight: 0.0,
    };
    let config = SearchConfig { breakpoints: 2, max_iterations: 10 };

    let report = optimize(&victims, &params, &config);
    kani::assert(
        matches!(report.map(|r| r.outcome), Ok(Outcome::Infeasible)),
        "no call fits the budget",
    );
}
