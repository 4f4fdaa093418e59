//! Allocation search over the breakpoint grid
//!
//! Every victim gets a schedule of candidate withdrawal amounts
//! (`balance / 1`, `balance / 2`, ...). The search walks the Cartesian product
//! of the schedules in nested order, derives the admissible call count for each
//! victim, re-checks the joint gas and risk budgets and keeps the candidate
//! with the highest utility.
//!
//! This is a heuristic grid search, not an exact solver: it only sees amounts on
//! the schedule, and it stops after `max_iterations` candidates. When the cap
//! is hit the best candidate found so far is returned and
//! [`SearchStats::truncated`] is set; callers that need the full grid must raise
//! the cap.

use crate::error::Result;
use crate::feasibility::admissible_calls;
use crate::helpers::tally;
use crate::state::*;

/// Candidate amounts for one victim: `balance / (k + 1)` for `k in [0, resolution)`.
///
/// The schedule is non-increasing, so zero amounts (which would never divide the
/// balance) end it and repeated amounts are always adjacent and collapsed.
pub fn breakpoints(balance: u128, resolution: usize) -> Vec<u128> {
    let mut schedule: Vec<u128> = Vec::with_capacity(resolution);
    for k in 0..resolution {
        let amount = balance / (k as u128 + 1);
        if amount == 0 {
            break;
        }
        if schedule.last() != Some(&amount) {
            schedule.push(amount);
        }
    }
    schedule
}

/// Find the best feasible allocation on the breakpoint grid.
///
/// Fails only on malformed input. An empty feasible set is `Outcome::Infeasible`.
pub fn optimize(victims: &[Victim], params: &Params, config: &SearchConfig) -> Result<SearchReport> {
    validate_victims(victims)?;
    params.validate()?;
    config.validate()?;

    let schedules: PerVictim<Vec<u128>> = victims
        .iter()
        .map(|v| breakpoints(v.balance, config.breakpoints))
        .collect();

    let mut stats = SearchStats {
        grid_size: schedules.iter().fold(1usize, |acc, s| acc.saturating_mul(s.len())),
        ..SearchStats::default()
    };

    if stats.grid_size == 0 {
        log::debug!("empty breakpoint grid: some victim has no positive amount");
        return Ok(SearchReport {
            outcome: Outcome::Infeasible,
            stats,
        });
    }

    let mut cursor: PerVictim<usize> = victims.iter().map(|_| 0).collect();
    let mut best: Option<OptimizationResult> = None;

    loop {
        if stats.candidates_evaluated >= config.max_iterations {
            stats.truncated = true;
            break;
        }
        stats.candidates_evaluated += 1;

        if let Some(candidate) = evaluate_candidate(victims, &schedules, &cursor, params) {
            stats.feasible_candidates += 1;
            // Strict comparison: the first candidate seen wins ties
            if best.as_ref().map_or(true, |b| candidate.utility > b.utility) {
                log::trace!(
                    "new best: amounts={:?} calls={:?} profit={} risk={:.4} utility={:.4e}",
                    candidate.amounts,
                    candidate.calls,
                    candidate.profit,
                    candidate.detection_risk,
                    candidate.utility
                );
                best = Some(candidate);
            }
        }

        if !advance(&mut cursor, &schedules) {
            break;
        }
    }

    if stats.truncated {
        log::debug!(
            "search truncated after {} of {} candidates",
            stats.candidates_evaluated,
            stats.grid_size
        );
    }

    let outcome = match best {
        Some(r) => Outcome::Optimal(r),
        None => Outcome::Infeasible,
    };
    Ok(SearchReport { outcome, stats })
}

/// Score one amount vector, `None` if any victim admits no call or a joint
/// budget is exceeded
fn evaluate_candidate(
    victims: &[Victim],
    schedules: &[Vec<u128>],
    cursor: &[usize],
    params: &Params,
) -> Option<OptimizationResult> {
    let mut amounts = PerVictim::new();
    let mut calls = PerVictim::new();
    let mut gas_per_call: PerVictim<u128> = PerVictim::new();

    for ((victim, schedule), k) in victims.iter().zip(schedules).zip(cursor) {
        let amount = *schedule.get(*k)?;
        // All-or-nothing: one victim without a call rejects the whole candidate
        let (n, bound) = admissible_calls(victim, amount, params)?;
        amounts.push(amount);
        calls.push(n);
        gas_per_call.push(bound.gas_per_call);
    }

    // Per-victim limits assume each victim has the whole budget to itself
    let legs = amounts
        .iter()
        .zip(calls.iter())
        .zip(gas_per_call.iter())
        .map(|((a, n), g)| (*a, *n, *g));
    let t = tally(legs, params);

    if t.gas_used > params.gas_budget || t.detection_risk > params.max_detection_risk {
        return None;
    }
    Some(t.into_result(amounts, calls))
}

/// Step the odometer, last victim fastest. `false` once the grid is exhausted.
fn advance(cursor: &mut [usize], schedules: &[Vec<u128>]) -> bool {
    for (k, schedule) in cursor.iter_mut().zip(schedules).rev() {
        *k += 1;
        if *k < schedule.len() {
            return true;
        }
        *k = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::helpers::satisfies_invariants;

    const ETH: u128 = 1_000_000_000_000_000_000;
    const GWEI: u128 = 1_000_000_000;

    fn scenario_params() -> Params {
        Params {
            gas_budget: 3_000_000,
            gas_price: 10 * GWEI,
            max_detection_risk: 0.3,
            per_call_risk: 0.02,
            risk_weight: 1e21,
        }
    }

    #[test]
    fn test_breakpoints_schedule() {
        assert_eq!(breakpoints(600, 4), vec![600, 300, 200, 150]);
        // duplicates collapse, zeros end the schedule
        assert_eq!(breakpoints(5, 10), vec![5, 2, 1]);
        assert!(breakpoints(0, 30).is_empty());
        assert_eq!(breakpoints(100 * ETH, 30).len(), 30);
    }

    #[test]
    fn test_advance_nested_order() {
        let schedules = vec![vec![1, 2], vec![1, 2, 3]];
        let mut cursor = vec![0, 0];
        let mut seen = vec![cursor.clone()];
        while advance(&mut cursor, &schedules) {
            seen.push(cursor.clone());
        }
        assert_eq!(
            seen,
            vec![vec![0, 0], vec![0, 1], vec![0, 2], vec![1, 0], vec![1, 1], vec![1, 2]]
        );
    }

    #[test]
    fn test_equal_balances_low_risk() {
        let victims = vec![Victim::new(100 * ETH, 30_000); 3];
        let params = scenario_params();
        let report = optimize(&victims, &params, &SearchConfig::default()).unwrap();

        let r = report.outcome.optimal().expect("scenario must be feasible");
        assert!(r.detection_risk <= 0.3);
        assert!(r.profit > 0);
        assert!(satisfies_invariants(&victims, r, &params));

        // Every extra call costs gas and risk without extracting more capital
        assert_eq!(r.amounts.as_slice(), &[100 * ETH; 3]);
        assert_eq!(r.calls.as_slice(), &[1; 3]);
        assert_eq!(r.gas_used, 90_000);

        // 27_000 grid points against a 5_000 cap
        assert!(report.stats.truncated);
        assert_eq!(report.stats.candidates_evaluated, DEFAULT_MAX_ITERATIONS);
        assert_eq!(report.stats.grid_size, 27_000);
    }

    #[test]
    fn test_full_grid_not_truncated() {
        let victims = vec![Victim::new(100 * ETH, 30_000); 2];
        let report = optimize(&victims, &scenario_params(), &SearchConfig::default()).unwrap();
        assert!(!report.stats.truncated);
        assert_eq!(report.stats.candidates_evaluated, 900);
        assert!(report.stats.feasible_candidates > 0);
    }

    #[test]
    fn test_tiny_gas_budget_is_infeasible() {
        let victims = vec![Victim::new(100 * ETH, 30_000); 3];
        let params = Params { gas_budget: 1, ..scenario_params() };
        let report = optimize(&victims, &params, &SearchConfig::default()).unwrap();
        assert_eq!(report.outcome, Outcome::Infeasible);
        assert_eq!(report.stats.feasible_candidates, 0);
    }

    #[test]
    fn test_zero_balance_is_infeasible() {
        let victims = vec![Victim::new(0, 30_000)];
        let report = optimize(&victims, &scenario_params(), &SearchConfig::default()).unwrap();
        assert_eq!(report.outcome, Outcome::Infeasible);
        assert_eq!(report.stats.grid_size, 0);
        assert_eq!(report.stats.candidates_evaluated, 0);
    }

    #[test]
    fn test_one_drained_victim_sinks_the_candidate() {
        let victims = vec![Victim::new(100 * ETH, 30_000), Victim::new(0, 30_000)];
        let report = optimize(&victims, &scenario_params(), &SearchConfig::default()).unwrap();
        assert!(!report.outcome.is_feasible());
    }

    #[test]
    fn test_first_seen_wins_ties() {
        // No gas cost, no risk: every divisor of 60 extracts the full balance
        let victims = vec![Victim::new(60, 1); 2];
        let params = Params {
            gas_budget: 1_000_000,
            gas_price: 0,
            max_detection_risk: 0.0,
            per_call_risk: 0.0,
            risk_weight: 0.0,
        };
        let config = SearchConfig { breakpoints: 6, max_iterations: 1_000 };
        let report = optimize(&victims, &params, &config).unwrap();
        let r = report.outcome.optimal().unwrap();

        assert_eq!(report.stats.feasible_candidates, 36);
        assert_eq!(r.profit, 120);
        assert_eq!(r.amounts.as_slice(), &[60, 60]);
        assert_eq!(r.calls.as_slice(), &[1, 1]);
    }

    #[test]
    fn test_vacuous_detection_governed_by_gas_and_capital() {
        let victims = vec![Victim::new(60, 10); 2];
        let params = Params {
            gas_budget: 1_000,
            gas_price: 0,
            max_detection_risk: 0.0,
            per_call_risk: 0.0,
            risk_weight: 1e9,
        };
        let report = optimize(&victims, &params, &SearchConfig::default()).unwrap();
        let r = report.outcome.optimal().unwrap();
        assert_eq!(r.detection_risk, 0.0);
        assert_eq!(r.utility, r.profit as f64);
        assert_eq!(r.profit, 120);
        assert!(satisfies_invariants(&victims, r, &params));
    }

    #[test]
    fn test_negligible_per_call_risk_matches_zero_risk() {
        let victims = vec![Victim::new(100 * ETH, 30_000); 3];
        let riskless = Params { per_call_risk: 0.0, ..scenario_params() };
        let negligible = Params { per_call_risk: 1e-17, ..scenario_params() };

        let a = optimize(&victims, &riskless, &SearchConfig::default()).unwrap();
        let b = optimize(&victims, &negligible, &SearchConfig::default()).unwrap();
        let a = a.outcome.optimal().expect("riskless scenario is feasible");
        let b = b.outcome.optimal().expect("negligible risk must stay feasible");

        assert_eq!(a.amounts, b.amounts);
        assert_eq!(a.calls, b.calls);
        assert_eq!(a.profit, b.profit);
        assert_eq!(a.gas_used, b.gas_used);
        assert!(b.detection_risk < 1e-15);
    }

    #[test]
    fn test_tight_risk_budget_is_infeasible() {
        // One call per victim already costs 1 - 0.98^3 > 0.05
        let victims = vec![Victim::new(100 * ETH, 30_000); 3];
        let params = Params { max_detection_risk: 0.05, ..scenario_params() };
        let report = optimize(&victims, &params, &SearchConfig::default()).unwrap();
        assert_eq!(report.outcome, Outcome::Infeasible);
    }

    #[test]
    fn test_configuration_errors() {
        let p = scenario_params();
        let cfg = SearchConfig::default();

        assert_eq!(optimize(&[], &p, &cfg), Err(ModelError::NoVictims));

        let victims = vec![Victim::new(ETH, 30_000)];
        let zero_budget = Params { gas_budget: 0, ..p.clone() };
        assert_eq!(optimize(&victims, &zero_budget, &cfg), Err(ModelError::NonPositiveGasBudget));

        let bad_cfg = SearchConfig { breakpoints: 30, max_iterations: 0 };
        assert!(matches!(
            optimize(&victims, &p, &bad_cfg),
            Err(ModelError::EmptySearchGrid { .. })
        ));
    }

    #[test]
    fn test_risk_weight_changes_winner() {
        // Marginal gas makes a full withdrawal unaffordable: 100 + 1 > 60.
        // Without risk aversion 4 calls of 14 win (56); at weight 100 a single
        // call of 50 wins (50 - 10 against 56 - 34.4).
        let victims = vec![Victim::new(100, 1).with_marginal_cost(1.0)];
        let neutral = Params {
            gas_budget: 60,
            gas_price: 0,
            max_detection_risk: 0.9,
            per_call_risk: 0.1,
            risk_weight: 0.0,
        };
        let averse = Params { risk_weight: 100.0, ..neutral.clone() };

        let a = optimize(&victims, &neutral, &SearchConfig::default()).unwrap();
        let a = a.outcome.optimal().unwrap();
        assert_eq!(a.amounts.as_slice(), &[14]);
        assert_eq!(a.calls.as_slice(), &[4]);
        assert_eq!(a.profit, 56);
        assert_eq!(a.gas_used, 60);

        let b = optimize(&victims, &averse, &SearchConfig::default()).unwrap();
        let b = b.outcome.optimal().unwrap();
        assert_eq!(b.amounts.as_slice(), &[50]);
        assert_eq!(b.calls.as_slice(), &[1]);
        assert!(satisfies_invariants(&victims, b, &averse));
    }
}
