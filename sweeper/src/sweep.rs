//! Parameter grid expansion and single-run execution

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use reentrancy_model::{
    distribute, optimize, DistributionShape, OptimizationResult, Outcome, Params, SearchConfig,
    SearchStats, Victim,
};
use serde::Serialize;

use crate::config::SweepConfig;
use crate::stats::RunCounters;

const WEI_PER_ETH: f64 = 1e18;

/// Probabilities handed to the harness are 1e18-scaled integers
const PROBABILITY_SCALE: f64 = 1e18;

/// `eth * 1e18`, rounded; negative and NaN inputs map to zero
pub fn eth_to_wei(eth: f64) -> u128 {
    (eth * WEI_PER_ETH).round() as u128
}

fn scale_probability(p: f64) -> u128 {
    (p * PROBABILITY_SCALE) as u128
}

/// Settings shared by every run of a sweep
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub max_evm_gas: u128,
    pub gas_base_cost: u128,
    pub gas_marginal_cost: f64,
    pub search: SearchConfig,
}

/// One point of the sweep grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSpec {
    pub index: usize,
    pub run_id: String,
    pub victim_count: usize,
    pub distribution: DistributionShape,
    pub total_balance: u128,
    pub gas_price: u128,
    pub per_call_risk: f64,
    pub max_detection_risk: f64,
    /// Requested budget, before the EVM ceiling
    pub gas_budget: u128,
    pub risk_weight: f64,
}

impl RunSpec {
    pub fn params(&self, max_evm_gas: u128) -> Params {
        Params {
            gas_budget: self.gas_budget.min(max_evm_gas),
            gas_price: self.gas_price,
            max_detection_risk: self.max_detection_risk,
            per_call_risk: self.per_call_risk,
            risk_weight: self.risk_weight,
        }
    }

    pub fn short_id(&self) -> &str {
        self.run_id.get(..8).unwrap_or(&self.run_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunStatus {
    /// A feasible allocation was found
    Completed {
        result: OptimizationResult,
        stats: SearchStats,
    },
    /// The grid held no feasible allocation
    Skipped { stats: SearchStats },
    /// The model rejected the inputs
    Failed { error: String },
}

/// Outcome of one run, written as a JSON line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    #[serde(flatten)]
    pub spec: RunSpec,
    pub balances: Vec<u128>,
    #[serde(flatten)]
    pub status: RunStatus,
    /// Variables an external harness reads to replay the allocation
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl RunRecord {
    pub fn result(&self) -> Option<&OptimizationResult> {
        match &self.status {
            RunStatus::Completed { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Cartesian product of the configured lists, last list varying fastest:
/// victim counts, shapes, totals, gas prices, per-call risks, max risks,
/// gas budgets, risk weights
pub fn expand_grid(config: &SweepConfig) -> Vec<RunSpec> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let totals = config.total_balances_wei();
    let mut specs = Vec::with_capacity(config.grid_size());

    for &victim_count in &config.victim_counts {
        for &distribution in &config.distributions {
            for &total_balance in &totals {
                for &gas_price in &config.gas_prices {
                    for &per_call_risk in &config.per_call_risks {
                        for &max_detection_risk in &config.max_detection_risks {
                            for &gas_budget in &config.gas_budgets {
                                for &risk_weight in &config.risk_weights {
                                    specs.push(RunSpec {
                                        index: specs.len(),
                                        run_id: format_run_id(rng.gen()),
                                        victim_count,
                                        distribution,
                                        total_balance,
                                        gas_price: u128::from(gas_price),
                                        per_call_risk,
                                        max_detection_risk,
                                        gas_budget: u128::from(gas_budget),
                                        risk_weight,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    specs
}

/// Render 128 random bits in the 8-4-4-4-12 hex layout
fn format_run_id(bits: u128) -> String {
    let hex = format!("{:032x}", bits);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Distribute the total, build the victims and search. Never fails: model
/// errors become `RunStatus::Failed`.
pub fn execute(spec: RunSpec, settings: &RunSettings) -> RunRecord {
    let balances = match distribute(spec.victim_count, spec.distribution, spec.total_balance) {
        Ok(balances) => balances,
        Err(e) => {
            return RunRecord {
                spec,
                balances: Vec::new(),
                status: RunStatus::Failed { error: e.to_string() },
                env: BTreeMap::new(),
            }
        }
    };

    let victims: Vec<Victim> = balances
        .iter()
        .map(|b| Victim::new(*b, settings.gas_base_cost).with_marginal_cost(settings.gas_marginal_cost))
        .collect();
    let params = spec.params(settings.max_evm_gas);

    let status = match optimize(&victims, &params, &settings.search) {
        Ok(report) => match report.outcome {
            Outcome::Optimal(result) => RunStatus::Completed {
                result,
                stats: report.stats,
            },
            Outcome::Infeasible => RunStatus::Skipped { stats: report.stats },
        },
        Err(e) => RunStatus::Failed { error: e.to_string() },
    };

    let mut record = RunRecord {
        spec,
        balances,
        status,
        env: BTreeMap::new(),
    };
    record.env = harness_env(&record).unwrap_or_default();
    record
}

/// Environment for replaying a completed run; `None` for runs with no allocation
pub fn harness_env(record: &RunRecord) -> Option<BTreeMap<String, String>> {
    let result = record.result()?;
    let spec = &record.spec;
    let join = |values: &[u128]| {
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    };

    let mut env = BTreeMap::new();
    env.insert("TEST_UUID".to_string(), spec.run_id.clone());
    env.insert("VICTIM_COUNT".to_string(), spec.victim_count.to_string());
    env.insert("DISTRIBUTION".to_string(), spec.distribution.to_string());
    env.insert("ALPHA".to_string(), scale_probability(spec.per_call_risk).to_string());
    env.insert("DELTA".to_string(), scale_probability(spec.max_detection_risk).to_string());
    env.insert("GAS_PRICE".to_string(), spec.gas_price.to_string());
    env.insert("GAS_BUDGET".to_string(), spec.gas_budget.to_string());
    env.insert("TOTAL_BALANCE".to_string(), spec.total_balance.to_string());
    env.insert("AMOUNTS".to_string(), join(&result.amounts));
    env.insert("CALLS".to_string(), join(&result.calls));
    env.insert("LAMBDA_RISK".to_string(), format!("{:e}", spec.risk_weight));
    for (i, balance) in record.balances.iter().enumerate() {
        env.insert(format!("VICTIM_BALANCE_{}", i), balance.to_string());
    }

    Some(env)
}

/// Run every spec on the blocking pool with at most `max_in_flight` searches
/// in progress, handing records to `on_record` in completion order
pub async fn run_sweep<F>(
    specs: Vec<RunSpec>,
    settings: &RunSettings,
    counters: &Arc<RunCounters>,
    max_in_flight: usize,
    mut on_record: F,
) -> Result<()>
where
    F: FnMut(RunRecord) -> Result<()>,
{
    let mut runs = stream::iter(specs)
        .map(|spec| {
            let settings = settings.clone();
            let counters = Arc::clone(counters);
            tokio::task::spawn_blocking(move || {
                let record = execute(spec, &settings);
                counters.record(&record.status);
                record
            })
        })
        .buffer_unordered(max_in_flight.max(1));

    while let Some(joined) = runs.next().await {
        match joined {
            Ok(record) => on_record(record)?,
            Err(e) => {
                log::error!("Sweep task aborted: {}", e);
                counters.record_failed();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETH: u128 = 1_000_000_000_000_000_000;

    fn small_config() -> SweepConfig {
        SweepConfig {
            victim_counts: vec![2, 3],
            distributions: vec![DistributionShape::Equal],
            total_balances_eth: vec![100.0],
            gas_prices: vec![10_000],
            per_call_risks: vec![0.05],
            max_detection_risks: vec![0.02, 0.5],
            gas_budgets: vec![20_000_000],
            risk_weights: vec![1e21],
            breakpoints: 5,
            max_iterations: 200,
            max_in_flight: 2,
            ..SweepConfig::default_grid()
        }
    }

    #[test]
    fn test_expand_grid_order_and_ids() {
        let config = SweepConfig::default_grid();
        let specs = expand_grid(&config);
        assert_eq!(specs.len(), config.grid_size());

        // risk weight varies fastest
        assert_eq!(specs[0].risk_weight, 1e20);
        assert_eq!(specs[1].risk_weight, 1e21);
        assert_eq!(specs[3].gas_budget, 5_000_000);
        assert_eq!(specs[0].victim_count, 2);
        assert_eq!(specs.last().map(|s| s.victim_count), Some(3));

        assert!(specs.iter().enumerate().all(|(i, s)| s.index == i));
        assert_eq!(specs[0].run_id.len(), 36);
        assert_ne!(specs[0].run_id, specs[1].run_id);

        // same seed, same ids
        assert_eq!(expand_grid(&config)[7].run_id, specs[7].run_id);
    }

    #[test]
    fn test_budget_clamped_to_evm_ceiling() {
        let specs = expand_grid(&small_config());
        let params = specs[0].params(10_000_000);
        assert_eq!(params.gas_budget, 10_000_000);
        assert_eq!(specs[0].gas_budget, 20_000_000);
    }

    #[test]
    fn test_execute_completed_run_exports_env() {
        let config = small_config();
        let spec = expand_grid(&config).remove(1);
        assert_eq!(spec.max_detection_risk, 0.5);

        let record = execute(spec, &config.run_settings());
        let result = record.result().expect("two equal victims at 50% max risk are feasible");
        assert_eq!(record.balances, vec![50 * ETH, 50 * ETH]);
        assert_eq!(result.amounts.as_slice(), &[50 * ETH, 50 * ETH]);

        let env = &record.env;
        assert_eq!(env["VICTIM_COUNT"], "2");
        assert_eq!(env["DISTRIBUTION"], "equal");
        assert_eq!(env["DELTA"], "500000000000000000");
        assert_eq!(env["GAS_BUDGET"], "20000000");
        assert_eq!(env["AMOUNTS"], format!("{},{}", 50 * ETH, 50 * ETH));
        assert_eq!(env["CALLS"], "1,1");
        assert_eq!(env["LAMBDA_RISK"], "1e21");
        assert_eq!(env["VICTIM_BALANCE_1"], (50 * ETH).to_string());
        assert_eq!(env["TEST_UUID"], record.spec.run_id);
    }

    #[test]
    fn test_execute_infeasible_run_is_skipped() {
        let config = small_config();
        // 2% max risk cannot absorb two calls at 5% each
        let spec = expand_grid(&config).remove(0);
        let record = execute(spec, &config.run_settings());
        assert!(matches!(record.status, RunStatus::Skipped { .. }));
        assert!(record.env.is_empty());
        assert!(harness_env(&record).is_none());
    }

    #[test]
    fn test_execute_invalid_params_fail() {
        let config = small_config();
        let mut spec = expand_grid(&config).remove(0);
        spec.per_call_risk = 1.5;
        let record = execute(spec, &config.run_settings());
        assert!(matches!(record.status, RunStatus::Failed { .. }));

        let mut spec = expand_grid(&config).remove(0);
        spec.victim_count = 0;
        let record = execute(spec, &config.run_settings());
        assert!(matches!(record.status, RunStatus::Failed { .. }));
        assert!(record.balances.is_empty());
    }

    #[test]
    fn test_record_serializes_as_json_line() {
        let config = small_config();
        let record = execute(expand_grid(&config).remove(1), &config.run_settings());
        let line = serde_json::to_string(&record).unwrap();
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["victim_count"], 2);
        assert!(value["result"]["amounts"].is_array());
    }

    #[test]
    fn test_eth_to_wei() {
        assert_eq!(eth_to_wei(1.0), ETH);
        assert_eq!(eth_to_wei(0.5), ETH / 2);
        assert_eq!(eth_to_wei(-1.0), 0);
        assert_eq!(eth_to_wei(f64::NAN), 0);
    }

    #[tokio::test]
    async fn test_run_sweep_visits_every_spec() {
        let config = small_config();
        let specs = expand_grid(&config);
        let counters = Arc::new(RunCounters::new(specs.len()));

        let mut seen = Vec::new();
        run_sweep(specs, &config.run_settings(), &counters, config.max_in_flight, |record| {
            seen.push(record.spec.index);
            Ok(())
        })
        .await
        .unwrap();

        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);

        let tally = counters.snapshot();
        assert_eq!(tally.finished(), 4);
        assert_eq!(tally.skipped, 2);
        assert_eq!(tally.completed, 2);
        assert_eq!(tally.failed, 0);
    }
}
