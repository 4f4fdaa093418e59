//! Sweep configuration

use anyhow::{ensure, Context, Result};
use reentrancy_model::{DistributionShape, SearchConfig};
use serde::{Deserialize, Serialize};

use crate::sweep::{eth_to_wei, RunSettings};

/// Read when `SWEEP_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "sweep-config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Victim counts to sweep
    pub victim_counts: Vec<usize>,

    /// Balance shapes to sweep
    pub distributions: Vec<DistributionShape>,

    /// Total balance across victims, in ETH
    pub total_balances_eth: Vec<f64>,

    /// Gas prices (wei per gas)
    pub gas_prices: Vec<u64>,

    /// Per-call detection probabilities
    pub per_call_risks: Vec<f64>,

    /// Cumulative detection limits
    pub max_detection_risks: Vec<f64>,

    /// Requested gas budgets, clamped to `max_evm_gas`
    pub gas_budgets: Vec<u64>,

    /// Risk weights (wei per unit of cumulative risk)
    pub risk_weights: Vec<f64>,

    /// Hard ceiling on any single gas budget
    pub max_evm_gas: u64,

    /// Fixed gas per call for every generated victim
    pub gas_base_cost: u64,

    /// Gas per wei withdrawn for every generated victim
    pub gas_marginal_cost: f64,

    /// Breakpoints per victim
    pub breakpoints: usize,

    /// Candidate cap per run
    pub max_iterations: usize,

    /// Optimizer runs in flight at once
    pub max_in_flight: usize,

    /// JSON lines output, `~` is expanded
    pub output_path: String,

    /// Runs kept on the profit leaderboard
    pub leaderboard_size: usize,

    /// Seed for run identifiers
    pub seed: u64,
}

impl SweepConfig {
    /// Load configuration from TOML file
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SWEEP_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(shellexpand::tilde(path).as_ref())
            .context(format!("Failed to read config file: {}", path))?;

        let config: SweepConfig = toml::from_str(&config_str)
            .context("Failed to parse config TOML")?;

        Ok(config)
    }

    /// The grid of the reference reentrancy study
    pub fn default_grid() -> Self {
        Self {
            victim_counts: vec![2, 3],
            distributions: vec![DistributionShape::Pyramid, DistributionShape::Exponential],
            total_balances_eth: vec![50.0, 100.0, 200.0],
            gas_prices: vec![10_000, 50_000],
            per_call_risks: vec![0.05, 0.1, 0.2],
            max_detection_risks: vec![0.02, 0.05, 0.1, 0.3, 0.5],
            gas_budgets: vec![3_000_000, 5_000_000],
            risk_weights: vec![1e20, 1e21, 1e22],
            max_evm_gas: 10_000_000,
            gas_base_cost: 35_000,
            gas_marginal_cost: 0.0,
            breakpoints: reentrancy_model::DEFAULT_BREAKPOINTS,
            max_iterations: reentrancy_model::DEFAULT_MAX_ITERATIONS,
            max_in_flight: 8,
            output_path: "sweep-results.jsonl".to_string(),
            leaderboard_size: 10,
            seed: 42,
        }
    }

    /// Write default config to file
    pub fn write_default(path: &str) -> Result<()> {
        let config = Self::default_grid();
        let toml_str = toml::to_string_pretty(&config)
            .context("Failed to serialize config")?;

        std::fs::write(shellexpand::tilde(path).as_ref(), toml_str)
            .context(format!("Failed to write config to {}", path))?;

        log::info!("Created default config at {}", path);
        Ok(())
    }

    /// Reject grids that would produce no runs or stall the driver.
    /// Per-run parameter problems are left to the model and counted as failures.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.grid_size() > 0,
            "sweep grid is empty: every parameter list needs at least one value"
        );
        ensure!(self.max_in_flight > 0, "max_in_flight must be positive");
        ensure!(self.max_evm_gas > 0, "max_evm_gas must be positive");
        ensure!(
            self.victim_counts.iter().all(|n| *n >= 1),
            "victim counts must be at least 1"
        );
        self.search_config()
            .validate()
            .context("Invalid search resolution")?;
        Ok(())
    }

    pub fn grid_size(&self) -> usize {
        self.victim_counts.len()
            * self.distributions.len()
            * self.total_balances_eth.len()
            * self.gas_prices.len()
            * self.per_call_risks.len()
            * self.max_detection_risks.len()
            * self.gas_budgets.len()
            * self.risk_weights.len()
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            breakpoints: self.breakpoints,
            max_iterations: self.max_iterations,
        }
    }

    /// Settings every run shares
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            max_evm_gas: u128::from(self.max_evm_gas),
            gas_base_cost: u128::from(self.gas_base_cost),
            gas_marginal_cost: self.gas_marginal_cost,
            search: self.search_config(),
        }
    }

    /// Totals in wei, in configured order
    pub fn total_balances_wei(&self) -> Vec<u128> {
        self.total_balances_eth.iter().map(|eth| eth_to_wei(*eth)).collect()
    }
}
