//! Model inputs and outputs

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::math::{add_u128, ceil_to_u128};

/// Default breakpoints per victim
pub const DEFAULT_BREAKPOINTS: usize = 30;

/// Default cap on evaluated candidates
pub const DEFAULT_MAX_ITERATIONS: usize = 5_000;

/// One value per victim, in victim order
pub type PerVictim<T> = Vec<T>;

/// One exploitable contract instance
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Victim {
    /// Capital ceiling (wei)
    pub balance: u128,
    /// Fixed gas per call
    pub gas_base_cost: u128,
    /// Gas per wei withdrawn in a single call, may be zero
    #[serde(default)]
    pub gas_marginal_cost: f64,
}

impl Victim {
    pub fn new(balance: u128, gas_base_cost: u128) -> Self {
        Self {
            balance,
            gas_base_cost,
            gas_marginal_cost: 0.0,
        }
    }

    pub fn with_marginal_cost(mut self, gas_marginal_cost: f64) -> Self {
        self.gas_marginal_cost = gas_marginal_cost;
        self
    }

    /// `gas_base + ceil(gas_marginal * amount)`; rounding up keeps the integer
    /// figure an upper bound of the real-valued cost
    pub fn gas_per_call(&self, amount: u128) -> u128 {
        let marginal = ceil_to_u128(self.gas_marginal_cost * amount as f64);
        add_u128(self.gas_base_cost, marginal)
    }
}

/// Global budget and risk parameters shared by all victims
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Gas available across all victims and calls
    pub gas_budget: u128,
    /// Wei per gas
    pub gas_price: u128,
    /// Upper bound on cumulative detection risk, in [0, 1)
    pub max_detection_risk: f64,
    /// Detection probability of a single call, in [0, 1)
    pub per_call_risk: f64,
    /// Profit units traded per unit of cumulative risk
    pub risk_weight: f64,
}

impl Params {
    /// Reject parameter sets the search cannot interpret
    pub fn validate(&self) -> Result<()> {
        if self.gas_budget == 0 {
            return Err(ModelError::NonPositiveGasBudget);
        }
        check_probability("max_detection_risk", self.max_detection_risk)?;
        check_probability("per_call_risk", self.per_call_risk)?;
        if !self.risk_weight.is_finite() || self.risk_weight < 0.0 {
            return Err(ModelError::InvalidRiskWeight(self.risk_weight));
        }
        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<()> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(ModelError::InvalidProbability { name, value })
    }
}

/// Check the victim set: non-empty with well-formed gas coefficients
pub fn validate_victims(victims: &[Victim]) -> Result<()> {
    if victims.is_empty() {
        return Err(ModelError::NoVictims);
    }
    for (index, v) in victims.iter().enumerate() {
        if !v.gas_marginal_cost.is_finite() || v.gas_marginal_cost < 0.0 {
            return Err(ModelError::InvalidGasMarginal {
                index,
                value: v.gas_marginal_cost,
            });
        }
    }
    Ok(())
}

/// Search resolution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Breakpoints per victim: `balance / (k + 1)` for `k in [0, breakpoints)`
    pub breakpoints: usize,
    /// Candidates evaluated before the search stops with the best so far
    pub max_iterations: usize,
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.breakpoints == 0 || self.max_iterations == 0 {
            return Err(ModelError::EmptySearchGrid {
                breakpoints: self.breakpoints,
                max_iterations: self.max_iterations,
            });
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            breakpoints: DEFAULT_BREAKPOINTS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Best feasible allocation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Withdrawal amount per call, per victim
    pub amounts: PerVictim<u128>,
    /// Call count per victim
    pub calls: PerVictim<u128>,
    /// Capital extracted minus gas expenditure (wei)
    pub profit: i128,
    /// Gas consumed across all victims and calls
    pub gas_used: u128,
    /// Cumulative detection risk
    pub detection_risk: f64,
    /// `profit - risk_weight * detection_risk`
    pub utility: f64,
}

impl OptimizationResult {
    pub fn total_calls(&self) -> u128 {
        self.calls.iter().fold(0u128, |acc, n| add_u128(acc, *n))
    }
}

/// Result of one optimizer invocation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Optimal(OptimizationResult),
    /// No candidate survived the feasibility checks
    Infeasible,
}

impl Outcome {
    pub fn optimal(&self) -> Option<&OptimizationResult> {
        match self {
            Outcome::Optimal(r) => Some(r),
            Outcome::Infeasible => None,
        }
    }

    pub fn into_optimal(self) -> Option<OptimizationResult> {
        match self {
            Outcome::Optimal(r) => Some(r),
            Outcome::Infeasible => None,
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self, Outcome::Optimal(_))
    }
}

/// Search bookkeeping
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Candidate amount vectors examined
    pub candidates_evaluated: usize,
    /// Candidates that passed every constraint
    pub feasible_candidates: usize,
    /// Total size of the breakpoint grid (saturating)
    pub grid_size: usize,
    /// The iteration cap stopped the search before the grid was exhausted
    pub truncated: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub outcome: Outcome,
    pub stats: SearchStats,
}
