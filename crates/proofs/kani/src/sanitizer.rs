//! State space sanitizer - bounds inputs for Kani exploration

use reentrancy_model::{Params, Victim};

pub const N_VICTIMS: usize = 2;
pub const MAX_RESOLUTION: usize = 4;

/// Bounds for tractable verification
pub const MAX_BALANCE: u128 = 1_000;
pub const MAX_GAS_BASE: u128 = 100;
pub const MAX_GAS_BUDGET: u128 = 1_000;
pub const MAX_GAS_PRICE: u128 = 10;

pub trait Sanitize {
    fn sanitize(self) -> Self;
}

impl Sanitize for Victim {
    fn sanitize(mut self) -> Victim {
        self.balance %= MAX_BALANCE + 1;
        self.gas_base_cost = (self.gas_base_cost % MAX_GAS_BASE).max(1);

        // Base cost only
        self.gas_marginal_cost = 0.0;

        self
    }
}

impl Sanitize for Params {
    fn sanitize(mut self) -> Params {
        self.gas_budget = (self.gas_budget % MAX_GAS_BUDGET).max(1);
        self.gas_price %= MAX_GAS_PRICE + 1;

        if !(0.0..1.0).contains(&self.max_detection_risk) {
            self.max_detection_risk = 0.0;
        }
        if !(0.0..1.0).contains(&self.per_call_risk) {
            self.per_call_risk = 0.0;
        }
        if !self.risk_weight.is_finite() || self.risk_weight < 0.0 {
            self.risk_weight = 0.0;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_inputs_validate() {
        let v = Victim::new(u128::MAX, 0).with_marginal_cost(f64::NAN).sanitize();
        assert!(v.balance <= MAX_BALANCE);
        assert_eq!(v.gas_base_cost, 1);
        assert_eq!(v.gas_marginal_cost, 0.0);

        let p = Params {
            gas_budget: 0,
            gas_price: u128::MAX,
            max_detection_risk: 1.0,
            per_call_risk: -0.5,
            risk_weight: f64::INFINITY,
        }
        .sanitize();
        assert!(p.validate().is_ok());
        assert!(p.gas_price <= MAX_GAS_PRICE);
        assert_eq!(p.gas_budget, 1);
    }
}
