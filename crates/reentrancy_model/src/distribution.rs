//! Per-victim capital ceilings from a total and a distribution shape

use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::math::{add_u128, mul_div_floor};

/// Seed for the `random` shape, fixed so sweeps are reproducible
pub const RANDOM_SHAPE_SEED: u64 = 42;

/// Trailing victims weighted by the `exponential` shape. Keeps the weight sum
/// below 2^64, which `mul_div_floor` needs to stay exact.
pub const EXPONENTIAL_WINDOW: usize = 63;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionShape {
    /// Uniform floor split, remainder dropped
    Equal,
    /// Weights 1..=n
    Pyramid,
    /// Weights 2^0..2^(n-1)
    Exponential,
    /// Fixed-seed uniform weights
    Random,
}

impl DistributionShape {
    pub const ALL: [DistributionShape; 4] = [
        DistributionShape::Equal,
        DistributionShape::Pyramid,
        DistributionShape::Exponential,
        DistributionShape::Random,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionShape::Equal => "equal",
            DistributionShape::Pyramid => "pyramid",
            DistributionShape::Exponential => "exponential",
            DistributionShape::Random => "random",
        }
    }

    /// Relative weight of each victim. `Equal` has unit weights.
    pub fn weights(&self, victim_count: usize) -> Vec<u128> {
        match self {
            DistributionShape::Equal => vec![1; victim_count],
            DistributionShape::Pyramid => (1..=victim_count as u128).collect(),
            DistributionShape::Exponential => {
                // Only the last EXPONENTIAL_WINDOW doublings get weight; earlier
                // shares are below one unit of any u128 total
                let skip = victim_count.saturating_sub(EXPONENTIAL_WINDOW);
                (0..victim_count)
                    .map(|i| i.checked_sub(skip).map_or(0, |j| 1u128 << j))
                    .collect()
            }
            DistributionShape::Random => {
                let mut rng = ChaCha8Rng::seed_from_u64(RANDOM_SHAPE_SEED);
                (0..victim_count)
                    .map(|_| u128::from(rng.gen_range(1..=u32::MAX)))
                    .collect()
            }
        }
    }
}

impl fmt::Display for DistributionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionShape {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "equal" => Ok(DistributionShape::Equal),
            "pyramid" => Ok(DistributionShape::Pyramid),
            "exponential" => Ok(DistributionShape::Exponential),
            "random" => Ok(DistributionShape::Random),
            _ => Err(ModelError::UnknownDistributionShape(s.to_string())),
        }
    }
}

/// Split `total_balance` across `victim_count` victims.
///
/// Every share is `floor(total * w_i / sum(w))`, so the result never sums to
/// more than `total_balance` and falls short by at most `victim_count - 1`.
pub fn distribute(
    victim_count: usize,
    shape: DistributionShape,
    total_balance: u128,
) -> Result<Vec<u128>> {
    if victim_count == 0 {
        return Err(ModelError::NoVictims);
    }

    let weights = shape.weights(victim_count);
    let weight_sum = weights.iter().fold(0u128, |acc, w| add_u128(acc, *w));

    Ok(weights
        .iter()
        .map(|w| mul_div_floor(total_balance, *w, weight_sum))
        .collect())
}

/// [`distribute`] with the shape given as a token
pub fn distribute_token(victim_count: usize, shape: &str, total_balance: u128) -> Result<Vec<u128>> {
    distribute(victim_count, shape.parse()?, total_balance)
}
