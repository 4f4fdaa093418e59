use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

/// Configuration errors. Infeasibility and search truncation are values,
/// see [`crate::state::Outcome`] and [`crate::state::SearchStats`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("unknown distribution shape `{0}` (expected equal, pyramid, exponential or random)")]
    UnknownDistributionShape(String),
    #[error("at least one victim is required")]
    NoVictims,
    #[error("gas budget must be positive")]
    NonPositiveGasBudget,
    #[error("{name} must lie in [0, 1), got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("risk weight must be finite and non-negative, got {0}")]
    InvalidRiskWeight(f64),
    #[error("gas marginal cost of victim {index} must be finite and non-negative, got {value}")]
    InvalidGasMarginal { index: usize, value: f64 },
    #[error("search grid is empty: breakpoints={breakpoints}, max_iterations={max_iterations}")]
    EmptySearchGrid {
        breakpoints: usize,
        max_iterations: usize,
    },
}
