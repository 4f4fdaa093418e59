//! Pure allocation model for multi-victim reentrancy planning
//! No I/O, no shared state, no unwrap/panic; every call only reads its inputs

pub mod error;
pub mod state;
pub mod math;
pub mod distribution;
pub mod feasibility;
pub mod helpers;
pub mod search;
pub mod baselines;

// Re-export commonly used types
pub use error::{ModelError, Result};
pub use state::*;
pub use distribution::{distribute, DistributionShape};
pub use feasibility::{admissible_calls, call_bound, CallBound};
pub use helpers::{evaluate_allocation, satisfies_invariants, Violation};
pub use search::{breakpoints, optimize};
pub use baselines::{equal_split_baseline, sequential_baseline};
