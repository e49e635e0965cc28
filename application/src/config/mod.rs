//! Application-level configuration.
//!
//! - [`OrchestrationParams`] - dispatcher defaults (turn bounds, convergence,
//!   moderator cap, context budget, generation limits, benchmark policy)

pub mod orchestration_params;

pub use orchestration_params::{ConvergenceStrategy, OrchestrationParams};
