//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod dispatch_query;
pub mod moderate;
pub mod run_benchmark;
pub mod run_dialogue;
pub mod run_stages;
pub(crate) mod shared;
