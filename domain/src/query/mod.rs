//! Queries: the caller's request and its processing mode.

pub mod entities;
pub mod mode;

pub use entities::{Query, QueryParams};
pub use mode::{ExecutionPolicy, Mode};
