//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod context_retriever;
pub mod conversation_logger;
pub mod model_invoker;
pub mod progress;
pub mod reasoning;
