//! Infrastructure layer for parley
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod reasoning;

// Re-export commonly used types
pub use config::{ConfigError, ConfigLoader, FileConfig, FileModelEntry};
pub use logging::JsonlConversationLogger;
#[cfg(feature = "http")]
pub use providers::http::HttpModelInvoker;
pub use providers::{EndpointTable, ModelEndpoint, ResponseShape};
pub use reasoning::LlmReasoningEngine;
