//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`] - identifier of a locally served model backend
//! - [`question::Question`] - the validated free-text request
//! - [`usage::TokenUsage`] - token counts of invocations
//! - [`error::DomainError`] - domain-level errors

pub mod error;
pub mod model;
pub mod question;
pub mod usage;
