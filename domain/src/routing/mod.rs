//! Complexity-driven model routing.
//!
//! ```text
//! Question ──► ComplexityAssessor ──► ComplexityScore ──► TierThresholds ──► Tier
//!                                                                          │
//!                  ModelCatalog (per-query handle) ──► TierRouter ◄────────┘
//!                                                          │
//!                                              ModelSelection (model, tier, role)
//! ```
//!
//! Scoring and routing are pure and synchronous. The catalog is passed in
//! explicitly for every query; there is no process-wide model registry.

pub mod catalog;
pub mod complexity;
pub mod router;
pub mod selection;
pub mod tier;

pub use catalog::{CatalogEntry, ModelCatalog};
pub use complexity::{ComplexityAssessor, ComplexityBreakdown, ComplexityScore};
pub use router::{TierOverrides, TierRouter, TwoStageSelection};
pub use selection::{ModelSelection, SelectionRole};
pub use tier::{Tier, TierThresholds};
