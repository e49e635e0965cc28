//! Per-query catalog of model backends.
//!
//! [`ModelCatalog`] is an explicit handle passed into every dispatch. It is
//! built by the caller (from configuration plus whatever health information
//! the backend manager has) and never stored globally.

use crate::core::model::Model;
use crate::routing::tier::Tier;
use serde::{Deserialize, Serialize};

/// One model backend known to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub model: Model,
    pub tier: Tier,
    /// Enabled by configuration
    pub enabled: bool,
    /// Backend currently reachable
    pub available: bool,
    /// Estimated resource cost per 1000 tokens (arbitrary local units)
    pub cost_per_1k_tokens: f64,
    /// Constrained resource the backend runs on (e.g. a GPU id). Backends
    /// sharing a resource must not be invoked concurrently.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl CatalogEntry {
    pub fn new(model: impl Into<Model>, tier: Tier) -> Self {
        Self {
            model: model.into(),
            tier,
            enabled: true,
            available: true,
            cost_per_1k_tokens: 0.0,
            resource: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_cost(mut self, cost_per_1k_tokens: f64) -> Self {
        self.cost_per_1k_tokens = cost_per_1k_tokens;
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Enabled and reachable.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.available
    }

    /// Estimated cost of a given token usage on this backend.
    pub fn estimate_cost(&self, tokens: u64) -> f64 {
        tokens as f64 / 1000.0 * self.cost_per_1k_tokens
    }
}

/// Ordered collection of catalog entries. Order is the tie-breaker for
/// resolution within a tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalog {
    entries: Vec<CatalogEntry>,
}

impl ModelCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn with_entry(mut self, entry: CatalogEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, model: &Model) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| &e.model == model)
    }

    /// Usable entries in catalog order.
    pub fn usable(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.is_usable())
    }

    /// First usable entry of the given tier.
    pub fn first_usable_in(&self, tier: Tier) -> Option<&CatalogEntry> {
        self.usable().find(|e| e.tier == tier)
    }

    pub fn is_usable(&self, model: &Model) -> bool {
        self.get(model).is_some_and(CatalogEntry::is_usable)
    }

    pub fn usable_count(&self) -> usize {
        self.usable().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mark a model's backend reachable or not (health information from the
    /// backend manager). Unknown models are ignored.
    pub fn set_available(&mut self, model: &Model, available: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| &e.model == model) {
            entry.available = available;
        }
    }
}
