//! Model catalog entries from TOML (`[[models]]` array)

use crate::providers::{ModelEndpoint, ResponseShape};
use parley_domain::{CatalogEntry, Tier};
use serde::{Deserialize, Serialize};

/// One model the orchestrator may route to.
///
/// # Example
///
/// ```toml
/// [[models]]
/// name = "llama3-8b"
/// tier = "fast"
/// endpoint = "http://localhost:11434/api/generate"
/// shape = "ollama"
/// resource = "gpu0"
///
/// [[models]]
/// name = "qwen2.5-32b"
/// tier = "powerful"
/// endpoint = "http://localhost:8080/completion"
/// shape = "llamacpp"
/// cost_per_1k_tokens = 0.002
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileModelEntry {
    pub name: String,
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub shape: ResponseShape,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub cost_per_1k_tokens: f64,
    /// Models sharing a resource group are never benchmarked in parallel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl FileModelEntry {
    pub fn new(name: impl Into<String>, tier: Tier) -> Self {
        Self {
            name: name.into(),
            tier,
            endpoint: None,
            shape: ResponseShape::default(),
            enabled: true,
            cost_per_1k_tokens: 0.0,
            resource: None,
        }
    }

    pub fn to_catalog_entry(&self) -> CatalogEntry {
        let mut entry =
            CatalogEntry::new(self.name.trim(), self.tier).with_cost(self.cost_per_1k_tokens);
        if let Some(resource) = &self.resource {
            entry = entry.with_resource(resource.clone());
        }
        if !self.enabled {
            entry = entry.disabled();
        }
        entry
    }

    pub fn to_endpoint(&self) -> Option<ModelEndpoint> {
        self.endpoint
            .as_ref()
            .map(|url| ModelEndpoint::new(url.clone(), self.shape))
    }
}
