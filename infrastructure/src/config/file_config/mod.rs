//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod backend;
mod logging;
mod models;
mod moderator;
mod orchestration;
mod output;

pub use backend::FileBackendConfig;
pub use logging::FileLoggingConfig;
pub use models::FileModelEntry;
pub use moderator::FileModeratorConfig;
pub use orchestration::FileOrchestrationConfig;
pub use output::FileOutputConfig;

use super::error::ConfigError;
use crate::providers::EndpointTable;
use parley_application::OrchestrationParams;
use parley_domain::{Model, ModelCatalog};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model catalog, in resolution order
    pub models: Vec<FileModelEntry>,
    pub orchestration: FileOrchestrationConfig,
    pub backend: FileBackendConfig,
    pub moderator: FileModeratorConfig,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Reject configurations no query could run against sensibly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let mut seen = HashSet::new();
        for (index, entry) in self.models.iter().enumerate() {
            let name = entry.name.trim();
            if name.is_empty() {
                return Err(ConfigError::EmptyModelName(index + 1));
            }
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateModel(name.to_string()));
            }
            if !entry.cost_per_1k_tokens.is_finite() || entry.cost_per_1k_tokens < 0.0 {
                return Err(ConfigError::InvalidModel {
                    model: name.to_string(),
                    message: "cost_per_1k_tokens must be a non-negative number".to_string(),
                });
            }
        }

        let thresholds = self.orchestration.thresholds;
        if !thresholds.is_valid() {
            return Err(ConfigError::InvertedThresholds {
                balanced: thresholds.balanced,
                powerful: thresholds.powerful,
            });
        }
        if self.orchestration.max_turns == 0 {
            return Err(ConfigError::ZeroLimit { field: "max_turns" });
        }
        if self.orchestration.moderator_max_iterations == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "moderator_max_iterations",
            });
        }

        if let Some(model) = &self.moderator.model
            && !seen.contains(model.trim())
        {
            return Err(ConfigError::UnknownModerator(model.clone()));
        }

        Ok(())
    }

    /// Catalog in configuration order. Availability starts optimistic.
    pub fn to_catalog(&self) -> ModelCatalog {
        ModelCatalog::new(self.models.iter().map(|m| m.to_catalog_entry()).collect())
    }

    pub fn to_endpoints(&self) -> EndpointTable {
        let mut table = EndpointTable::new();
        for entry in &self.models {
            if let Some(endpoint) = entry.to_endpoint() {
                table.insert(Model::new(entry.name.trim()), endpoint);
            }
        }
        table
    }

    pub fn to_params(&self) -> OrchestrationParams {
        self.orchestration.to_params()
    }

    pub fn moderator_model(&self) -> Option<Model> {
        self.moderator.model.as_deref().map(|m| Model::new(m.trim()))
    }
}
