//! Moderator reasoning settings from TOML (`[moderator]` section)

use serde::{Deserialize, Serialize};

/// ```toml
/// [moderator]
/// model = "qwen2.5-32b"
/// max_tokens = 256
/// ```
///
/// Without a model the moderator pass reports itself unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModeratorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for FileModeratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: Some(256),
            temperature: Some(0.2),
        }
    }
}
