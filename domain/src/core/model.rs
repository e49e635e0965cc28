//! Model value object identifying a locally served LLM backend

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a model backend (Value Object)
///
/// Local serving platforms name models freely (`llama-3.2-3b`,
/// `qwen2.5-14b-instruct`, ...), so the identifier is an opaque string.
/// Which tier a model belongs to is catalog data, not part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Model(String);

impl Model {
    /// Create a model identifier. Surrounding whitespace is trimmed.
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self(name.trim().to_string())
    }

    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty (invalid in configuration)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Model::new(s))
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        Model::new(s)
    }
}

impl From<String> for Model {
    fn from(s: String) -> Self {
        Model::new(s)
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Model::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_trims_whitespace() {
        let model: Model = "  llama-3.2-3b ".parse().unwrap();
        assert_eq!(model.as_str(), "llama-3.2-3b");
        assert_eq!(model.to_string(), "llama-3.2-3b");
    }

    #[test]
    fn test_model_serializes_as_plain_string() {
        let json = serde_json::to_string(&Model::new("qwen2.5-14b")).unwrap();
        assert_eq!(json, "\"qwen2.5-14b\"");
        let back: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Model::new("qwen2.5-14b"));
    }

    #[test]
    fn test_empty_model() {
        assert!(Model::new("   ").is_empty());
        assert!(!Model::new("m").is_empty());
    }
}
