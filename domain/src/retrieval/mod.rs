//! Retrieved context artifacts.
//!
//! Retrieval itself (chunking, embedding, vector search, token budgeting) is
//! an external collaborator; the domain only knows the shape of its output.

use serde::{Deserialize, Serialize};

/// One piece of retrieved context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub source_path: String,
    pub text: String,
    pub relevance_score: f64,
}

impl Artifact {
    pub fn new(source_path: impl Into<String>, text: impl Into<String>, relevance_score: f64) -> Self {
        Self {
            source_path: source_path.into(),
            text: text.into(),
            relevance_score,
        }
    }
}

/// Render artifacts as a prompt section, most relevant first.
///
/// Returns `None` for an empty list so callers can omit the section.
pub fn render_context(artifacts: &[Artifact]) -> Option<String> {
    if artifacts.is_empty() {
        return None;
    }

    let mut ranked: Vec<&Artifact> = artifacts.iter().collect();
    ranked.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut section = String::from("Relevant context:\n");
    for artifact in ranked {
        section.push_str(&format!(
            "\n--- {} (relevance {:.2}) ---\n{}\n",
            artifact.source_path, artifact.relevance_score, artifact.text
        ));
    }
    Some(section)
}
