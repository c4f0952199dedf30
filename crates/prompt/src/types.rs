//! Prompt definitions and rendered prompts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Template pair plus the knobs that control rendering.
///
/// `system` and `user` are Handlebars templates. Answering a question fills
/// in `context`, `question` and `refusal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDefinition {
    pub id: String,
    pub title: String,
    /// Must look like `major.minor`
    pub api_version: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub behavior: PromptPolicy,
    pub system: String,
    #[serde(default = "question_only")]
    pub user: String,
}

fn question_only() -> String {
    "{{question}}".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptPolicy {
    /// Replaces the configured refusal sentence for this prompt only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,

    /// Unknown variables become render errors instead of empty strings.
    #[serde(default)]
    pub strict: bool,
}

/// The two messages sent to the backend, and where they came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    pub system: String,
    pub user: String,
    pub provenance: PromptProvenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptProvenance {
    pub prompt_id: String,
    pub variables: HashMap<String, String>,
}

impl BuiltPrompt {
    pub fn new(
        system: String,
        user: String,
        prompt_id: String,
        variables: HashMap<String, String>,
    ) -> Self {
        Self {
            system,
            user,
            provenance: PromptProvenance {
                prompt_id,
                variables,
            },
        }
    }
}
