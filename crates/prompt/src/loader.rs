//! Built-in prompts and their YAML overrides.

use crate::builtin;
use crate::types::PromptDefinition;
use grounded_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Variables every answer prompt must reference.
const REQUIRED_PLACEHOLDERS: [&str; 2] = ["context", "question"];

/// Path of the override file for a prompt id.
pub fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    workspace_path
        .join(".grounded/prompts")
        .join(format!("{}.yml", prompt_id))
}

/// Read and validate `.grounded/prompts/<id>.yml`.
///
/// ```no_run
/// use grounded_prompt::load_prompt;
/// use std::path::Path;
///
/// let prompt = load_prompt(Path::new("."), "rag.answer.grounded").expect("prompt");
/// assert_eq!(prompt.id, "rag.answer.grounded");
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let file = prompt_path(workspace_path, prompt_id);
    let raw = std::fs::read_to_string(&file)
        .map_err(|e| AppError::Prompt(format!("Cannot read prompt {}: {}", file.display(), e)))?;

    let definition: PromptDefinition = serde_yaml::from_str(&raw)
        .map_err(|e| AppError::Prompt(format!("Bad prompt YAML in {}: {}", file.display(), e)))?;
    validate_prompt(&definition)?;

    tracing::info!(id = %definition.id, path = %file.display(), "Using prompt override");
    Ok(definition)
}

/// Workspace override if one exists, else the built-in of the same id.
pub fn resolve_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    if prompt_path(workspace_path, prompt_id).is_file() {
        return load_prompt(workspace_path, prompt_id);
    }

    builtin::builtin(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))
}

/// Reject definitions that could not produce a grounded prompt.
pub fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    let fail = |why: String| Err(AppError::Prompt(format!("Prompt '{}': {}", def.id, why)));

    if def.id.trim().is_empty() || def.title.trim().is_empty() {
        return fail("id and title are required".to_string());
    }
    if !def.api_version.contains('.') {
        return fail(format!("apiVersion '{}' is not major.minor", def.api_version));
    }
    if def.system.trim().is_empty() {
        return fail("system template is empty".to_string());
    }

    let missing = REQUIRED_PLACEHOLDERS.iter().find(|name| {
        !mentions_placeholder(&def.system, name) && !mentions_placeholder(&def.user, name)
    });
    match missing {
        Some(name) => fail(format!("never references {{{{{}}}}}", name)),
        None => Ok(()),
    }
}

/// Whether `template` contains `{{name}}`, `{{ name }}` or `{{{name}}}`.
fn mentions_placeholder(template: &str, name: &str) -> bool {
    template.split("{{").skip(1).any(|rest| {
        rest.split("}}")
            .next()
            .map(|tag| tag.trim_start_matches('{').trim() == name)
            .unwrap_or(false)
    })
}
