//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use grounded_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Both the system and the user template are rendered with the same
/// variables. Values are inserted verbatim (no HTML escaping).
///
/// # Example
/// ```no_run
/// use grounded_prompt::{build_prompt, builtin::grounded_answer};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is RAG?".to_string());
/// vars.insert("context".to_string(), "RAG combines retrieval and generation.".to_string());
/// vars.insert("refusal".to_string(), "I don't know.".to_string());
///
/// let built = build_prompt(&grounded_answer(), vars)?;
/// println!("System prompt: {}", built.system);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let strict = definition.behavior.strict;
    let system = render_template(&definition.system, &variables, strict)?;
    let user = render_template(&definition.user, &variables, strict)?;

    Ok(BuiltPrompt::new(system, user, definition.id.clone(), variables))
}

/// Build the grounded answer prompt for one question.
///
/// `context` is inserted as-is; an empty context still yields a complete
/// prompt so the backend can issue the refusal itself. A refusal override
/// on the definition wins over `refusal`.
pub fn build_grounded_prompt(
    definition: &PromptDefinition,
    question: &str,
    context: &str,
    refusal: &str,
) -> AppResult<BuiltPrompt> {
    let refusal = definition.behavior.refusal.as_deref().unwrap_or(refusal);

    let mut variables = HashMap::with_capacity(3);
    variables.insert("question".to_string(), question.to_string());
    variables.insert("context".to_string(), context.to_string());
    variables.insert("refusal".to_string(), refusal.to_string());

    build_prompt(definition, variables)
}

/// Render a Handlebars template with variables.
fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
    strict: bool,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(strict);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
