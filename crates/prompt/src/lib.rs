//! Prompt system for the grounded engine.
//!
//! - Built-in grounded answer prompt with an exact refusal phrase
//! - YAML overrides under `.grounded/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

pub use builder::{build_grounded_prompt, build_prompt};
pub use builtin::{DEFAULT_REFUSAL, GROUNDED_ANSWER_ID};
pub use loader::{load_prompt, resolve_prompt, validate_prompt};
pub use types::{BuiltPrompt, PromptDefinition, PromptPolicy, PromptProvenance};
