//! Grounded answering: context assembly, prompt rendering, generation.

pub mod composer;
pub mod types;

pub use composer::{build_context, AnswerComposer, ComposerSettings};
pub use types::{Answer, RagSourceRef};
