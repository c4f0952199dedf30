//! Answer types.

use crate::chunk::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum snippet length for source references, in characters.
const MAX_SNIPPET_CHARS: usize = 150;

/// A grounded answer and the chunks it was generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Normalized backend output; the refusal string when unanswerable
    pub answer: String,

    /// Retrieved chunks in rank order
    pub source_documents: Vec<Chunk>,

    pub query: String,
}

/// A user-facing pointer to where supporting text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagSourceRef {
    /// Source document (e.g., "data/rag.md")
    pub source: String,

    /// Location within the source, e.g. "chars 120-480"
    pub location: String,

    /// Start of the supporting text, truncated at a word boundary
    pub snippet: String,
}

impl Answer {
    /// Whether the answer is exactly `refusal`.
    pub fn is_refusal(&self, refusal: &str) -> bool {
        self.answer.trim() == refusal.trim()
    }

    /// Source references in rank order, deduplicated by (source, location).
    pub fn source_refs(&self) -> Vec<RagSourceRef> {
        let mut seen = HashSet::new();
        let mut refs = Vec::new();

        for chunk in &self.source_documents {
            let (start, end) = chunk.metadata.char_range;
            let location = format!("chars {}-{}", start, end);

            if seen.insert((chunk.source_id.clone(), location.clone())) {
                refs.push(RagSourceRef {
                    source: chunk.source_id.clone(),
                    location,
                    snippet: truncate_snippet(&chunk.text, MAX_SNIPPET_CHARS),
                });
            }
        }

        refs
    }
}

/// Truncate to `max_chars`, backing off to the last whitespace if any.
fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let truncated = &text[..cut];
    match truncated.rfind(char::is_whitespace) {
        Some(space) if space > 0 => format!("{}...", truncated[..space].trim_end()),
        _ => format!("{}...", truncated),
    }
}
