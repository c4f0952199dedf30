//! Overlapping, boundary-aware chunking.
//!
//! Documents are cut into windows of at most `max_chunk_size` characters.
//! Consecutive chunks of one document share exactly `overlap` characters,
//! and each cut prefers the coarsest boundary that fits: paragraph, line,
//! sentence, word, and only then a hard character cut.

mod pipeline;
pub mod splitters;

pub use pipeline::{ChunkConfig, ChunkPipeline};

use crate::document::{Document, Metadata};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A chunk of a document's cleaned text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier: `<source>#<position>`
    pub id: String,

    /// Source document identifier
    pub source_id: String,

    /// Chunk position in document (0-indexed)
    pub position: u32,

    /// Verbatim span of the document text
    pub text: String,

    pub metadata: ChunkMetadata,
}

/// Metadata about a chunk's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Metadata inherited verbatim from the document
    pub document: Metadata,

    /// Character range in the document text
    pub char_range: (usize, usize),

    /// Byte range in the document text
    pub byte_range: (usize, usize),

    pub char_count: usize,

    /// SHA-256 of the chunk text
    pub hash: String,

    /// Splitter and boundary kind that ended this chunk, e.g. "recursive:sentence"
    pub splitter_used: String,
}

impl Chunk {
    /// Build a chunk for `document` covering `char_range` / `byte_range`.
    pub fn new(
        document: &Document,
        position: u32,
        char_range: (usize, usize),
        byte_range: (usize, usize),
        splitter_used: impl Into<String>,
    ) -> Self {
        let source_id = document.source();
        let text = document.text[byte_range.0..byte_range.1].to_string();

        Self {
            id: format!("{}#{}", source_id, position),
            source_id,
            position,
            metadata: ChunkMetadata {
                document: document.metadata.clone(),
                char_range,
                byte_range,
                char_count: char_range.1 - char_range.0,
                hash: calculate_hash(&text),
                splitter_used: splitter_used.into(),
            },
            text,
        }
    }
}

/// Calculate SHA-256 hash of text.
pub fn calculate_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MetadataValue;

    #[test]
    fn test_calculate_hash() {
        let hash = calculate_hash("Hello, world!");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, calculate_hash("Hello, world!"));
        assert_ne!(hash, calculate_hash("Different text"));
    }

    #[test]
    fn test_chunk_inherits_document_metadata() {
        let doc = Document::new("guide.md", "héllo world").with_metadata("page", 7i64);

        // "world" starts at char 6, byte 7
        let chunk = Chunk::new(&doc, 1, (6, 11), (7, 12), "recursive:end");
        assert_eq!(chunk.id, "guide.md#1");
        assert_eq!(chunk.text, "world");
        assert_eq!(chunk.metadata.char_count, 5);
        assert_eq!(
            chunk.metadata.document.get("page"),
            Some(&MetadataValue::Integer(7))
        );
        assert_eq!(chunk.metadata.document, doc.metadata);
    }
}
