//! Splitter implementations.
//!
//! A splitter only decides where a chunk ends. Walking the document,
//! enforcing the size limit and the exact overlap is shared.

mod fallback;
mod recursive;

pub use fallback::FallbackSplitter;
pub use recursive::RecursiveSplitter;

use crate::chunk::{Chunk, ChunkConfig};
use crate::document::Document;
use grounded_core::AppResult;

/// Which boundary ended a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    Paragraph,
    Line,
    Sentence,
    Word,
    Hard,
    /// The rest of the document fit in one chunk.
    End,
}

impl BreakKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Line => "line",
            Self::Sentence => "sentence",
            Self::Word => "word",
            Self::Hard => "char",
            Self::End => "end",
        }
    }
}

/// Character view of a text with O(log n) byte/char conversions.
pub struct TextIndex<'a> {
    text: &'a str,
    /// Byte offset of every char, plus `text.len()` as a sentinel
    offsets: Vec<usize>,
}

impl<'a> TextIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        Self { text, offsets }
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte offset of char position `pos` (`pos == len()` is allowed).
    pub fn byte(&self, pos: usize) -> usize {
        self.offsets[pos]
    }

    /// Char position of a byte offset that lies on a char boundary.
    pub fn char_at_byte(&self, byte: usize) -> Option<usize> {
        self.offsets.binary_search(&byte).ok()
    }

    /// Text between two char positions.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.byte(start)..self.byte(end)]
    }
}

/// Trait for chunk splitters.
pub trait ChunkSplitter: Send + Sync {
    /// Short name recorded in chunk metadata.
    fn name(&self) -> &'static str;

    /// Pick the end (exclusive char position) of the chunk starting at `start`.
    ///
    /// The result must lie in `min_end..=window_end`; values outside are clamped.
    fn find_break(
        &self,
        index: &TextIndex<'_>,
        start: usize,
        min_end: usize,
        window_end: usize,
    ) -> (usize, BreakKind);

    /// Split a document into overlapping chunks.
    ///
    /// Each chunk after the first starts exactly `overlap` chars before the
    /// previous chunk's end, and every chunk makes progress because a break
    /// must lie past `start + overlap`.
    fn split(&self, document: &Document, config: &ChunkConfig) -> AppResult<Vec<Chunk>> {
        config.validate()?;

        let index = TextIndex::new(&document.text);
        let total = index.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let (end, kind) = if total - start <= config.max_chunk_size {
                (total, BreakKind::End)
            } else {
                let window_end = start + config.max_chunk_size;
                let min_end = start + config.overlap + 1;
                let (end, kind) = self.find_break(&index, start, min_end, window_end);
                (end.clamp(min_end, window_end), kind)
            };

            chunks.push(Chunk::new(
                document,
                chunks.len() as u32,
                (start, end),
                (index.byte(start), index.byte(end)),
                format!("{}:{}", self.name(), kind.as_str()),
            ));

            if end == total {
                break;
            }
            start = end - config.overlap;
        }

        Ok(chunks)
    }
}
