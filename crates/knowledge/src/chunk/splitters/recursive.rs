//! Boundary-aware splitter.
//!
//! Tries paragraph breaks, then line breaks, then Unicode sentence
//! boundaries, then Unicode word boundaries, and falls back to a hard cut.

use super::{BreakKind, ChunkSplitter, TextIndex};
use unicode_segmentation::UnicodeSegmentation;

/// Chars past the window end fed to the segmenters so that a boundary
/// exactly at the window end is judged with real right-hand context.
const LOOKAHEAD_CHARS: usize = 32;

const SEPARATORS: [(&str, BreakKind); 2] = [("\n\n", BreakKind::Paragraph), ("\n", BreakKind::Line)];

pub struct RecursiveSplitter;

impl RecursiveSplitter {
    /// Largest segment start in `min_end..=window_end`, as a char position.
    fn last_boundary(
        index: &TextIndex<'_>,
        base_byte: usize,
        starts: impl Iterator<Item = usize>,
        min_end: usize,
        window_end: usize,
    ) -> Option<usize> {
        starts
            .filter(|&offset| offset > 0)
            .filter_map(|offset| index.char_at_byte(base_byte + offset))
            .filter(|&pos| pos >= min_end && pos <= window_end)
            .max()
    }
}

impl ChunkSplitter for RecursiveSplitter {
    fn name(&self) -> &'static str {
        "recursive"
    }

    fn find_break(
        &self,
        index: &TextIndex<'_>,
        start: usize,
        min_end: usize,
        window_end: usize,
    ) -> (usize, BreakKind) {
        let base_byte = index.byte(start);
        let window = index.slice(start, window_end);

        for (separator, kind) in SEPARATORS {
            if let Some(offset) = window.rfind(separator) {
                if let Some(end) = index.char_at_byte(base_byte + offset + separator.len()) {
                    if end >= min_end {
                        return (end, kind);
                    }
                }
            }
        }

        let probe_end = (window_end + LOOKAHEAD_CHARS).min(index.len());
        let probe = index.slice(start, probe_end);

        let sentence = Self::last_boundary(
            index,
            base_byte,
            probe.split_sentence_bound_indices().map(|(i, _)| i),
            min_end,
            window_end,
        );
        if let Some(end) = sentence {
            return (end, BreakKind::Sentence);
        }

        let word = Self::last_boundary(
            index,
            base_byte,
            probe.split_word_bound_indices().map(|(i, _)| i),
            min_end,
            window_end,
        );
        if let Some(end) = word {
            return (end, BreakKind::Word);
        }

        (window_end, BreakKind::Hard)
    }
}
