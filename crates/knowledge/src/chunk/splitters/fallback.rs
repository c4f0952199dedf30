//! Fixed-window splitter that always cuts at the character limit.

use super::{BreakKind, ChunkSplitter, TextIndex};

pub struct FallbackSplitter;

impl ChunkSplitter for FallbackSplitter {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn find_break(
        &self,
        _index: &TextIndex<'_>,
        _start: usize,
        _min_end: usize,
        window_end: usize,
    ) -> (usize, BreakKind) {
        (window_end, BreakKind::Hard)
    }
}
