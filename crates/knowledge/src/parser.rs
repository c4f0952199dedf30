//! Document loading and text cleaning.

use crate::document::{Document, MetadataValue};
use grounded_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    PlainText,
}

impl ContentType {
    /// Detect the content type from a file name.
    ///
    /// Besides the usual extensions this accepts names ending in `,md`,
    /// a typo that shows up in hand-assembled corpora.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();

        if name.ends_with(",md") {
            return Some(Self::Markdown);
        }

        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("md") | Some("markdown") => Some(Self::Markdown),
            Some("txt") | Some("text") => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::PlainText => "text",
        }
    }
}

/// Anything that can turn a location into a `Document`.
pub trait DocumentSource: Send + Sync {
    /// Load one document. Failures are per-document `IngestionFailure`s.
    fn load(&self, path: &Path) -> AppResult<Document>;

    /// Whether this source can handle `path` at all.
    fn supports(&self, path: &Path) -> bool;
}

/// Loads UTF-8 markdown and text files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl DocumentSource for FileLoader {
    fn load(&self, path: &Path) -> AppResult<Document> {
        let failure = |reason: String| AppError::IngestionFailure {
            path: path.to_path_buf(),
            reason,
        };

        if !path.exists() {
            return Err(failure("File not found".to_string()));
        }

        let content_type = ContentType::from_path(path)
            .ok_or_else(|| failure("Unsupported file type".to_string()))?;

        let bytes = fs::read(path).map_err(|e| failure(format!("Failed to read: {}", e)))?;
        let text = String::from_utf8(bytes).map_err(|_| failure("Not valid UTF-8".to_string()))?;

        if !is_likely_text(&text) {
            return Err(failure("Binary content not supported".to_string()));
        }

        let byte_count = text.len() as u64;
        Ok(Document::new(path.to_string_lossy(), text)
            .with_metadata("content_type", MetadataValue::from(content_type.as_str()))
            .with_metadata("bytes", byte_count))
    }

    fn supports(&self, path: &Path) -> bool {
        ContentType::from_path(path).is_some()
    }
}

/// Normalize whitespace.
///
/// - CRLF and lone CR become LF
/// - runs of non-newline whitespace collapse to a single space
/// - lines are trimmed and blank lines dropped, so newline runs collapse to one
/// - the result is trimmed
///
/// Pure and idempotent. Empty input gives empty output.
pub fn clean_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut result = String::with_capacity(normalized.len());
    for line in normalized.split('\n') {
        let mut collapsed = String::with_capacity(line.len());
        for word in line.split_whitespace() {
            if !collapsed.is_empty() {
                collapsed.push(' ');
            }
            collapsed.push_str(word);
        }

        if collapsed.is_empty() {
            continue;
        }
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&collapsed);
    }

    result
}

/// Reject content with NUL bytes or mostly control characters.
fn is_likely_text(data: &str) -> bool {
    if data.contains('\0') {
        return false;
    }

    let sample: Vec<char> = data.chars().take(1024).collect();
    if sample.is_empty() {
        return true;
    }

    let control = sample
        .iter()
        .filter(|c| c.is_control() && !c.is_whitespace())
        .count();
    control * 10 < sample.len()
}
