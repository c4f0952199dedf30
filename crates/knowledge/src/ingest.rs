//! Corpus ingestion: discover, load, clean, chunk, embed, index.
//!
//! A file that cannot be loaded is logged and skipped. Ingestion as a whole
//! fails only when nothing usable is left.

use crate::chunk::{Chunk, ChunkPipeline};
use crate::document::Document;
use crate::embeddings::EmbeddingEngine;
use crate::parser::{clean_text, DocumentSource};
use crate::progress::{ProgressPhase, ProgressReporter};
use crate::vector_index::{IndexEntry, VectorIndex};
use grounded_core::{AppError, AppResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// A file that was not ingested, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub loaded_files: Vec<String>,
    pub skipped: Vec<SkippedFile>,
    pub chunk_count: usize,
    pub duration_secs: f64,
}

impl IngestReport {
    pub fn render(&self) -> String {
        let mut out = format!("Loaded {} files:\n", self.loaded_files.len());
        for file in &self.loaded_files {
            out.push_str(&format!("  - {}\n", file));
        }
        if !self.skipped.is_empty() {
            out.push_str(&format!("Skipped {} files:\n", self.skipped.len()));
            for skipped in &self.skipped {
                out.push_str(&format!("  - {} ({})\n", skipped.path.display(), skipped.reason));
            }
        }
        out.push_str(&format!(
            "Total chunks: {} ({:.2}s)\n",
            self.chunk_count, self.duration_secs
        ));
        out
    }
}

/// Cleaned documents and their chunks.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub documents: Vec<Document>,
    pub chunks: Vec<Chunk>,
    pub report: IngestReport,
}

/// Files under `data_dir`, recursively, in a stable order.
///
/// Hidden files and directories are ignored. A missing directory is a
/// configuration error.
pub fn discover(data_dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !data_dir.is_dir() {
        return Err(AppError::FatalConfig(format!(
            "Data directory not found: {}",
            data_dir.display()
        )));
    }

    let files = WalkDir::new(data_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

/// Load a set of documents from `paths`, cleaning each one.
///
/// Per-file failures land in the returned skip list.
pub fn load_documents(
    paths: &[PathBuf],
    source: &dyn DocumentSource,
    progress: &ProgressReporter,
) -> (Vec<Document>, Vec<SkippedFile>) {
    let mut documents = Vec::new();
    let mut skipped = Vec::new();

    for (i, path) in paths.iter().enumerate() {
        progress.report(
            ProgressPhase::Load,
            i + 1,
            paths.len(),
            format!("reading {}", path.display()),
        );

        if !source.supports(path) {
            tracing::debug!("Skipping unsupported file: {}", path.display());
            skipped.push(SkippedFile {
                path: path.clone(),
                reason: "Unsupported file type".to_string(),
            });
            continue;
        }

        match source.load(path) {
            Ok(mut document) => {
                document.text = clean_text(&document.text);
                documents.push(document);
            }
            Err(AppError::IngestionFailure { path, reason }) => {
                tracing::warn!("Skipping {}: {}", path.display(), reason);
                skipped.push(SkippedFile { path, reason });
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    (documents, skipped)
}

/// Chunk cleaned documents into a corpus.
///
/// Zero chunks overall is fatal: there is nothing to answer from.
pub fn chunk_documents(
    documents: Vec<Document>,
    skipped: Vec<SkippedFile>,
    pipeline: &ChunkPipeline,
    progress: &ProgressReporter,
    started: Instant,
) -> AppResult<Corpus> {
    let mut chunks = Vec::new();
    for (i, document) in documents.iter().enumerate() {
        chunks.extend(pipeline.process(document)?);
        progress.report(
            ProgressPhase::Chunk,
            i + 1,
            documents.len(),
            format!("{} chunks created", chunks.len()),
        );
    }

    if chunks.is_empty() {
        return Err(AppError::FatalConfig(format!(
            "No documents found: {} usable files, {} skipped, 0 chunks",
            documents.len(),
            skipped.len()
        )));
    }

    let report = IngestReport {
        loaded_files: documents.iter().map(Document::source).collect(),
        skipped,
        chunk_count: chunks.len(),
        duration_secs: started.elapsed().as_secs_f64(),
    };

    tracing::info!(
        files = report.loaded_files.len(),
        skipped = report.skipped.len(),
        chunks = report.chunk_count,
        "Ingested corpus"
    );

    Ok(Corpus {
        documents,
        chunks,
        report,
    })
}

/// Discover, load, clean and chunk everything under `data_dir`.
pub fn load_corpus(
    data_dir: &Path,
    source: &dyn DocumentSource,
    pipeline: &ChunkPipeline,
    progress: &ProgressReporter,
) -> AppResult<Corpus> {
    let started = Instant::now();

    let paths = discover(data_dir)?;
    progress.report(
        ProgressPhase::Discover,
        paths.len(),
        paths.len(),
        format!("scanned {}", data_dir.display()),
    );

    let (documents, skipped) = load_documents(&paths, source, progress);
    chunk_documents(documents, skipped, pipeline, progress, started)
}

/// Embed `chunks` and build `index` from them, replacing its contents.
pub async fn build_index(
    chunks: &[Chunk],
    engine: &EmbeddingEngine,
    index: &dyn VectorIndex,
    progress: &ProgressReporter,
) -> AppResult<()> {
    let vectors = engine.embed_chunks(chunks, progress).await?;

    let entries: Vec<IndexEntry> = vectors
        .into_iter()
        .zip(chunks.iter().cloned())
        .map(|(vector, chunk)| IndexEntry::new(vector, chunk))
        .collect();

    let count = entries.len();
    index.build(entries)?;
    progress.report(ProgressPhase::Index, count, count, "index built");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkConfig;
    use crate::embeddings::providers::TrigramProvider;
    use crate::parser::FileLoader;
    use crate::vector_index::FlatIndex;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn pipeline() -> ChunkPipeline {
        ChunkPipeline::new(ChunkConfig::default()).unwrap()
    }

    #[test]
    fn test_discover_recursive_and_sorted() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("nested")).unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join("b.md"), "b").unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::write(temp.path().join("nested").join("c.md"), "c").unwrap();
        fs::write(temp.path().join(".git").join("HEAD"), "ref").unwrap();
        fs::write(temp.path().join(".hidden.md"), "h").unwrap();

        let files = discover(temp.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.txt", "b.md", "nested/c.md"]);
    }

    #[test]
    fn test_discover_missing_dir_is_fatal() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            discover(&temp.path().join("nope")),
            Err(AppError::FatalConfig(_))
        ));
    }

    #[test]
    fn test_load_corpus_skips_bad_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("rag.md"), "# RAG\n\n\nRAG   combines retrieval and generation.").unwrap();
        fs::write(temp.path().join("chunking,md"), "Chunk overlap improves context continuity.").unwrap();
        fs::write(temp.path().join("blob.md"), b"\x00\x01binary").unwrap();
        fs::write(temp.path().join("table.csv"), "a,b").unwrap();

        let corpus = load_corpus(temp.path(), &FileLoader, &pipeline(), &ProgressReporter::silent()).unwrap();

        assert_eq!(corpus.report.loaded_files.len(), 2);
        assert_eq!(corpus.report.skipped.len(), 2);
        assert_eq!(corpus.report.chunk_count, 2);
        assert_eq!(corpus.chunks.len(), 2);

        let rag = corpus
            .documents
            .iter()
            .find(|d| d.source().ends_with("rag.md"))
            .unwrap();
        assert_eq!(rag.text, "# RAG\nRAG combines retrieval and generation.");

        let rendered = corpus.report.render();
        assert!(rendered.contains("Loaded 2 files"));
        assert!(rendered.contains("Total chunks: 2"));
    }

    #[test]
    fn test_empty_corpus_is_fatal() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("blank.md"), "   \n\n  ").unwrap();
        fs::write(temp.path().join("image.png"), "png").unwrap();

        let err = load_corpus(temp.path(), &FileLoader, &pipeline(), &ProgressReporter::silent())
            .unwrap_err();
        assert!(matches!(err, AppError::FatalConfig(_)));
        assert!(err.to_string().contains("No documents found"));
    }

    #[tokio::test]
    async fn test_build_index() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.md"), "Retrieval finds chunks.").unwrap();
        fs::write(temp.path().join("b.md"), "Generation writes answers.").unwrap();

        let corpus = load_corpus(temp.path(), &FileLoader, &pipeline(), &ProgressReporter::silent()).unwrap();
        let engine = EmbeddingEngine::new(Arc::new(TrigramProvider::new(128)), 1);
        let index = FlatIndex::default();

        build_index(&corpus.chunks, &engine, &index, &ProgressReporter::silent())
            .await
            .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.dimensions(), Some(128));
    }
}
