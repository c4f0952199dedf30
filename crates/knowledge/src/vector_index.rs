//! In-memory vector index.
//!
//! `FlatIndex` keeps every entry in an immutable snapshot. Readers clone the
//! current `Arc<Snapshot>` and scan it without holding the lock; writers
//! build a new snapshot and swap it in under the write lock. A search
//! therefore never observes a partially applied `build` or `add`.

use crate::chunk::Chunk;
use grounded_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::{Arc, RwLock};

/// Similarity metric. Higher scores are always more similar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    /// `1 / (1 + euclidean distance)`
    L2,
}

impl Metric {
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::Cosine => cosine_similarity(a, b),
            Metric::L2 => {
                let distance = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| (x - y) * (x - y))
                    .sum::<f32>()
                    .sqrt();
                1.0 / (1.0 + distance)
            }
        }
    }
}

/// Cosine similarity; zero when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A vector and the chunk it was computed from.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

impl IndexEntry {
    pub fn new(vector: Vec<f32>, chunk: Chunk) -> Self {
        Self { vector, chunk }
    }
}

/// A search hit. `rank` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
    pub rank: usize,
}

/// Storage and nearest-neighbor search over embedded chunks.
pub trait VectorIndex: Send + Sync {
    /// Replace the whole index with `entries`.
    fn build(&self, entries: Vec<IndexEntry>) -> AppResult<()>;

    /// Append entries to a built index.
    fn add(&self, entries: Vec<IndexEntry>) -> AppResult<()>;

    /// Up to `k` entries by descending similarity.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<ScoredChunk>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension, once built.
    fn dimensions(&self) -> Option<usize>;

    fn is_ready(&self) -> bool;
}

#[derive(Debug)]
struct StoredEntry {
    vector: Vec<f32>,
    chunk: Chunk,
    seq: u64,
}

#[derive(Debug)]
struct Snapshot {
    dimensions: usize,
    entries: Vec<Arc<StoredEntry>>,
    next_seq: u64,
}

/// Exact linear-scan index.
#[derive(Debug, Default)]
pub struct FlatIndex {
    metric: Metric,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
}

impl FlatIndex {
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            snapshot: RwLock::new(None),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    fn current(&self) -> Option<Arc<Snapshot>> {
        // A poisoned lock still holds a complete snapshot
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn not_initialized() -> AppError {
        AppError::NotReady("Vector index not initialized; build it first".to_string())
    }

    fn check_entries(dimensions: usize, entries: &[IndexEntry]) -> AppResult<()> {
        for entry in entries {
            if entry.vector.len() != dimensions {
                return Err(AppError::DimensionMismatch {
                    expected: dimensions,
                    actual: entry.vector.len(),
                });
            }
        }
        Ok(())
    }

    fn store(entries: Vec<IndexEntry>, first_seq: u64) -> Vec<Arc<StoredEntry>> {
        entries
            .into_iter()
            .zip(first_seq..)
            .map(|(entry, seq)| {
                Arc::new(StoredEntry {
                    vector: entry.vector,
                    chunk: entry.chunk,
                    seq,
                })
            })
            .collect()
    }
}

impl VectorIndex for FlatIndex {
    fn build(&self, entries: Vec<IndexEntry>) -> AppResult<()> {
        let dimensions = entries
            .first()
            .map(|e| e.vector.len())
            .ok_or_else(|| AppError::FatalConfig("No corpus available to index".to_string()))?;

        if dimensions == 0 {
            return Err(AppError::FatalConfig(
                "Cannot index zero-length vectors".to_string(),
            ));
        }
        Self::check_entries(dimensions, &entries)?;

        let count = entries.len() as u64;
        let snapshot = Arc::new(Snapshot {
            dimensions,
            entries: Self::store(entries, 0),
            next_seq: count,
        });

        let mut guard = self.snapshot.write().map_err(|_| {
            AppError::Knowledge("Vector index lock poisoned".to_string())
        })?;
        *guard = Some(snapshot);

        tracing::info!(entries = count, dimensions, "Built vector index");
        Ok(())
    }

    fn add(&self, entries: Vec<IndexEntry>) -> AppResult<()> {
        let mut guard = self.snapshot.write().map_err(|_| {
            AppError::Knowledge("Vector index lock poisoned".to_string())
        })?;

        let current = guard.as_ref().ok_or_else(Self::not_initialized)?;
        Self::check_entries(current.dimensions, &entries)?;

        if entries.is_empty() {
            return Ok(());
        }

        let added = entries.len() as u64;
        let mut stored = current.entries.clone();
        stored.extend(Self::store(entries, current.next_seq));

        let snapshot = Arc::new(Snapshot {
            dimensions: current.dimensions,
            entries: stored,
            next_seq: current.next_seq + added,
        });
        *guard = Some(snapshot);

        tracing::debug!(added, "Appended to vector index");
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<ScoredChunk>> {
        let snapshot = self.current().ok_or_else(Self::not_initialized)?;

        if query.len() != snapshot.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: snapshot.dimensions,
                actual: query.len(),
            });
        }

        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, &StoredEntry)> = snapshot
            .entries
            .iter()
            .map(|entry| (self.metric.score(query, &entry.vector), entry.as_ref()))
            .collect();

        scored.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.seq.cmp(&b.seq))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(i, (score, entry))| ScoredChunk {
                chunk: entry.chunk.clone(),
                score,
                rank: i + 1,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.current().map(|s| s.entries.len()).unwrap_or(0)
    }

    fn dimensions(&self) -> Option<usize> {
        self.current().map(|s| s.dimensions)
    }

    fn is_ready(&self) -> bool {
        self.current().is_some()
    }
}
