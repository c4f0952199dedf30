//! Error types for the grounded question-answering engine.
//!
//! This module defines a unified error enum covering startup configuration,
//! ingestion, embedding and index consistency, readiness, backend transport,
//! and the supporting I/O and serialization categories.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the grounded engine.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid configuration, unknown provider, empty corpus.
    /// Startup cannot proceed.
    #[error("Configuration error: {0}")]
    FatalConfig(String),

    /// A single document could not be read or parsed.
    #[error("Failed to ingest {}: {reason}", path.display())]
    IngestionFailure { path: PathBuf, reason: String },

    /// Vector dimensions disagree between index and query (or within a build).
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A query arrived before the index was built.
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Network failure, timeout, rate limit or 5xx from a remote backend.
    #[error("Backend unavailable: {0}")]
    BackendTransient(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors that are not transient
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge pipeline errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the same call may succeed if retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::BackendTransient(_) | AppError::NotReady(_))
    }

    /// Whether the error must abort startup rather than fail a single query.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::FatalConfig(_) | AppError::DimensionMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
