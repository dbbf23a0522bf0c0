//! Error types for the indexing and answering pipeline.
//!
//! Each variant maps to one failure domain: configuration validation,
//! per-file ingestion, the embedding service, the persisted index
//! artifact, and chat-model invocation. Nothing in the core retries
//! automatically; transport-level backoff lives in the HTTP clients and
//! everything else is surfaced to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the core pipeline.
#[derive(Error, Debug)]
pub enum NormaError {
    /// Invalid configuration. Raised before any I/O is performed.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A single source file (or the corpus directory itself) could not
    /// be ingested.
    #[error("failed to ingest {path}: {reason}")]
    Ingestion { path: PathBuf, reason: String },

    /// The embedding service was unreachable or rejected the input.
    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    /// The persisted index artifact is unreadable or has an
    /// incompatible format. Recovery (rebuild) is an explicit caller
    /// decision, never automatic.
    #[error("index artifact {path} is unreadable: {reason}")]
    IndexCorrupt { path: PathBuf, reason: String },

    /// The index artifact could not be written to disk.
    #[error("failed to write index artifact {path}: {reason}")]
    IndexWrite { path: PathBuf, reason: String },

    /// The chat model call failed or timed out.
    #[error("model invocation failed: {0}")]
    ModelInvocation(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, NormaError>;
