//! Persisted vector index over embedded chunks.
//!
//! [`VectorIndex::build`] chunks a loaded corpus and embeds the chunks
//! in batches; [`search`](VectorIndex::search) embeds a query and ranks
//! every entry by cosine similarity. The index is persisted as a
//! versioned, data-only JSON artifact written atomically (temp file +
//! rename), so a crash mid-write never leaves a partial artifact.
//!
//! Trust boundary: the artifact is only ever produced by this crate's
//! own [`save`](VectorIndex::save) and parsed as plain data — loading
//! cannot execute embedded logic. Even so, `index_path` should never
//! point at files from untrusted sources.
//!
//! [`ensure_index`] implements the build-or-load lifecycle: an existing
//! artifact is loaded verbatim and ingestion is skipped entirely, even
//! if the corpus directory has changed since the build. Callers wanting
//! freshness delete the artifact (CLI: `--force`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chunker;
use crate::config::ChunkingConfig;
use crate::embedding::{cosine_similarity, EmbeddingClient};
use crate::error::{NormaError, Result};
use crate::loader;
use crate::models::{Chunk, Document, IngestionFailure, RetrievedChunk};

/// Bumped whenever the on-disk layout changes; a mismatch on load is
/// reported as corruption, never silently migrated.
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// A similarity index mapping embedding vectors back to their chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    version: u32,
    model: String,
    dims: usize,
    chunk_size: usize,
    chunk_overlap: usize,
    built_at: DateTime<Utc>,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Build an index from loaded documents: chunk every page, embed the
    /// chunk texts in batches, and pair vectors with their chunks.
    ///
    /// Whitespace-only chunks are dropped before embedding (the service
    /// rejects empty input). Embedding failures propagate; there is no
    /// retry here beyond the client's own transport backoff.
    pub async fn build(
        documents: &[Document],
        chunking: &ChunkingConfig,
        embedder: &dyn EmbeddingClient,
        batch_size: usize,
    ) -> Result<Self> {
        let chunks: Vec<Chunk> = chunker::split_documents(documents, chunking)?
            .into_iter()
            .filter(|c| !c.text.trim().is_empty())
            .collect();

        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            model = embedder.model_name(),
            "building vector index"
        );

        let mut entries = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(NormaError::EmbeddingService(format!(
                    "batch returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            for (chunk, embedding) in batch.iter().cloned().zip(vectors) {
                entries.push(IndexEntry { chunk, embedding });
            }
        }

        let dims = entries.first().map(|e| e.embedding.len()).unwrap_or(0);

        Ok(Self {
            version: FORMAT_VERSION,
            model: embedder.model_name().to_string(),
            dims,
            chunk_size: chunking.chunk_size,
            chunk_overlap: chunking.chunk_overlap,
            built_at: Utc::now(),
            entries,
        })
    }

    /// Serialize to `path` atomically: write a sibling temp file, then
    /// rename over the target.
    pub fn save(&self, path: &Path) -> Result<()> {
        let write_err = |reason: String| NormaError::IndexWrite {
            path: path.to_path_buf(),
            reason,
        };

        let json = serde_json::to_vec(self).map_err(|e| write_err(e.to_string()))?;

        // Sibling path keeps the rename on one filesystem.
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, &json).map_err(|e| write_err(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| write_err(e.to_string()))?;

        tracing::info!(path = %path.display(), entries = self.entries.len(), "index saved");
        Ok(())
    }

    /// Deserialize a previously persisted index.
    ///
    /// Unreadable content, an unparsable payload, a version mismatch, or
    /// inconsistent vector dimensions all surface as
    /// [`NormaError::IndexCorrupt`]. Recovery (rebuilding) is the
    /// caller's explicit decision.
    pub fn load(path: &Path) -> Result<Self> {
        let corrupt = |reason: String| NormaError::IndexCorrupt {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = std::fs::read(path).map_err(|e| corrupt(format!("read failed: {}", e)))?;
        let index: VectorIndex =
            serde_json::from_slice(&bytes).map_err(|e| corrupt(format!("parse failed: {}", e)))?;

        if index.version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {} (expected {})",
                index.version, FORMAT_VERSION
            )));
        }
        if index.entries.iter().any(|e| e.embedding.len() != index.dims) {
            return Err(corrupt("inconsistent vector dimensions".to_string()));
        }

        Ok(index)
    }

    /// Embed `query` and return the `k` most similar chunks out of a
    /// `fetch_k`-sized candidate pool, most similar first.
    ///
    /// Ties break on chunk provenance so results are deterministic for a
    /// fixed index and embedding output.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
        embedder: &dyn EmbeddingClient,
    ) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(NormaError::Configuration("k must be >= 1".to_string()));
        }
        if fetch_k < k {
            return Err(NormaError::Configuration(format!(
                "fetch_k ({}) must be >= k ({})",
                fetch_k, k
            )));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = embedder
            .embed_batch(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                NormaError::EmbeddingService("empty embedding response".to_string())
            })?;

        let mut scored: Vec<RetrievedChunk> = self
            .entries
            .iter()
            .map(|entry| RetrievedChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&query_vec, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.doc_path.cmp(&b.chunk.doc_path))
                .then_with(|| a.chunk.page_index.cmp(&b.chunk.page_index))
                .then_with(|| a.chunk.seq.cmp(&b.chunk.seq))
        });

        scored.truncate(fetch_k);
        scored.truncate(k);
        Ok(scored)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of distinct source documents represented in the index.
    pub fn document_count(&self) -> usize {
        let mut paths: Vec<&Path> = self.entries.iter().map(|e| e.chunk.doc_path.as_path()).collect();
        paths.sort();
        paths.dedup();
        paths.len()
    }
}

/// Build-or-load: load the persisted artifact when it exists (skipping
/// ingestion and embedding entirely), otherwise ingest the directory,
/// build, and save.
///
/// A pure function of its inputs — any process-wide memoization belongs
/// to the caller. Returns per-file ingestion failures alongside the
/// index (empty when the index was loaded from disk).
pub async fn ensure_index(
    directory: &Path,
    index_path: &Path,
    chunking: &ChunkingConfig,
    embedder: &dyn EmbeddingClient,
    batch_size: usize,
) -> Result<(VectorIndex, Vec<IngestionFailure>)> {
    if index_path.exists() {
        tracing::info!(
            path = %index_path.display(),
            "loading persisted index; current directory contents are not re-checked"
        );
        let index = VectorIndex::load(index_path)?;
        return Ok((index, Vec::new()));
    }

    let load = loader::load_directory(directory).await?;
    if load.documents.is_empty() {
        let reason = if load.failures.is_empty() {
            "no PDF files found in directory".to_string()
        } else {
            format!("all {} PDF files failed to parse", load.failures.len())
        };
        return Err(NormaError::Ingestion {
            path: directory.to_path_buf(),
            reason,
        });
    }

    let index = VectorIndex::build(&load.documents, chunking, embedder, batch_size).await?;
    index.save(index_path)?;
    Ok((index, load.failures))
}

/// `norma index` — build-or-load the index and print corpus stats.
///
/// `--force` removes any existing artifact first; it is also the
/// documented recovery path for a corrupt artifact.
pub async fn run_index(config: &crate::config::Config, force: bool) -> anyhow::Result<()> {
    use crate::embedding::OpenAiEmbeddings;

    let index_path = &config.corpus.index_path;

    if force && index_path.exists() {
        std::fs::remove_file(index_path)?;
        println!("removed existing index at {}", index_path.display());
    }

    let api_key = config.embedding.resolve_api_key()?;
    let embedder = OpenAiEmbeddings::new(&config.embedding, api_key)?;

    let loaded_from_disk = index_path.exists();
    let result = ensure_index(
        &config.corpus.directory,
        index_path,
        &config.chunking,
        &embedder,
        config.embedding.batch_size,
    )
    .await;

    let (index, failures) = match result {
        Ok(ok) => ok,
        Err(e @ NormaError::IndexCorrupt { .. }) => {
            return Err(anyhow::Error::new(e)
                .context("rerun with --force to rebuild from the source directory"));
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "index {}",
        if loaded_from_disk { "loaded" } else { "built" }
    );
    println!("  path: {}", index_path.display());
    println!("  embedding model: {}", index.model_name());
    println!("  documents: {}", index.document_count());
    println!("  chunks: {}", index.len());
    if !failures.is_empty() {
        println!("  skipped files: {}", failures.len());
        for failure in &failures {
            println!("    {}: {}", failure.path.display(), failure.reason);
        }
    }
    println!("ok");

    Ok(())
}
