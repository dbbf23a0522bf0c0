//! Core data models for the ingestion and retrieval pipeline.
//!
//! A [`Document`] is one source PDF, a [`Page`] is one page of extracted
//! text, and a [`Chunk`] is a bounded character window of one page — the
//! unit of embedding and retrieval. Chunks carry full provenance
//! (document path, page index, sequence within page) so results can be
//! traced back to their source.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// One source PDF with its extracted pages.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub pages: Vec<Page>,
}

/// One page of a document. `text` may be empty when extraction yields
/// nothing for that page.
#[derive(Debug, Clone)]
pub struct Page {
    pub index: usize,
    pub text: String,
}

/// A contiguous character window of one page's text.
///
/// `overlap` is the number of characters shared with the preceding chunk
/// of the same page (0 for the first chunk). Concatenating a page's
/// chunks with overlaps removed reproduces the page text exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_path: PathBuf,
    pub page_index: usize,
    pub seq: usize,
    pub overlap: usize,
    pub text: String,
    pub hash: String,
}

impl Chunk {
    pub fn new(
        doc_path: &Path,
        page_index: usize,
        seq: usize,
        overlap: usize,
        text: String,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = format!("{:x}", hasher.finalize());

        Self {
            doc_path: doc_path.to_path_buf(),
            page_index,
            seq,
            overlap,
            text,
            hash,
        }
    }
}

/// A chunk returned from similarity search, with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// A file that could not be ingested. Collected during loading so one
/// bad file does not abort the rest of the corpus.
#[derive(Debug, Clone)]
pub struct IngestionFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// The result of loading a corpus directory: the documents that parsed
/// plus the per-file failures.
#[derive(Debug, Clone)]
pub struct CorpusLoad {
    pub documents: Vec<Document>,
    pub failures: Vec<IngestionFailure>,
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One entry in a chat session's append-only history.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}
