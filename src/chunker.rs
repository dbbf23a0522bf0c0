//! Fixed-width overlapping text chunker.
//!
//! Splits each page's text into character windows of `chunk_size` with
//! `chunk_overlap` characters shared between consecutive windows. The
//! split is character-boundary based, not semantic segmentation — an
//! accepted approximation for standards prose. Chunks keep page
//! provenance and a per-page sequence index.
//!
//! Reconstruction invariant: the first chunk of a page, followed by each
//! subsequent chunk minus its leading `overlap` characters, reproduces
//! the page text exactly.

use std::path::Path;

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::models::{Chunk, Document, Page};

/// Split one page into overlapping character windows.
///
/// Fails with a configuration error when `chunk_overlap >= chunk_size`
/// (the window would never advance). An empty page yields no chunks.
pub fn split_page(doc_path: &Path, page: &Page, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    config.validate()?;

    let chars: Vec<char> = page.text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    // overlap < size, so the stride is at least one character.
    let stride = config.chunk_size - config.chunk_overlap;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut seq = 0usize;

    loop {
        let end = (start + config.chunk_size).min(chars.len());
        let text: String = chars[start..end].iter().collect();
        let overlap = if seq == 0 { 0 } else { config.chunk_overlap };
        chunks.push(Chunk::new(doc_path, page.index, seq, overlap, text));

        if end == chars.len() {
            break;
        }
        start += stride;
        seq += 1;
    }

    Ok(chunks)
}

/// Split every page of every document, in document and page order.
pub fn split_documents(documents: &[Document], config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    config.validate()?;

    let mut chunks = Vec::new();
    for document in documents {
        for page in &document.pages {
            chunks.extend(split_page(&document.path, page, config)?);
        }
    }
    Ok(chunks)
}
