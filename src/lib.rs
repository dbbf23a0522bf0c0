//! # Norma
//!
//! A retrieval-augmented question answering assistant for PDF technical
//! standards.
//!
//! Norma ingests a directory of standards PDFs, splits the extracted
//! page text into overlapping chunks, embeds the chunks via a hosted
//! embedding API, and persists a similarity index. Questions retrieve
//! the most relevant chunks, which are assembled into a prompt and
//! forwarded to a chat model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌─────────────┐
//! │  Loader  │──▶│   Chunker    │──▶│ VectorIndex │──▶ artifact (JSON)
//! │ PDF dir  │   │ char windows │   │ embed+save  │
//! └──────────┘   └──────────────┘   └──────┬──────┘
//!                                          │
//!                   ┌──────────────────────┤
//!                   ▼                      ▼
//!             ┌───────────┐         ┌────────────┐
//!             │ Retriever │────────▶│  Composer  │──▶ chat model
//!             │ k + cache │         │  template  │
//!             └───────────┘         └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! norma index --dir ./standards      # build (or load) the index
//! norma ask "What is the minimum wall thickness?"
//! norma chat                         # interactive session
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`loader`] | Parallel PDF ingestion |
//! | [`chunker`] | Overlapping character-window chunking |
//! | [`embedding`] | Embedding capability + OpenAI client |
//! | [`index`] | Persisted vector index, build-or-load |
//! | [`retriever`] | Query policy + LRU question cache |
//! | [`llm`] | Chat-model capability + OpenAI client |
//! | [`composer`] | Context assembly and prompt templating |
//! | [`chat`] | Interactive session |

pub mod chat;
pub mod chunker;
pub mod composer;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod llm;
pub mod loader;
pub mod models;
pub mod retriever;
