//! Retrieval-augmented answer composition.
//!
//! Merges retrieved chunks into a context block, fills the prompt
//! template, and invokes the chat model, timing the model call alone so
//! the session can report where a turn's latency went. The template is
//! read from an external file when present; a missing file is a
//! graceful fallback to the built-in default, not an error.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{NormaError, Result};
use crate::llm::ChatModel;
use crate::models::RetrievedChunk;
use crate::retriever::Retriever;

/// Used when no template file exists at the configured path.
pub const DEFAULT_TEMPLATE: &str = "You are a technical assistant for engineering standards. \
Answer the question based on the provided context:\n\n\
Context: {context}\n\nQuestion: {question}\n\nAnswer:";

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUESTION_PLACEHOLDER: &str = "{question}";

/// A prompt template with `{context}` and `{question}` placeholders.
#[derive(Debug)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// Wrap template text, rejecting templates that are missing either
    /// placeholder.
    pub fn new(text: String) -> Result<Self> {
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !text.contains(placeholder) {
                return Err(NormaError::Configuration(format!(
                    "prompt template is missing the {} placeholder",
                    placeholder
                )));
            }
        }
        Ok(Self { text })
    }

    /// Load the template from `path`, falling back to the built-in
    /// default when the file does not exist. A file that exists but
    /// cannot be read, or that lacks a placeholder, is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::new(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    path = %path.display(),
                    "no template file, using built-in default"
                );
                Ok(Self::default())
            }
            Err(e) => Err(NormaError::Configuration(format!(
                "failed to read prompt template {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn fill(&self, context: &str, question: &str) -> String {
        self.text
            .replace(CONTEXT_PLACEHOLDER, context)
            .replace(QUESTION_PLACEHOLDER, question)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

/// Join retrieved chunk texts, most similar first, into one context
/// block.
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A generated answer with its supporting chunks and the wall-clock
/// duration of the model call alone (retrieval excluded).
#[derive(Debug)]
pub struct Answer {
    pub text: String,
    pub model_latency: Duration,
    pub sources: Vec<RetrievedChunk>,
}

/// Ties retrieval, prompt templating, and the chat model together.
pub struct AnswerComposer {
    retriever: Arc<Retriever>,
    model: Arc<dyn ChatModel>,
    template: PromptTemplate,
}

impl AnswerComposer {
    pub fn new(
        retriever: Arc<Retriever>,
        model: Arc<dyn ChatModel>,
        template: PromptTemplate,
    ) -> Self {
        Self {
            retriever,
            model,
            template,
        }
    }

    /// Answer a question: retrieve context, fill the template, call the
    /// model. The generated text is returned verbatim.
    ///
    /// The model call runs on its own task, so a caller driving an
    /// interactive loop stays responsive while the call resolves.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let sources = self.retriever.retrieve(question).await?;
        let context = build_context(&sources);
        let prompt = self.template.fill(&context, question);

        let model = Arc::clone(&self.model);
        let started = Instant::now();
        let handle = tokio::spawn(async move { model.complete(&prompt).await });
        let text = handle
            .await
            .map_err(|e| NormaError::ModelInvocation(format!("model task failed: {}", e)))??;
        let model_latency = started.elapsed();

        tracing::debug!(
            question,
            sources = sources.len(),
            model_secs = model_latency.as_secs_f64(),
            "answer composed"
        );

        Ok(Answer {
            text,
            model_latency,
            sources,
        })
    }
}
