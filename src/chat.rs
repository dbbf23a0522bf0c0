//! Interactive chat session over the answering pipeline.
//!
//! A thin terminal surface: it owns the append-only conversation
//! history, forwards questions to the [`AnswerComposer`], and prints
//! answers with a latency breakdown (total / model / retrieval).
//! Turns are serialized — a new question waits for the previous answer.
//! A failed model call prints a visible failure message; the question
//! stays in history so the user can retry.

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncBufReadExt;

use crate::composer::{Answer, AnswerComposer, PromptTemplate};
use crate::config::Config;
use crate::embedding::{EmbeddingClient, OpenAiEmbeddings};
use crate::index::ensure_index;
use crate::llm::{ChatModel, OpenAiChat};
use crate::models::{ConversationTurn, Role};
use crate::retriever::Retriever;

pub struct ChatSession {
    composer: AnswerComposer,
    history: Vec<ConversationTurn>,
}

impl ChatSession {
    pub fn new(composer: AnswerComposer) -> Self {
        Self {
            composer,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Submit one question. The user turn is recorded before the model
    /// is invoked, so it survives a failed call.
    pub async fn submit(&mut self, question: &str) -> crate::error::Result<Answer> {
        self.history.push(ConversationTurn {
            role: Role::User,
            text: question.to_string(),
        });

        let answer = self.composer.answer(question).await?;

        self.history.push(ConversationTurn {
            role: Role::Assistant,
            text: answer.text.clone(),
        });
        Ok(answer)
    }

    /// Read questions from stdin until EOF or `exit`/`quit`.
    pub async fn run(&mut self) -> Result<()> {
        let interactive = atty::is(atty::Stream::Stdin);
        if interactive {
            println!("Ask about your standards. Type 'exit' to quit.");
        }

        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

        loop {
            if interactive {
                print!("you> ");
                std::io::stdout().flush()?;
            }

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if question == "exit" || question == "quit" {
                break;
            }

            let turn_started = Instant::now();
            match self.submit(question).await {
                Ok(answer) => {
                    let total = turn_started.elapsed();
                    let model = answer.model_latency;
                    println!();
                    println!("{}", answer.text);
                    println!();
                    println!(
                        "({:.2}s total | {:.2}s model | {:.2}s retrieval)",
                        total.as_secs_f64(),
                        model.as_secs_f64(),
                        total.saturating_sub(model).as_secs_f64()
                    );
                }
                Err(e) => {
                    println!("answer failed: {}", e);
                }
            }
        }

        Ok(())
    }
}

/// Wire the full pipeline from config: build-or-load the index, then
/// assemble retriever, template, and chat client.
pub async fn build_composer(config: &Config) -> Result<AnswerComposer> {
    let embed_key = config.embedding.resolve_api_key()?;
    let embedder: Arc<dyn EmbeddingClient> =
        Arc::new(OpenAiEmbeddings::new(&config.embedding, embed_key)?);

    let (index, failures) = ensure_index(
        &config.corpus.directory,
        &config.corpus.index_path,
        &config.chunking,
        embedder.as_ref(),
        config.embedding.batch_size,
    )
    .await?;

    for failure in &failures {
        tracing::warn!(
            path = %failure.path.display(),
            "file skipped during indexing: {}",
            failure.reason
        );
    }

    let retriever = Arc::new(Retriever::new(
        Arc::new(index),
        embedder,
        config.retrieval.k,
        config.retrieval.fetch_k,
        config.retrieval.cache_capacity,
    ));

    let chat_key = config.chat.resolve_api_key()?;
    let model: Arc<dyn ChatModel> = Arc::new(OpenAiChat::new(&config.chat, chat_key)?);
    let template = PromptTemplate::load(&config.chat.template_path)?;

    Ok(AnswerComposer::new(retriever, model, template))
}

/// One-shot question answering.
pub async fn run_ask(config: &Config, question: &str) -> Result<()> {
    let composer = build_composer(config).await?;

    let started = Instant::now();
    let answer = composer.answer(question).await?;
    let total = started.elapsed();

    println!("{}", answer.text);
    println!();
    println!(
        "({:.2}s total | {:.2}s model | {:.2}s retrieval)",
        total.as_secs_f64(),
        answer.model_latency.as_secs_f64(),
        total.saturating_sub(answer.model_latency).as_secs_f64()
    );
    Ok(())
}

/// Interactive chat loop.
pub async fn run_chat(config: &Config) -> Result<()> {
    let composer = build_composer(config).await?;
    let mut session = ChatSession::new(composer);
    session.run().await
}
