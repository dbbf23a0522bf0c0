use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::NormaError;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub chat: ChatConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus: CorpusConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CorpusConfig {
    /// Directory scanned (non-recursively) for `*.pdf` files.
    pub directory: PathBuf,
    /// Where the serialized vector index is persisted.
    pub index_path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("standards"),
            index_path: PathBuf::from("standards_index.json"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk width in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of a page.
    /// Must be strictly less than `chunk_size`.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 350,
            chunk_overlap: 150,
        }
    }
}

impl ChunkingConfig {
    /// Validate the size/overlap relationship. Checked before any I/O:
    /// an overlap >= size would make the split window never advance.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.chunk_size == 0 {
            return Err(NormaError::Configuration(
                "chunking.chunk_size must be > 0".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(NormaError::Configuration(format!(
                "chunking.chunk_overlap ({}) must be strictly less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Results returned per question.
    pub k: usize,
    /// Candidate pool ranked before the top `k` are kept.
    pub fetch_k: usize,
    /// Capacity of the per-process question cache (LRU).
    pub cache_capacity: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 3,
            fetch_k: 10,
            cache_capacity: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Environment variable holding the API key. The key is read once
    /// and passed into the client constructor; it is never written back
    /// into the process environment.
    pub api_key_env: String,
    /// Texts per embeddings request.
    pub batch_size: usize,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn resolve_api_key(&self) -> crate::error::Result<String> {
        std::env::var(&self.api_key_env).map_err(|_| {
            NormaError::Configuration(format!(
                "{} environment variable not set",
                self.api_key_env
            ))
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub model: String,
    pub temperature: f32,
    pub api_base: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Prompt template file. Missing file falls back to the built-in
    /// default template.
    pub template_path: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            template_path: PathBuf::from("templates/prompt_template.txt"),
        }
    }
}

impl ChatConfig {
    pub fn resolve_api_key(&self) -> crate::error::Result<String> {
        std::env::var(&self.api_key_env).map_err(|_| {
            NormaError::Configuration(format!(
                "{} environment variable not set",
                self.api_key_env
            ))
        })
    }
}

/// Load configuration from a TOML file and validate it.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Load configuration if the file exists, otherwise fall back to the
/// built-in defaults. CLI flags are applied on top by the caller.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    config.chunking.validate()?;

    if config.retrieval.k < 1 {
        anyhow::bail!("retrieval.k must be >= 1");
    }
    if config.retrieval.fetch_k < config.retrieval.k {
        anyhow::bail!(
            "retrieval.fetch_k ({}) must be >= retrieval.k ({})",
            config.retrieval.fetch_k,
            config.retrieval.k
        );
    }
    if config.retrieval.cache_capacity < 1 {
        anyhow::bail!("retrieval.cache_capacity must be >= 1");
    }

    if config.embedding.model.is_empty() {
        anyhow::bail!("embedding.model must not be empty");
    }
    if config.embedding.batch_size < 1 {
        anyhow::bail!("embedding.batch_size must be >= 1");
    }

    if !(0.0..=2.0).contains(&config.chat.temperature) {
        anyhow::bail!("chat.temperature must be in [0.0, 2.0]");
    }

    Ok(())
}
