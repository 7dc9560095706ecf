//! Configuration for the RAG core

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Prose chunking
    pub chunking: ChunkingConfig,
    /// CSV / Excel processing
    pub tabular: TabularConfig,
    /// Retrieval defaults
    pub retrieval: RetrievalConfig,
    /// Generation defaults
    pub generation: GenerationConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Ollama endpoint
    pub ollama: OllamaConfig,
}

impl RagConfig {
    /// Load a TOML configuration file. Missing sections take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: RagConfig = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.tabular.validate()?;
        self.retrieval.validate()?;

        if self.embeddings.request_concurrency == 0 {
            return Err(Error::Config("embeddings.request_concurrency must be > 0".into()));
        }
        if self.ollama.base_url.trim().is_empty() {
            return Err(Error::Config("ollama.base_url must not be empty".into()));
        }
        Ok(())
    }
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters shared by consecutive windows
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize { 1000 }
fn default_chunk_overlap() -> usize { 200 }

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Tabular (CSV / Excel) processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularConfig {
    /// Sampled rows per data fragment
    #[serde(default = "default_rows_per_chunk")]
    pub rows_per_chunk: usize,
    /// Rows rendered inside one data fragment
    #[serde(default = "default_display_rows")]
    pub display_rows: usize,
    /// Rows kept unconditionally before the stride kicks in
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    /// Retained-row cap; also the large-table threshold
    #[serde(default = "default_max_rows_in_memory")]
    pub max_rows_in_memory: usize,
    /// Cell width before truncation in data fragments
    #[serde(default = "default_max_cell_chars")]
    pub max_cell_chars: usize,
    /// Sample values shown per column in the summary table
    #[serde(default = "default_summary_sample_values")]
    pub summary_sample_values: usize,
}

fn default_rows_per_chunk() -> usize { 50 }
fn default_display_rows() -> usize { 20 }
fn default_sample_size() -> usize { 1000 }
fn default_max_rows_in_memory() -> usize { 10_000 }
fn default_max_cell_chars() -> usize { 50 }
fn default_summary_sample_values() -> usize { 3 }

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            rows_per_chunk: default_rows_per_chunk(),
            display_rows: default_display_rows(),
            sample_size: default_sample_size(),
            max_rows_in_memory: default_max_rows_in_memory(),
            max_cell_chars: default_max_cell_chars(),
            summary_sample_values: default_summary_sample_values(),
        }
    }
}

impl TabularConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rows_per_chunk == 0 || self.display_rows == 0 || self.sample_size == 0 {
            return Err(Error::Config(
                "tabular.rows_per_chunk, display_rows and sample_size must be > 0".into(),
            ));
        }
        if self.display_rows > self.rows_per_chunk {
            return Err(Error::Config(format!(
                "tabular.display_rows ({}) exceeds tabular.rows_per_chunk ({})",
                self.display_rows, self.rows_per_chunk
            )));
        }
        if self.max_rows_in_memory < self.sample_size {
            return Err(Error::Config(
                "tabular.max_rows_in_memory must be >= tabular.sample_size".into(),
            ));
        }
        // Room for the "..." suffix
        if self.max_cell_chars < 4 {
            return Err(Error::Config("tabular.max_cell_chars must be >= 4".into()));
        }
        Ok(())
    }
}

/// Retrieval defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum results returned
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Minimum similarity kept
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

fn default_limit() -> usize { 5 }
fn default_similarity_threshold() -> f32 { 0.3 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(Error::Config("retrieval.limit must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::Config(format!(
                "retrieval.similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// Generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 1000 }

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name
    #[serde(default = "default_embed_model")]
    pub model: String,
    /// Embedding dimensions
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Embedding requests in flight at once during batch embedding
    #[serde(default = "default_request_concurrency")]
    pub request_concurrency: usize,
}

fn default_embed_model() -> String { "nomic-embed-text".to_string() }
fn default_dimensions() -> usize { 768 }
fn default_request_concurrency() -> usize { 8 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embed_model(),
            dimensions: default_dimensions(),
            request_concurrency: default_request_concurrency(),
        }
    }
}

/// Ollama configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used for generation
    #[serde(default = "default_generate_model")]
    pub generate_model: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after the first failed attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String { "http://localhost:11434".to_string() }
fn default_generate_model() -> String { "llama3.2:3b".to_string() }
fn default_timeout_secs() -> u64 { 120 }
fn default_max_retries() -> u32 { 2 }

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            generate_model: default_generate_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}
