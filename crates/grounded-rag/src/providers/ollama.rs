//! Ollama client and the embedding / generation providers built on it

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::RagConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{GenerationParams, LlmProvider};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    client: Client,
    base_url: String,
    embed_model: String,
    generate_model: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &RagConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ollama.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: config.ollama.base_url.trim_end_matches('/').to_string(),
            embed_model: config.embeddings.model.clone(),
            generate_model: config.ollama.generate_model.clone(),
            max_retries: config.ollama.max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < self.max_retries => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding with retry
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let url = url.as_str();

        self.retry_request(|| async move {
            let request = EmbedRequest {
                model: &self.embed_model,
                prompt: text,
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(Error::embedding(format!(
                    "Embedding failed: HTTP {}",
                    response.status()
                )));
            }

            let body: EmbedResponse = response
                .json()
                .await
                .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

            Ok(body.embedding)
        })
        .await
    }

    /// Generate a completion with retry
    pub async fn generate(&self, system: &str, prompt: &str, params: &GenerationParams) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let url = url.as_str();

        tracing::info!("Generating with model: {}", self.generate_model);

        self.retry_request(|| async move {
            let request = GenerateRequest {
                model: &self.generate_model,
                system,
                prompt,
                stream: false,
                options: GenerateOptions {
                    temperature: params.temperature,
                    num_predict: params.max_tokens,
                },
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::generation(format!("Generation request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::generation(format!(
                    "Generation failed: HTTP {} - {}",
                    status, body
                )));
            }

            let body: GenerateResponse = response
                .json()
                .await
                .map_err(|e| Error::generation(format!("Failed to parse generation response: {}", e)))?;

            Ok(body.response)
        })
        .await
    }
}

/// Ollama embedding provider (nomic-embed-text or similar)
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
    /// Concurrent embedding requests per batch
    concurrency: usize,
}

impl OllamaEmbedder {
    pub fn from_client(client: Arc<OllamaClient>, config: &RagConfig) -> Self {
        Self {
            client,
            dimensions: config.embeddings.dimensions,
            concurrency: config.embeddings.request_concurrency.max(1),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // One request per text; `buffered` keeps input order
        let requests: Vec<_> = texts.iter().map(|text| self.client.embed(text)).collect();
        stream::iter(requests)
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama generation provider
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaLlm {
    pub fn from_client(client: Arc<OllamaClient>) -> Self {
        let model = client.generate_model.clone();
        Self { client, model }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, system: &str, user: &str, params: &GenerationParams) -> Result<String> {
        self.client.generate(system, user, params).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Shared client split into both providers
pub fn ollama_providers(config: &RagConfig) -> Result<(OllamaEmbedder, OllamaLlm)> {
    let client = Arc::new(OllamaClient::new(config)?);
    Ok((
        OllamaEmbedder::from_client(Arc::clone(&client), config),
        OllamaLlm::from_client(client),
    ))
}
