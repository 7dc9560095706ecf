//! LLM provider trait for answer generation

use async_trait::async_trait;

use crate::error::Result;

/// Sampling parameters for one generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// Trait for chat-style text generation
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server (llama3.2, phi3, etc.)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text from a system prompt and a user prompt
    async fn generate(&self, system: &str, user: &str, params: &GenerationParams) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
