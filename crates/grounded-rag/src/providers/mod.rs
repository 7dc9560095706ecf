//! Provider abstractions for embeddings, generation and vector storage
//!
//! The RAG core only talks to these traits. `memory` and `ollama` hold the
//! bundled implementations.

pub mod embedding;
pub mod llm;
pub mod memory;
pub mod ollama;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::{GenerationParams, LlmProvider};
pub use memory::InMemoryVectorStore;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use vector_store::{VectorMatch, VectorStoreProvider};
