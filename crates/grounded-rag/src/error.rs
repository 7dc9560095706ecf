//! Error types for the RAG core

use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG core errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Reading text or rows out of a source file failed
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// A document could not be turned into fragments
    #[error("Error processing document '{filename}': {source}")]
    DocumentProcessing {
        filename: String,
        #[source]
        source: Box<Error>,
    },

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector store error
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// LLM error
    #[error("Generation failed: {0}")]
    Generation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }

    /// Wrap a failure that happened while processing `filename`
    pub fn document_processing(filename: impl Into<String>, source: Error) -> Self {
        Self::DocumentProcessing {
            filename: filename.into(),
            source: Box::new(source),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector store error
    pub fn vector_store(message: impl Into<String>) -> Self {
        Self::VectorStore(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the caller supplied something the core cannot handle
    /// (the 4xx family when surfaced over HTTP).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::UnsupportedFileType(_) | Error::Config(_))
    }
}
