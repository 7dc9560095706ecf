//! grounded-rag: retrieval-augmented generation core for mixed prose and
//! tabular documents
//!
//! PDF, DOCX and TXT files are split into overlapping, boundary-aware
//! fragments. CSV and Excel files are sampled, profiled and rendered as a
//! summary fragment plus paginated markdown data fragments. Queries are
//! ranked by similarity with a threshold, assembled into grounding context,
//! and answers drawn from tables get a data-source appendix.
//!
//! Embeddings, vector storage and generation are reached through the traits
//! in [`providers`]; an in-memory store and an Ollama client are bundled.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod service;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use service::RagService;
pub use types::{
    fragment::{FileType, Fragment, FragmentMetadata},
    query::{QueryAnalysis, QueryOptions},
    response::{Citation, QueryResponse, RetrievedResult},
};
