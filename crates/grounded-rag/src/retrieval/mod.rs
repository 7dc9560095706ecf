//! Retrieval: ranking and context assembly

pub mod retriever;

pub use retriever::{build_context, rank, Retriever};
