//! Query option and analysis types

use serde::{Deserialize, Serialize};

use crate::config::RagConfig;

/// Per-query overrides for retrieval and generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub retrieval_limit: usize,
    pub similarity_threshold: f32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

impl QueryOptions {
    /// Options taken from the configured defaults
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            temperature: config.generation.temperature,
            max_tokens: config.generation.max_tokens,
            retrieval_limit: config.retrieval.limit,
            similarity_threshold: config.retrieval.similarity_threshold,
        }
    }
}

/// Model-produced description of a user query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub intent: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, alias = "searchTerms")]
    pub search_terms: Vec<String>,
    #[serde(default = "default_complexity")]
    pub complexity: String,
}

fn default_complexity() -> String {
    "medium".to_string()
}

impl QueryAnalysis {
    /// Analysis used when the model gives nothing usable
    pub fn fallback(query: &str) -> Self {
        Self {
            intent: "Information seeking".to_string(),
            topics: vec![query.to_string()],
            search_terms: vec![query.to_string()],
            complexity: default_complexity(),
        }
    }
}
