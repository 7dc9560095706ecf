//! Similarity-threshold retrieval and grounding context assembly

use std::sync::Arc;

use crate::error::Result;
use crate::providers::{VectorMatch, VectorStoreProvider};
use crate::types::{AssembledContext, Citation, DataInfo, RetrievedResult};

/// Ranks vector store candidates and turns them into model context
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStoreProvider>,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStoreProvider>) -> Self {
        Self { store }
    }

    /// Results for `query_vector`, most similar first.
    ///
    /// At most `limit` results, each with `similarity >= threshold`. No
    /// match is an empty vector, not an error.
    pub async fn retrieve(
        &self,
        query_vector: &[f32],
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievedResult>> {
        let candidates = self.store.query(query_vector, limit).await?;
        let fetched = candidates.len();
        let results = rank(candidates, limit, threshold);

        tracing::debug!(
            "Retrieved {} of {} candidates from {} (threshold {})",
            results.len(),
            fetched,
            self.store.name(),
            threshold
        );
        Ok(results)
    }

    /// Context text, citations and per-file table info for `results`
    pub fn assemble(results: Vec<RetrievedResult>) -> AssembledContext {
        AssembledContext {
            context_text: build_context(&results),
            citations: results.iter().map(Citation::from_result).collect(),
            data_info: DataInfo::collect(&results),
            results,
        }
    }
}

/// Sort descending, drop anything under `threshold`, keep the first `limit`.
///
/// Stores make no ordering promise, so the sort is always applied. NaN
/// scores never pass the threshold.
pub fn rank(candidates: Vec<VectorMatch>, limit: usize, threshold: f32) -> Vec<RetrievedResult> {
    let mut results: Vec<RetrievedResult> = candidates
        .into_iter()
        .filter(|c| c.similarity >= threshold)
        .map(|c| RetrievedResult::new(c.fragment, c.similarity))
        .collect();

    results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    results.truncate(limit);
    results
}

/// `Source <n> (<filename>):` blocks separated by `---`
pub fn build_context(results: &[RetrievedResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let filename = result.metadata.filename();
            let source = if filename.is_empty() { "Unknown source" } else { filename };
            format!("Source {} ({}):\n{}\n", i + 1, source, result.content)
        })
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}
