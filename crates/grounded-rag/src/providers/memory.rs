//! In-memory vector store.
//!
//! Vectors live in a `Vec` behind a `parking_lot::RwLock`; search is
//! brute-force cosine similarity over everything stored.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::types::StoredFragment;

use super::vector_store::{VectorMatch, VectorStoreProvider};

/// In-memory store for tests, the CLI and small knowledge bases
#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<StoredFragment>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn dimensions(&self) -> Option<usize> {
        self.entries.read().first().map(|e| e.embedding.len())
    }
}

fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn upsert(&self, fragments: Vec<StoredFragment>) -> Result<()> {
        let expected = self
            .dimensions()
            .or_else(|| fragments.first().map(|f| f.embedding.len()));
        if let Some(dims) = expected {
            if let Some(bad) = fragments.iter().find(|f| f.embedding.len() != dims) {
                return Err(Error::vector_store(format!(
                    "dimension mismatch: expected {}, got {}",
                    dims,
                    bad.embedding.len()
                )));
            }
        }

        let mut entries = self.entries.write();
        for fragment in fragments {
            match entries.iter_mut().find(|e| e.id == fragment.id) {
                Some(existing) => *existing = fragment,
                None => entries.push(fragment),
            }
        }
        Ok(())
    }

    async fn query(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorMatch>> {
        let entries = self.entries.read();
        let mut scored: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_sim(query_embedding, &e.embedding)))
            .collect();

        // Partition the best `top_k` to the front without ordering them
        if top_k == 0 {
            scored.clear();
        } else if scored.len() > top_k {
            scored.select_nth_unstable_by(top_k - 1, |a, b| b.1.total_cmp(&a.1));
            scored.truncate(top_k);
        }

        Ok(scored
            .into_iter()
            .map(|(i, similarity)| VectorMatch {
                fragment: entries[i].fragment.clone(),
                similarity,
            })
            .collect())
    }

    async fn delete_all(&self) -> Result<usize> {
        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
