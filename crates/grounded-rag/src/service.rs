//! RAG service: ingestion, retrieval and grounded answers over injected
//! embedding, vector store and generation providers.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{AnswerEnhancer, PromptBuilder};
use crate::ingestion::DocumentPipeline;
use crate::providers::{EmbeddingProvider, GenerationParams, LlmProvider, VectorStoreProvider};
use crate::retrieval::Retriever;
use crate::types::{
    AssembledContext, ClearResponse, Fragment, IngestResponse, QueryAnalysis, QueryOptions,
    QueryResponse, RetrievedResult, StatsResponse, StoredFragment,
};

/// Sampling parameters for query analysis
const ANALYSIS_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.3,
    max_tokens: 300,
};

/// Wires the pipeline, retriever and enhancer to the external providers
pub struct RagService {
    config: RagConfig,
    pipeline: DocumentPipeline,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    llm: Arc<dyn LlmProvider>,
    retriever: Retriever,
    enhancer: AnswerEnhancer,
}

impl RagService {
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            "RAG service: embeddings={}, store={}, llm={} ({})",
            embedder.name(),
            store.name(),
            llm.name(),
            llm.model()
        );

        Ok(Self {
            pipeline: DocumentPipeline::new(&config)?,
            retriever: Retriever::new(Arc::clone(&store)),
            enhancer: AnswerEnhancer::new(config.tabular.max_rows_in_memory),
            config,
            embedder,
            store,
            llm,
        })
    }

    /// Replace the document pipeline (e.g. to inject a text extractor)
    pub fn with_pipeline(mut self, pipeline: DocumentPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &DocumentPipeline {
        &self.pipeline
    }

    /// Parse, embed and store one document.
    ///
    /// Nothing is stored unless every fragment was embedded.
    pub async fn ingest(&self, path: impl AsRef<Path>, filename: &str) -> Result<IngestResponse> {
        let fragments = self.fragments(path.as_ref(), filename).await?;
        if fragments.is_empty() {
            return Ok(IngestResponse::ingested(filename, 0));
        }

        let texts: Vec<String> = fragments.iter().map(|f| f.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != fragments.len() {
            return Err(Error::embedding(format!(
                "{} embeddings returned for {} fragments of {}",
                embeddings.len(),
                fragments.len(),
                filename
            )));
        }

        let stored: Vec<StoredFragment> = fragments
            .into_iter()
            .zip(embeddings)
            .map(|(fragment, embedding)| StoredFragment::new(fragment, embedding))
            .collect();
        let count = stored.len();

        self.store.upsert(stored).await?;

        tracing::info!("Ingested {} fragments from {}", count, filename);
        Ok(IngestResponse::ingested(filename, count))
    }

    /// Ingest independent files concurrently; one result per file, in order
    pub async fn ingest_all(&self, files: &[(PathBuf, String)]) -> Vec<(String, Result<IngestResponse>)> {
        let tasks = files.iter().map(|(path, filename)| async move {
            let result = self.ingest(path, filename).await;
            if let Err(e) = &result {
                tracing::warn!("Failed to ingest {}: {}", filename, e);
            }
            (filename.clone(), result)
        });
        join_all(tasks).await
    }

    /// Run the document pipeline off the async runtime
    pub async fn fragments(&self, path: &Path, filename: &str) -> Result<Vec<Fragment>> {
        let pipeline = self.pipeline.clone();
        let path = path.to_path_buf();
        let filename = filename.to_string();

        tokio::task::spawn_blocking(move || pipeline.ingest(&path, &filename))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    /// Embed the query and return ranked results
    pub async fn retrieve(&self, query: &str, limit: usize, threshold: f32) -> Result<Vec<RetrievedResult>> {
        let query_vector = self.embedder.embed(query).await?;
        self.retriever.retrieve(&query_vector, limit, threshold).await
    }

    /// Ranked results plus the context block, citations and table info
    pub async fn retrieve_and_assemble(
        &self,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Result<AssembledContext> {
        let results = self.retrieve(query, limit, threshold).await?;
        Ok(Retriever::assemble(results))
    }

    /// Answer `query` from the knowledge base.
    ///
    /// When nothing clears the similarity threshold the model is not called
    /// and [`QueryResponse::not_found`] is returned.
    pub async fn answer(&self, query: &str, options: &QueryOptions) -> Result<QueryResponse> {
        let context = self
            .retrieve_and_assemble(query, options.retrieval_limit, options.similarity_threshold)
            .await?;

        if context.is_empty() {
            tracing::info!("No fragments above {} for query", options.similarity_threshold);
            return Ok(QueryResponse::not_found());
        }

        let params = GenerationParams {
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };
        let user_prompt = PromptBuilder::user_prompt(query, &context.context_text);
        let answer = self
            .llm
            .generate(PromptBuilder::system_prompt(), &user_prompt, &params)
            .await?;

        let response = self.enhancer.enhance(&answer, &context.results);
        tracing::info!("Answered from {} fragments", context.results.len());

        Ok(QueryResponse {
            response,
            retrieved_docs: context.results.len(),
            sources: context.citations,
            data_info: context.data_info,
        })
    }

    /// Intent, topics and search terms for `query`; never fails
    pub async fn analyze_query(&self, query: &str) -> QueryAnalysis {
        let prompt = PromptBuilder::analysis_prompt(query);
        match self
            .llm
            .generate(PromptBuilder::analysis_system_prompt(), &prompt, &ANALYSIS_PARAMS)
            .await
        {
            Ok(reply) => PromptBuilder::parse_analysis(&reply).unwrap_or_else(|| {
                tracing::debug!("Unparseable query analysis, using fallback");
                QueryAnalysis::fallback(query)
            }),
            Err(e) => {
                tracing::warn!("Query analysis failed: {}", e);
                QueryAnalysis::fallback(query)
            }
        }
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        Ok(StatsResponse {
            total_documents: self.store.count().await?,
        })
    }

    /// Remove every stored fragment
    pub async fn clear(&self) -> Result<ClearResponse> {
        let removed = self.store.delete_all().await?;
        tracing::info!("Cleared {} fragments", removed);
        Ok(ClearResponse::cleared())
    }
}
