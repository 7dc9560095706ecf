//! Retrieval and answer response types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::fragment::{ChunkType, FileType, Fragment, FragmentMetadata};

/// Text returned when nothing in the knowledge base cleared the threshold
pub const NOT_FOUND_RESPONSE: &str = "I couldn't find any relevant information in the knowledge base to answer your query. Please try rephrasing your question or upload relevant documents first.";

/// A fragment matched by a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedResult {
    pub content: String,
    pub metadata: FragmentMetadata,
    /// Higher means more similar
    pub similarity: f32,
}

impl RetrievedResult {
    pub fn new(fragment: Fragment, similarity: f32) -> Self {
        Self {
            content: fragment.content,
            metadata: fragment.metadata,
            similarity,
        }
    }
}

/// Source list entry shown alongside an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub filename: String,
    pub similarity: f32,
    pub chunk_index: usize,
    pub file_type: FileType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_type: Option<ChunkType>,
}

impl Citation {
    /// Create a citation from a retrieved result
    pub fn from_result(result: &RetrievedResult) -> Self {
        Self {
            filename: result.metadata.filename().to_string(),
            similarity: result.similarity,
            chunk_index: result.metadata.chunk_index(),
            file_type: result.metadata.file_type(),
            chunk_type: result.metadata.chunk_type(),
        }
    }
}

/// What is known about one tabular source from the fragments of a single query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataInfo {
    pub file_type: FileType,
    pub total_rows: usize,
    pub headers: Vec<String>,
    /// Sheet indices represented among the retrieved fragments
    pub sheets: BTreeSet<usize>,
    /// Whether the row/column figures came from a summary fragment
    #[serde(skip)]
    pub from_summary: bool,
}

impl DataInfo {
    /// Group the tabular results by filename.
    ///
    /// Figures come from the file's summary fragment when one was retrieved,
    /// otherwise from the first (most similar) fragment of that file.
    pub fn collect(results: &[RetrievedResult]) -> BTreeMap<String, DataInfo> {
        let mut info: BTreeMap<String, DataInfo> = BTreeMap::new();

        for result in results {
            let Some(meta) = result.metadata.as_tabular() else {
                continue;
            };
            let is_summary = meta.kind.chunk_type() == ChunkType::Summary;

            let entry = info
                .entry(meta.filename.clone())
                .or_insert_with(|| DataInfo {
                    file_type: meta.file_type,
                    total_rows: meta.total_rows,
                    headers: meta.headers.clone(),
                    sheets: BTreeSet::new(),
                    from_summary: is_summary,
                });

            if is_summary && !entry.from_summary {
                entry.total_rows = meta.total_rows;
                entry.headers = meta.headers.clone();
                entry.from_summary = true;
            }
            if let Some(sheet) = meta.sheet_index {
                entry.sheets.insert(sheet);
            }
        }

        info
    }
}

/// Grounding context assembled for one query
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssembledContext {
    /// Context block handed to the model
    pub context_text: String,
    pub citations: Vec<Citation>,
    pub data_info: BTreeMap<String, DataInfo>,
    pub results: Vec<RetrievedResult>,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Answer to a user query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    pub sources: Vec<Citation>,
    pub retrieved_docs: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_info: BTreeMap<String, DataInfo>,
}

impl QueryResponse {
    /// Response used when no fragment cleared the similarity threshold
    pub fn not_found() -> Self {
        Self {
            response: NOT_FOUND_RESPONSE.to_string(),
            sources: Vec::new(),
            retrieved_docs: 0,
            data_info: BTreeMap::new(),
        }
    }
}

/// Result of ingesting one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    pub message: String,
    pub fragment_count: usize,
}

impl IngestResponse {
    pub fn ingested(filename: &str, fragment_count: usize) -> Self {
        Self {
            success: true,
            message: format!("Successfully ingested {} chunks from {}", fragment_count, filename),
            fragment_count,
        }
    }
}

/// Knowledge base statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_documents: usize,
}

/// Result of clearing the knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: String,
}

impl ClearResponse {
    pub fn cleared() -> Self {
        Self {
            success: true,
            message: "All documents cleared successfully".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fragment::{ProseMetadata, TabularChunk, TabularMetadata};

    fn tabular(filename: &str, sheet: Option<usize>, kind: TabularChunk, rows: usize) -> RetrievedResult {
        RetrievedResult {
            content: String::new(),
            metadata: FragmentMetadata::Tabular(TabularMetadata {
                filename: filename.into(),
                chunk_index: 0,
                total_chunks: 1,
                file_type: FileType::Excel,
                sheet_index: sheet,
                total_rows: rows,
                headers: vec!["id".into()],
                kind,
            }),
            similarity: 0.5,
        }
    }

    #[test]
    fn test_data_info_prefers_summary() {
        let results = vec![
            tabular("book.xlsx", Some(0), TabularChunk::Data { row_start: 0, row_end: 49 }, 80),
            tabular("book.xlsx", Some(1), TabularChunk::Summary, 120),
        ];

        let info = DataInfo::collect(&results);
        let book = &info["book.xlsx"];
        assert_eq!(book.total_rows, 120);
        assert!(book.from_summary);
        assert_eq!(book.sheets.len(), 2);
    }

    #[test]
    fn test_data_info_skips_prose() {
        let results = vec![RetrievedResult {
            content: "text".into(),
            metadata: FragmentMetadata::Prose(ProseMetadata {
                filename: "notes.txt".into(),
                chunk_index: 0,
                total_chunks: 1,
                file_type: FileType::Txt,
            }),
            similarity: 0.9,
        }];
        assert!(DataInfo::collect(&results).is_empty());
    }

    #[test]
    fn test_ingest_message() {
        let response = IngestResponse::ingested("sales.csv", 2);
        assert_eq!(response.message, "Successfully ingested 2 chunks from sales.csv");
    }
}
