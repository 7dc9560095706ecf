//! Document pipeline behavior on real files

use std::path::Path;
use std::sync::Arc;

use grounded_rag::ingestion::{DocumentPipeline, TextExtractor};
use grounded_rag::types::{ChunkType, FragmentMetadata};
use grounded_rag::{Error, FileType, RagConfig, Result};

struct FixedText(String);

impl TextExtractor for FixedText {
    fn extract(&self, _path: &Path, _file_type: FileType) -> Result<String> {
        Ok(self.0.clone())
    }
}

fn small_table_config() -> RagConfig {
    let mut config = RagConfig::default();
    config.tabular.rows_per_chunk = 10;
    config.tabular.display_rows = 5;
    config.tabular.sample_size = 10;
    config.tabular.max_rows_in_memory = 20;
    config
}

#[test]
fn large_csv_is_sampled_and_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.csv");
    let mut body = String::from("id,amount,placed_on\n");
    for i in 0..100 {
        body.push_str(&format!("{},{}.50,2024-01-{:02}\n", i, i * 3, i % 28 + 1));
    }
    std::fs::write(&path, body).unwrap();

    let pipeline = DocumentPipeline::new(&small_table_config()).unwrap();
    let fragments = pipeline.ingest(&path, "orders.csv").unwrap();

    let summary = &fragments[0];
    assert_eq!(summary.metadata.chunk_type(), Some(ChunkType::Summary));
    assert!(summary.content.starts_with("# CSV File Analysis\n\n**Total Rows:** 100\n"));
    assert!(summary.content.contains("**Note:** Large file detected"));
    assert!(summary.content.contains("| amount | numeric |"));

    // at most max_rows_in_memory rows survive, paged by rows_per_chunk
    let data: Vec<_> = fragments[1..].iter().collect();
    assert!(!data.is_empty() && data.len() <= 2);
    for (i, fragment) in fragments.iter().enumerate() {
        let meta = fragment.metadata.as_tabular().unwrap();
        assert_eq!(meta.chunk_index, i);
        assert_eq!(meta.total_chunks, fragments.len());
        assert_eq!(meta.total_rows, 100);
        assert_eq!(meta.sheet_index, None);
    }
}

#[test]
fn prose_uses_injected_extractor() {
    let text = "Quarterly revenue rose sharply. ".repeat(80);
    let pipeline = DocumentPipeline::new(&RagConfig::default())
        .unwrap()
        .with_extractor(Arc::new(FixedText(text)));

    let fragments = pipeline.ingest(Path::new("unused.pdf"), "report.pdf").unwrap();

    assert!(fragments.len() > 1);
    for (i, fragment) in fragments.iter().enumerate() {
        assert!(fragment.content.chars().count() <= 1000);
        match &fragment.metadata {
            FragmentMetadata::Prose(meta) => {
                assert_eq!(meta.filename, "report.pdf");
                assert_eq!(meta.file_type, FileType::Pdf);
                assert_eq!(meta.chunk_index, i);
                assert_eq!(meta.total_chunks, fragments.len());
            }
            other => panic!("expected prose metadata, got {:?}", other),
        }
    }
}

#[test]
fn blank_document_yields_no_fragments() {
    let pipeline = DocumentPipeline::new(&RagConfig::default())
        .unwrap()
        .with_extractor(Arc::new(FixedText("   \n\n ".into())));

    let fragments = pipeline.ingest(Path::new("unused.docx"), "empty.docx").unwrap();
    assert!(fragments.is_empty());
}

#[test]
fn missing_file_is_a_processing_error() {
    let pipeline = DocumentPipeline::new(&RagConfig::default()).unwrap();
    let err = pipeline
        .ingest(Path::new("/nonexistent/notes.txt"), "notes.txt")
        .unwrap_err();

    match err {
        Error::DocumentProcessing { filename, .. } => assert_eq!(filename, "notes.txt"),
        other => panic!("unexpected error: {other}"),
    }
}
