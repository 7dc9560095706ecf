//! Document pipeline: dispatch by extension to prose chunking or tabular
//! processing and attach fragment metadata.

use std::path::Path;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::types::{FileType, Fragment, FragmentMetadata, ProseMetadata};

use super::chunker::TextSplitter;
use super::extract::{FileExtractor, TextExtractor};
use super::table_reader;
use super::tabular::{SampledTable, TabularProcessor};

/// Converts one file into its fragment sequence(s)
#[derive(Clone)]
pub struct DocumentPipeline {
    splitter: TextSplitter,
    tabular: TabularProcessor,
    extractor: Arc<dyn TextExtractor>,
}

impl DocumentPipeline {
    /// Pipeline with the bundled file extractor
    pub fn new(config: &RagConfig) -> Result<Self> {
        Ok(Self {
            splitter: TextSplitter::from_config(&config.chunking)?,
            tabular: TabularProcessor::new(config.tabular.clone()),
            extractor: Arc::new(FileExtractor),
        })
    }

    /// Replace the prose extractor
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Fragments for the file at `path`, typed by the extension of `filename`.
    ///
    /// Either every fragment is returned or an error; failures other than an
    /// unknown extension are wrapped in [`Error::DocumentProcessing`].
    pub fn ingest(&self, path: &Path, filename: &str) -> Result<Vec<Fragment>> {
        let file_type = FileType::from_filename(filename).ok_or_else(|| {
            let ext = filename
                .rsplit_once('.')
                .map(|(_, ext)| format!(".{}", ext.to_lowercase()))
                .unwrap_or_else(|| filename.to_string());
            Error::UnsupportedFileType(ext)
        })?;

        tracing::info!("Processing {} as {}", filename, file_type);

        let fragments = match file_type {
            FileType::Csv => self.process_csv(path, filename),
            FileType::Excel => self.process_excel(path, filename),
            FileType::Pdf | FileType::Docx | FileType::Txt => {
                self.process_prose(path, filename, file_type)
            }
        }
        .map_err(|e| Error::document_processing(filename, e))?;

        tracing::info!("{} -> {} fragments", filename, fragments.len());
        Ok(fragments)
    }

    fn process_prose(&self, path: &Path, filename: &str, file_type: FileType) -> Result<Vec<Fragment>> {
        let text = self.extractor.extract(path, file_type)?;
        let pieces = self.splitter.split(&text);
        let total_chunks = pieces.len();

        if total_chunks == 0 {
            tracing::warn!("{} produced no text", filename);
        }

        Ok(pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| {
                Fragment::new(
                    content,
                    FragmentMetadata::Prose(ProseMetadata {
                        filename: filename.to_string(),
                        chunk_index,
                        total_chunks,
                        file_type,
                    }),
                )
            })
            .collect())
    }

    fn process_csv(&self, path: &Path, filename: &str) -> Result<Vec<Fragment>> {
        let table = table_reader::read_csv(path, &self.tabular)?;
        if table.is_large {
            tracing::info!(
                "{}: large table ({} rows), keeping {} sampled rows",
                filename,
                table.total_rows,
                table.rows.len()
            );
        }
        Ok(self.tabular.process(&table, filename, FileType::Csv, None))
    }

    fn process_excel(&self, path: &Path, filename: &str) -> Result<Vec<Fragment>> {
        let sheets = table_reader::read_excel(path, &self.tabular)?;
        Ok(self.workbook_fragments(&sheets, filename))
    }

    /// One summary-plus-data sequence per sheet; `sheet_index` is the
    /// sheet's position in `sheets` and chunk indices restart per sheet.
    pub fn workbook_fragments(&self, sheets: &[SampledTable], filename: &str) -> Vec<Fragment> {
        sheets
            .iter()
            .enumerate()
            .flat_map(|(sheet_index, table)| {
                self.tabular
                    .process(table, filename, FileType::Excel, Some(sheet_index))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkType, TabularChunk};
    use std::io::Write;

    struct FailingExtractor;

    impl TextExtractor for FailingExtractor {
        fn extract(&self, _path: &Path, _file_type: FileType) -> Result<String> {
            Err(Error::extraction("corrupt stream"))
        }
    }

    struct FixedExtractor(&'static str);

    impl TextExtractor for FixedExtractor {
        fn extract(&self, _path: &Path, _file_type: FileType) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn pipeline() -> DocumentPipeline {
        DocumentPipeline::new(&RagConfig::default()).unwrap()
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp("x");
        let err = pipeline().ingest(file.path(), "slides.PPTX").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(ref ext) if ext == ".pptx"));
    }

    #[test]
    fn test_extraction_failure_is_wrapped() {
        let file = write_temp("x");
        let pipeline = pipeline().with_extractor(Arc::new(FailingExtractor));

        let err = pipeline.ingest(file.path(), "scan.pdf").unwrap_err();
        match err {
            Error::DocumentProcessing { filename, source } => {
                assert_eq!(filename, "scan.pdf");
                assert!(matches!(*source, Error::Extraction(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_prose_metadata() {
        let text = "Sentence one is here. ".repeat(100);
        let file = write_temp(&text);
        let fragments = pipeline().ingest(file.path(), "Notes.TXT").unwrap();

        assert!(fragments.len() > 1);
        for (i, fragment) in fragments.iter().enumerate() {
            assert_eq!(fragment.metadata.chunk_index(), i);
            assert_eq!(fragment.metadata.total_chunks(), fragments.len());
            assert_eq!(fragment.metadata.file_type(), FileType::Txt);
            assert_eq!(fragment.metadata.filename(), "Notes.TXT");
            assert!(fragment.metadata.as_tabular().is_none());
        }
    }

    #[test]
    fn test_blank_document_yields_nothing() {
        let file = write_temp("");
        let pipeline = pipeline().with_extractor(Arc::new(FixedExtractor("  \n ")));
        assert!(pipeline.ingest(file.path(), "empty.docx").unwrap().is_empty());
    }

    #[test]
    fn test_csv_dispatch() {
        let file = write_temp("A,B\n1,x\n2,y\n3,z\n");
        let fragments = pipeline().ingest(file.path(), "small.csv").unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].metadata.chunk_type(), Some(ChunkType::Summary));
        let data = fragments[1].metadata.as_tabular().unwrap();
        assert_eq!(data.kind, TabularChunk::Data { row_start: 0, row_end: 2 });
        assert_eq!(data.file_type, FileType::Csv);
        assert_eq!(data.total_rows, 3);
    }

    #[test]
    fn test_invalid_utf8_csv_is_wrapped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"A,B\n\xff\xfe,1\n").unwrap();

        let err = pipeline().ingest(file.path(), "bad.csv").unwrap_err();
        assert!(matches!(err, Error::DocumentProcessing { .. }));
    }

    #[test]
    fn test_missing_file_is_wrapped() {
        let err = pipeline()
            .ingest(Path::new("/nonexistent/data.csv"), "data.csv")
            .unwrap_err();
        assert!(matches!(err, Error::DocumentProcessing { .. }));
    }

    fn sheet(name: &str, headers: &[&str], rows: usize) -> SampledTable {
        let mut sampler = TabularProcessor::default().sampler();
        for i in 0..rows {
            sampler.push(headers.iter().map(|h| format!("{}-{}", h, i)).collect());
        }
        sampler.finish(headers.iter().map(|h| h.to_string()).collect(), Some(name.to_string()))
    }

    #[test]
    fn test_workbook_sheets_number_independently() {
        let sheets = vec![
            sheet("Orders", &["id", "amount"], 120),
            sheet("Regions", &["region"], 3),
        ];
        let fragments = pipeline().workbook_fragments(&sheets, "book.xlsx");

        // 120 rows at 50 per page -> summary + 3; 3 rows -> summary + 1
        assert_eq!(fragments.len(), 6);
        let (first, second): (Vec<_>, Vec<_>) = fragments
            .iter()
            .map(|f| f.metadata.as_tabular().unwrap())
            .partition(|m| m.sheet_index == Some(0));
        assert_eq!(first.len(), 4);
        assert_eq!(second.len(), 2);

        for (metas, rows) in [(&first, 120), (&second, 3)] {
            let summaries = metas.iter().filter(|m| m.kind == TabularChunk::Summary).count();
            assert_eq!(summaries, 1);
            assert_eq!(metas[0].kind, TabularChunk::Summary);
            for (i, meta) in metas.iter().enumerate() {
                assert_eq!(meta.chunk_index, i);
                assert_eq!(meta.total_chunks, metas.len());
                assert_eq!(meta.total_rows, rows);
                assert_eq!(meta.file_type, FileType::Excel);
                assert_eq!(meta.filename, "book.xlsx");
            }
        }
        assert_eq!(second[1].headers, vec!["region"]);
        assert!(fragments[4].content.contains("**Sheet:** Regions"));
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_corrupt_workbook_is_wrapped() {
        let file = write_temp("definitely not a zip archive");
        let err = pipeline().ingest(file.path(), "book.xlsx").unwrap_err();
        match err {
            Error::DocumentProcessing { filename, source } => {
                assert_eq!(filename, "book.xlsx");
                assert!(matches!(*source, Error::Extraction(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
