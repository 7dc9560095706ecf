//! Appends a data-source appendix to answers grounded in tables

use crate::ingestion::tabular::format_thousands;
use crate::types::{DataInfo, RetrievedResult};

/// Adds "Data Sources" and "Analysis Details" sections when CSV or Excel
/// fragments contributed to an answer.
#[derive(Debug, Clone)]
pub struct AnswerEnhancer {
    /// Tables above this many rows were sampled during ingestion
    large_table_rows: usize,
}

impl Default for AnswerEnhancer {
    fn default() -> Self {
        Self {
            large_table_rows: 10_000,
        }
    }
}

impl AnswerEnhancer {
    pub fn new(large_table_rows: usize) -> Self {
        Self { large_table_rows }
    }

    /// `answer` unchanged unless a result is tabular
    pub fn enhance(&self, answer: &str, results: &[RetrievedResult]) -> String {
        let tabular_count = results.iter().filter(|r| r.metadata.is_tabular()).count();
        if tabular_count == 0 {
            return answer.to_string();
        }

        let sources = DataInfo::collect(results);
        let mut out = String::from(answer.trim_end());
        out.push_str("\n\n---\n\n### Data Sources\n\n");

        for (filename, info) in &sources {
            out.push_str(&format!(
                "- **{}** ({}): {} rows × {} columns\n",
                filename,
                info.file_type.as_str().to_uppercase(),
                format_thousands(info.total_rows),
                info.headers.len()
            ));
            if !info.headers.is_empty() {
                out.push_str(&format!("  - Columns: {}\n", info.headers.join(", ")));
            }
            if info.sheets.len() > 1 {
                out.push_str(&format!("  - Sheets: {}\n", info.sheets.len()));
            }
        }

        out.push_str("\n### Analysis Details\n\n");
        out.push_str(&format!("- Retrieved fragments: {}\n", results.len()));
        out.push_str(&format!("- Tabular fragments: {}\n", tabular_count));

        // Per fragment: one workbook can mix small and sampled sheets
        let sampled = results
            .iter()
            .filter_map(|r| r.metadata.as_tabular())
            .any(|m| m.total_rows > self.large_table_rows);
        if sampled {
            out.push_str(&format!(
                "- *Note: tables with more than {} rows were sampled; figures reflect a representative subset of rows.*\n",
                format_thousands(self.large_table_rows)
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileType, FragmentMetadata, ProseMetadata, TabularChunk, TabularMetadata};

    fn prose(filename: &str) -> RetrievedResult {
        RetrievedResult {
            content: "text".into(),
            metadata: FragmentMetadata::Prose(ProseMetadata {
                filename: filename.into(),
                chunk_index: 0,
                total_chunks: 1,
                file_type: FileType::Pdf,
            }),
            similarity: 0.8,
        }
    }

    fn table(
        filename: &str,
        file_type: FileType,
        sheet: Option<usize>,
        kind: TabularChunk,
        total_rows: usize,
    ) -> RetrievedResult {
        RetrievedResult {
            content: "| a |".into(),
            metadata: FragmentMetadata::Tabular(TabularMetadata {
                filename: filename.into(),
                chunk_index: 0,
                total_chunks: 2,
                file_type,
                sheet_index: sheet,
                total_rows,
                headers: vec!["region".into(), "revenue".into()],
                kind,
            }),
            similarity: 0.7,
        }
    }

    #[test]
    fn test_prose_only_is_unchanged() {
        let enhancer = AnswerEnhancer::default();
        let answer = "Refunds take 30 days.";
        assert_eq!(enhancer.enhance(answer, &[prose("policy.pdf")]), answer);
        assert_eq!(enhancer.enhance(answer, &[]), answer);
    }

    #[test]
    fn test_appends_sources_and_details() {
        let enhancer = AnswerEnhancer::default();
        let results = vec![
            prose("policy.pdf"),
            table("sales.csv", FileType::Csv, None, TabularChunk::Summary, 1234),
            table("sales.csv", FileType::Csv, None, TabularChunk::Data { row_start: 0, row_end: 49 }, 1234),
        ];

        let out = enhancer.enhance("Revenue grew.", &results);
        assert!(out.starts_with("Revenue grew.\n\n---\n\n### Data Sources\n\n"));
        assert!(out.contains("- **sales.csv** (CSV): 1,234 rows × 2 columns\n"));
        assert!(out.contains("  - Columns: region, revenue\n"));
        assert!(!out.contains("Sheets:"));
        assert!(out.contains("- Retrieved fragments: 3\n"));
        assert!(out.contains("- Tabular fragments: 2\n"));
        assert!(!out.contains("sampled"));
    }

    #[test]
    fn test_multiple_sheets_and_sampling_note() {
        let enhancer = AnswerEnhancer::default();
        let results = vec![
            table("book.xlsx", FileType::Excel, Some(0), TabularChunk::Data { row_start: 0, row_end: 49 }, 50_000),
            table("book.xlsx", FileType::Excel, Some(2), TabularChunk::Data { row_start: 50, row_end: 99 }, 20),
        ];

        let out = enhancer.enhance("Answer", &results);
        assert!(out.contains("- **book.xlsx** (EXCEL): 50,000 rows × 2 columns\n"));
        assert!(out.contains("  - Sheets: 2\n"));
        assert!(out.contains("more than 10,000 rows were sampled"));
    }

    #[test]
    fn test_sampling_note_when_large_sheet_ranks_second() {
        let enhancer = AnswerEnhancer::default();
        let results = vec![
            table("book.xlsx", FileType::Excel, Some(0), TabularChunk::Summary, 20),
            table("book.xlsx", FileType::Excel, Some(1), TabularChunk::Data { row_start: 0, row_end: 49 }, 50_000),
        ];

        let out = enhancer.enhance("A", &results);
        assert!(out.contains("- **book.xlsx** (EXCEL): 20 rows × 2 columns\n"));
        assert!(out.contains("more than 10,000 rows were sampled"));
    }
}
