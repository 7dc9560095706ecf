//! Tabular (CSV / Excel) processing: row sampling, column profiling and
//! markdown fragments.
//!
//! A table becomes one summary fragment (column types, counts, samples)
//! followed by data fragments that each cover a page of sampled rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::config::TabularConfig;
use crate::types::{FileType, Fragment, FragmentMetadata, TabularChunk, TabularMetadata};

/// Streaming row sampler with bounded memory.
///
/// The first `sample_size` rows are always kept. After that, row `n`
/// (1-based) is kept only when `n % max(1, n / sample_size) == 0`, which
/// sparsifies later rows. When more than `max_rows_in_memory` rows are
/// retained the oldest one is evicted. This is a biased approximation of
/// sampling, not a uniform one.
#[derive(Debug)]
pub struct RowSampler {
    sample_size: usize,
    max_rows_in_memory: usize,
    rows: VecDeque<Vec<String>>,
    seen: usize,
}

impl RowSampler {
    pub fn new(config: &TabularConfig) -> Self {
        Self {
            sample_size: config.sample_size.max(1),
            max_rows_in_memory: config.max_rows_in_memory,
            rows: VecDeque::new(),
            seen: 0,
        }
    }

    /// Offer the next row of the table
    pub fn push(&mut self, row: Vec<String>) {
        self.seen += 1;

        let stride = (self.seen / self.sample_size).max(1);
        if self.rows.len() < self.sample_size || self.seen % stride == 0 {
            self.rows.push_back(row);
        }

        if self.rows.len() > self.max_rows_in_memory {
            self.rows.pop_front();
        }
    }

    /// Rows offered so far
    pub fn total_rows(&self) -> usize {
        self.seen
    }

    /// Rows currently retained
    pub fn retained(&self) -> usize {
        self.rows.len()
    }

    pub fn finish(self, headers: Vec<String>, sheet_name: Option<String>) -> SampledTable {
        SampledTable {
            headers,
            is_large: self.seen > self.max_rows_in_memory,
            total_rows: self.seen,
            rows: self.rows.into(),
            sheet_name,
        }
    }
}

/// A table after sampling
#[derive(Debug, Clone, PartialEq)]
pub struct SampledTable {
    pub headers: Vec<String>,
    /// Retained rows in source order
    pub rows: Vec<Vec<String>>,
    /// Every row seen, sampled or not
    pub total_rows: usize,
    pub is_large: bool,
    /// Worksheet name for Excel sources
    pub sheet_name: Option<String>,
}

impl SampledTable {
    /// Cell value, empty when the row is shorter than the header
    fn cell<'a>(row: &'a [String], column: usize) -> &'a str {
        row.get(column).map(String::as_str).unwrap_or("")
    }

    fn column_values(&self, column: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| Self::cell(row, column))
    }
}

/// Inferred column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Numeric,
    Date,
    Text,
    Empty,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Numeric => "numeric",
            Self::Date => "date",
            Self::Text => "text",
            Self::Empty => "empty",
        };
        f.write_str(s)
    }
}

/// Profile of one column over the sampled rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub data_type: DataType,
    /// Non-empty values
    pub total_values: usize,
    /// Distinct non-empty values
    pub unique_values: usize,
    /// Up to five distinct values, first seen first
    pub sample_values: Vec<String>,
}

impl ColumnSummary {
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let values: Vec<&str> = values
            .into_iter()
            .filter(|v| !v.trim().is_empty())
            .collect();

        let mut seen = HashSet::new();
        let mut sample_values = Vec::new();
        for value in &values {
            if seen.insert(*value) && sample_values.len() < 5 {
                sample_values.push(value.to_string());
            }
        }

        Self {
            data_type: infer_data_type(&values),
            total_values: values.len(),
            unique_values: seen.len(),
            sample_values,
        }
    }
}

/// Classify a column from its non-empty values.
///
/// All-or-nothing: a single non-numeric value makes the column non-numeric.
pub fn infer_data_type(values: &[&str]) -> DataType {
    if values.is_empty() {
        DataType::Empty
    } else if values.iter().all(|v| is_numeric(v)) {
        DataType::Numeric
    } else if values.iter().all(|v| is_date(v)) {
        DataType::Date
    } else {
        DataType::Text
    }
}

fn is_numeric(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.parse::<f64>().is_ok_and(|n| !n.is_nan())
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y", "%b %d, %Y", "%d-%b-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%m/%d/%Y %H:%M"];

fn is_date(value: &str) -> bool {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value).is_ok()
        || DateTime::parse_from_rfc2822(value).is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(value, f).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|f| NaiveDate::parse_from_str(value, f).is_ok())
}

/// Turns sampled tables into summary and data fragments
#[derive(Debug, Clone, Default)]
pub struct TabularProcessor {
    config: TabularConfig,
}

impl TabularProcessor {
    pub fn new(config: TabularConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TabularConfig {
        &self.config
    }

    /// Start a sampler with this processor's limits
    pub fn sampler(&self) -> RowSampler {
        RowSampler::new(&self.config)
    }

    /// Profile every column, in header order
    pub fn summarize_columns(&self, table: &SampledTable) -> Vec<ColumnSummary> {
        (0..table.headers.len())
            .map(|column| ColumnSummary::from_values(table.column_values(column)))
            .collect()
    }

    /// Build the fragment sequence for one table (or one sheet).
    ///
    /// The summary comes first with `chunk_index` 0; data fragments follow
    /// with dense indices.
    pub fn process(
        &self,
        table: &SampledTable,
        filename: &str,
        file_type: FileType,
        sheet_index: Option<usize>,
    ) -> Vec<Fragment> {
        let columns = self.summarize_columns(table);
        let mut bodies = vec![(
            self.render_summary(table, &columns, file_type),
            TabularChunk::Summary,
        )];

        let page = self.config.rows_per_chunk.max(1);
        for (i, rows) in table.rows.chunks(page).enumerate() {
            let row_start = i * page;
            bodies.push((
                self.render_rows(rows, &table.headers, file_type),
                TabularChunk::Data {
                    row_start,
                    row_end: row_start + rows.len() - 1,
                },
            ));
        }

        let total_chunks = bodies.len();
        tracing::debug!(
            "{}{}: {} rows ({} sampled) -> {} fragments",
            filename,
            sheet_index.map(|s| format!(" [sheet {}]", s)).unwrap_or_default(),
            table.total_rows,
            table.rows.len(),
            total_chunks
        );

        bodies
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (content, kind))| {
                Fragment::new(
                    content,
                    FragmentMetadata::Tabular(TabularMetadata {
                        filename: filename.to_string(),
                        chunk_index,
                        total_chunks,
                        file_type,
                        sheet_index,
                        total_rows: table.total_rows,
                        headers: table.headers.clone(),
                        kind,
                    }),
                )
            })
            .collect()
    }

    /// Markdown overview of the table and its columns
    pub fn render_summary(
        &self,
        table: &SampledTable,
        columns: &[ColumnSummary],
        file_type: FileType,
    ) -> String {
        let mut out = format!("# {} File Analysis\n\n", file_type.as_str().to_uppercase());

        if let Some(name) = &table.sheet_name {
            out.push_str(&format!("**Sheet:** {}\n", name));
        }
        out.push_str(&format!("**Total Rows:** {}\n", format_thousands(table.total_rows)));
        out.push_str(&format!("**Total Columns:** {}\n", table.headers.len()));
        if table.is_large {
            out.push_str("**Note:** Large file detected - analysis based on representative sample\n");
        }

        out.push_str("\n## Column Analysis\n\n");
        out.push_str("| Column | Type | Values | Unique | Sample Data |\n");
        out.push_str("|--------|------|--------|--------|--------------|\n");
        for (header, column) in table.headers.iter().zip(columns) {
            let samples: Vec<String> = column
                .sample_values
                .iter()
                .take(self.config.summary_sample_values)
                .map(|v| escape_pipes(v))
                .collect();
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                escape_pipes(header),
                column.data_type,
                column.total_values,
                column.unique_values,
                samples.join(", ")
            ));
        }

        out.push_str("\n## Data Statistics\n\n");
        for (label, data_type) in [
            ("Numeric", DataType::Numeric),
            ("Text", DataType::Text),
            ("Date", DataType::Date),
        ] {
            let names: Vec<&str> = table
                .headers
                .iter()
                .zip(columns)
                .filter(|(_, c)| c.data_type == data_type)
                .map(|(h, _)| h.as_str())
                .collect();
            out.push_str(&format!(
                "- **{} columns:** {} ({})\n",
                label,
                names.len(),
                names.join(", ")
            ));
        }

        out
    }

    /// Markdown table for one page of rows.
    ///
    /// At most `display_rows` rows are rendered; a trailing notice counts
    /// the rest of the page.
    pub fn render_rows(&self, rows: &[Vec<String>], headers: &[String], file_type: FileType) -> String {
        let shown = rows.len().min(self.config.display_rows);
        let mut out = format!(
            "## {} Data Sample ({} of {} rows)\n\n",
            file_type.as_str().to_uppercase(),
            shown,
            rows.len()
        );

        let header_cells: Vec<String> = headers.iter().map(|h| escape_pipes(h)).collect();
        out.push_str(&format!("| {} |\n", header_cells.join(" | ")));
        out.push_str(&format!("| {} |\n", vec!["---"; headers.len()].join(" | ")));

        for row in &rows[..shown] {
            let cells: Vec<String> = (0..headers.len())
                .map(|column| self.format_cell(SampledTable::cell(row, column)))
                .collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }

        if rows.len() > shown {
            out.push_str(&format!("\n*... and {} more rows*\n", rows.len() - shown));
        }

        out
    }

    /// Truncate long values, then escape pipes
    fn format_cell(&self, value: &str) -> String {
        let max = self.config.max_cell_chars;
        if value.chars().count() > max {
            let kept: String = value.chars().take(max.saturating_sub(3)).collect();
            escape_pipes(&format!("{}...", kept))
        } else {
            escape_pipes(value)
        }
    }
}

fn escape_pipes(value: &str) -> String {
    value.replace('|', "\\|")
}

/// `1234567` -> `1,234,567`
pub(crate) fn format_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkType;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn table(headers: &[&str], rows: Vec<Vec<String>>) -> SampledTable {
        SampledTable {
            headers: row(headers),
            total_rows: rows.len(),
            rows,
            is_large: false,
            sheet_name: None,
        }
    }

    #[test]
    fn test_infer_data_type() {
        assert_eq!(infer_data_type(&["1", "2", "abc"]), DataType::Text);
        assert_eq!(infer_data_type(&["1", "2", "3"]), DataType::Numeric);
        assert_eq!(infer_data_type(&["-1.5", "2e3", " 7 "]), DataType::Numeric);
        assert_eq!(infer_data_type(&[]), DataType::Empty);
        assert_eq!(infer_data_type(&["2024-01-05", "2024-02-10"]), DataType::Date);
        assert_eq!(infer_data_type(&["2024-01-05", "soon"]), DataType::Text);
        assert_eq!(infer_data_type(&["NaN"]), DataType::Text);
    }

    #[test]
    fn test_column_summary_ignores_empty() {
        let summary = ColumnSummary::from_values(["a", "", "b", "a", "  ", "c", "d", "e", "f"]);
        assert_eq!(summary.total_values, 7);
        assert_eq!(summary.unique_values, 6);
        assert_eq!(summary.sample_values, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(summary.data_type, DataType::Text);
    }

    #[test]
    fn test_sampler_keeps_first_rows() {
        let processor = TabularProcessor::default();
        let mut sampler = processor.sampler();
        for i in 0..500 {
            sampler.push(vec![i.to_string()]);
        }
        let table = sampler.finish(row(&["n"]), None);
        assert_eq!(table.rows.len(), 500);
        assert_eq!(table.total_rows, 500);
        assert!(!table.is_large);
    }

    #[test]
    fn test_sampler_sparsifies_after_sample_size() {
        let config = TabularConfig {
            sample_size: 10,
            max_rows_in_memory: 100,
            ..TabularConfig::default()
        };
        let mut sampler = RowSampler::new(&config);
        for i in 1..=40 {
            sampler.push(vec![i.to_string()]);
        }

        // rows 1..=19 have stride 1; 20..=29 stride 2; 30..=39 stride 3; 40 stride 4
        let table = sampler.finish(row(&["n"]), None);
        let kept: Vec<usize> = table.rows.iter().map(|r| r[0].parse().unwrap()).collect();
        assert_eq!(&kept[..19], &(1..=19).collect::<Vec<_>>()[..]);
        assert_eq!(&kept[19..], &[20, 22, 24, 26, 28, 30, 33, 36, 39, 40]);
        assert_eq!(table.total_rows, 40);
    }

    #[test]
    fn test_sampler_evicts_oldest() {
        let config = TabularConfig {
            sample_size: 5,
            max_rows_in_memory: 5,
            ..TabularConfig::default()
        };
        let mut sampler = RowSampler::new(&config);
        for i in 1..=6 {
            sampler.push(vec![i.to_string()]);
        }
        assert_eq!(sampler.retained(), 5);
        let table = sampler.finish(row(&["n"]), None);
        assert_eq!(table.rows[0][0], "2");
        assert!(table.is_large);
    }

    #[test]
    fn test_sampler_memory_bound() {
        let processor = TabularProcessor::default();
        let mut sampler = processor.sampler();
        for i in 0..25_000 {
            sampler.push(vec![i.to_string()]);
        }
        assert!(sampler.retained() <= 10_000);
        assert_eq!(sampler.total_rows(), 25_000);
    }

    #[test]
    fn test_small_csv_fragments() {
        let processor = TabularProcessor::default();
        let t = table(&["A", "B"], vec![row(&["1", "x"]), row(&["2", "y"]), row(&["3", "z"])]);
        let fragments = processor.process(&t, "small.csv", FileType::Csv, None);

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].metadata.chunk_index(), 0);
        assert_eq!(fragments[0].metadata.chunk_type(), Some(ChunkType::Summary));
        assert_eq!(fragments[1].metadata.chunk_index(), 1);

        let data = fragments[1].metadata.as_tabular().unwrap();
        assert_eq!(data.kind, TabularChunk::Data { row_start: 0, row_end: 2 });
        assert_eq!(data.total_chunks, 2);
        assert_eq!(data.sheet_index, None);
        assert_eq!(data.headers, vec!["A", "B"]);
    }

    #[test]
    fn test_summary_rendering() {
        let processor = TabularProcessor::default();
        let mut t = table(
            &["id", "name", "joined"],
            vec![
                row(&["1", "Ann", "2024-01-01"]),
                row(&["2", "Bob", "2024-02-01"]),
                row(&["3", "Cy", "2024-03-01"]),
                row(&["4", "Di", "2024-04-01"]),
            ],
        );
        t.total_rows = 12_345;
        t.is_large = true;
        t.sheet_name = Some("People".into());

        let columns = processor.summarize_columns(&t);
        let summary = processor.render_summary(&t, &columns, FileType::Excel);

        assert!(summary.starts_with("# EXCEL File Analysis\n\n**Sheet:** People\n"));
        assert!(summary.contains("**Total Rows:** 12,345\n**Total Columns:** 3\n"));
        assert!(summary.contains("**Note:** Large file detected"));
        assert!(summary.contains("| id | numeric | 4 | 4 | 1, 2, 3 |\n"));
        assert!(summary.contains("- **Numeric columns:** 1 (id)\n"));
        assert!(summary.contains("- **Text columns:** 1 (name)\n"));
        assert!(summary.contains("- **Date columns:** 1 (joined)\n"));
    }

    #[test]
    fn test_data_fragment_limits_displayed_rows() {
        let processor = TabularProcessor::default();
        let rows: Vec<Vec<String>> = (0..50).map(|i| vec![i.to_string()]).collect();
        let out = processor.render_rows(&rows, &row(&["n"]), FileType::Csv);

        assert!(out.starts_with("## CSV Data Sample (20 of 50 rows)\n\n| n |\n| --- |\n"));
        assert_eq!(out.lines().filter(|l| l.starts_with("| ") && *l != "| n |" && *l != "| --- |").count(), 20);
        assert!(out.ends_with("\n*... and 30 more rows*\n"));
    }

    #[test]
    fn test_no_notice_for_short_page() {
        let processor = TabularProcessor::default();
        let rows: Vec<Vec<String>> = (0..20).map(|i| vec![i.to_string()]).collect();
        let out = processor.render_rows(&rows, &row(&["n"]), FileType::Csv);
        assert!(!out.contains("more rows"));
    }

    #[test]
    fn test_cell_escaping_and_truncation() {
        let processor = TabularProcessor::default();
        let long = "x".repeat(60);
        let out = processor.render_rows(&[row(&["a|b", &long])], &row(&["p", "q"]), FileType::Csv);

        assert!(out.contains("| a\\|b | "));
        assert!(out.contains(&format!("{}... |", "x".repeat(47))));
        assert!(!out.contains(&"x".repeat(48)));
    }

    #[test]
    fn test_short_rows_render_empty_cells() {
        let processor = TabularProcessor::default();
        let out = processor.render_rows(&[row(&["1"])], &row(&["a", "b"]), FileType::Csv);
        assert!(out.contains("| 1 |  |\n"));
    }

    #[test]
    fn test_pages_of_fifty() {
        let processor = TabularProcessor::default();
        let rows: Vec<Vec<String>> = (0..120).map(|i| vec![i.to_string()]).collect();
        let fragments = processor.process(&table(&["n"], rows), "big.csv", FileType::Csv, None);

        assert_eq!(fragments.len(), 4);
        let last = fragments[3].metadata.as_tabular().unwrap();
        assert_eq!(last.kind, TabularChunk::Data { row_start: 100, row_end: 119 });
        assert!(fragments.iter().all(|f| f.metadata.total_chunks() == 4));
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
    }
}
