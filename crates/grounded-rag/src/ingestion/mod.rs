//! Document ingestion: text extraction, chunking and tabular processing

pub mod chunker;
pub mod extract;
pub mod pipeline;
pub mod table_reader;
pub mod tabular;

pub use chunker::TextSplitter;
pub use extract::{FileExtractor, TextExtractor};
pub use pipeline::DocumentPipeline;
pub use tabular::{ColumnSummary, DataType, RowSampler, SampledTable, TabularProcessor};
