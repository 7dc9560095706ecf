//! Fragment and fragment metadata types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Supported source file types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
    Csv,
    Excel,
}

impl FileType {
    /// Detect file type from an extension (case-insensitive, no dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// CSV and Excel are processed as tables
    pub fn is_tabular(self) -> bool {
        matches!(self, Self::Csv | Self::Excel)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
            Self::Csv => "csv",
            Self::Excel => "excel",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a tabular fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Summary,
    Data,
}

/// Tabular fragment kind with its row range.
///
/// `row_start` and `row_end` are inclusive indices into the sampled rows,
/// not into the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "chunk_type", rename_all = "lowercase")]
pub enum TabularChunk {
    Summary,
    Data { row_start: usize, row_end: usize },
}

impl TabularChunk {
    pub fn chunk_type(&self) -> ChunkType {
        match self {
            Self::Summary => ChunkType::Summary,
            Self::Data { .. } => ChunkType::Data,
        }
    }
}

/// Metadata of a prose (PDF / DOCX / TXT) fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProseMetadata {
    pub filename: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub file_type: FileType,
}

/// Metadata of a tabular (CSV / Excel) fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularMetadata {
    pub filename: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub file_type: FileType,
    /// Position of the sheet in the workbook; `None` for CSV
    pub sheet_index: Option<usize>,
    /// Every row seen in the table, sampled or not
    pub total_rows: usize,
    pub headers: Vec<String>,
    #[serde(flatten)]
    pub kind: TabularChunk,
}

/// Fragment metadata, serialized as one flat mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FragmentMetadata {
    Tabular(TabularMetadata),
    Prose(ProseMetadata),
}

impl FragmentMetadata {
    pub fn filename(&self) -> &str {
        match self {
            Self::Tabular(m) => &m.filename,
            Self::Prose(m) => &m.filename,
        }
    }

    pub fn chunk_index(&self) -> usize {
        match self {
            Self::Tabular(m) => m.chunk_index,
            Self::Prose(m) => m.chunk_index,
        }
    }

    pub fn total_chunks(&self) -> usize {
        match self {
            Self::Tabular(m) => m.total_chunks,
            Self::Prose(m) => m.total_chunks,
        }
    }

    pub fn file_type(&self) -> FileType {
        match self {
            Self::Tabular(m) => m.file_type,
            Self::Prose(m) => m.file_type,
        }
    }

    /// `None` for prose fragments
    pub fn chunk_type(&self) -> Option<ChunkType> {
        self.as_tabular().map(|m| m.kind.chunk_type())
    }

    pub fn as_tabular(&self) -> Option<&TabularMetadata> {
        match self {
            Self::Tabular(m) => Some(m),
            Self::Prose(_) => None,
        }
    }

    pub fn is_tabular(&self) -> bool {
        self.file_type().is_tabular()
    }
}

/// A retrievable piece of text with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub content: String,
    pub metadata: FragmentMetadata,
}

impl Fragment {
    pub fn new(content: impl Into<String>, metadata: FragmentMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// A fragment as persisted in a vector store
#[derive(Debug, Clone)]
pub struct StoredFragment {
    /// Storage identifier, assigned at ingestion
    pub id: Uuid,
    pub fragment: Fragment,
    pub embedding: Vec<f32>,
}

impl StoredFragment {
    pub fn new(fragment: Fragment, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            fragment,
            embedding,
        }
    }
}
