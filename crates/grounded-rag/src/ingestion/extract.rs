//! Prose text extraction (PDF, DOCX, TXT)

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Turns a prose document on disk into raw text
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path, file_type: FileType) -> Result<String>;
}

/// Extractor backed by pdf-extract, lopdf and docx-rs
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl TextExtractor for FileExtractor {
    fn extract(&self, path: &Path, file_type: FileType) -> Result<String> {
        match file_type {
            FileType::Pdf => Self::extract_pdf(path),
            FileType::Docx => Self::extract_docx(path),
            FileType::Txt => {
                let bytes = std::fs::read(path)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            FileType::Csv | FileType::Excel => Err(Error::extraction(format!(
                "{} files are read as tables, not prose",
                file_type
            ))),
        }
    }
}

impl FileExtractor {
    #[cfg(feature = "pdf")]
    fn extract_pdf(path: &Path) -> Result<String> {
        match pdf_extract::extract_text(path) {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                tracing::warn!("pdf-extract found no text in {}, trying fallback", path.display());
                Self::extract_pdf_fallback(path)
            }
            Err(e) => {
                tracing::warn!("pdf-extract failed: {}, trying fallback", e);
                Self::extract_pdf_fallback(path)
            }
        }
    }

    /// Page-by-page extraction with lopdf
    #[cfg(feature = "pdf")]
    fn extract_pdf_fallback(path: &Path) -> Result<String> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| Error::extraction(format!("Failed to load PDF: {}", e)))?;

        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        let text = doc
            .extract_text(&pages)
            .map_err(|e| Error::extraction(format!("Failed to read PDF text: {}", e)))?;

        if text.trim().is_empty() {
            return Err(Error::extraction(
                "PDF appears to be image-based or has no extractable text",
            ));
        }
        Ok(text)
    }

    #[cfg(not(feature = "pdf"))]
    fn extract_pdf(_path: &Path) -> Result<String> {
        Err(Error::extraction("PDF support is disabled (enable the `pdf` feature)"))
    }

    #[cfg(feature = "docx")]
    fn extract_docx(path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        let doc = docx_rs::read_docx(&bytes)
            .map_err(|e| Error::extraction(format!("Failed to read DOCX: {}", e)))?;

        let mut content = String::new();
        for child in doc.document.children {
            // Tables are skipped
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(content)
    }

    #[cfg(not(feature = "docx"))]
    fn extract_docx(_path: &Path) -> Result<String> {
        Err(Error::extraction("DOCX support is disabled (enable the `docx` feature)"))
    }
}
