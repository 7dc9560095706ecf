//! Boundary-aware text splitting with overlap

use crate::config::ChunkingConfig;
use crate::error::Result;

/// A window over the source text, in character positions (`end` exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

/// Splits prose into overlapping windows, preferring to cut after a
/// sentence end (`.`) or a line break.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    /// Window size in characters
    chunk_size: usize,
    /// Characters repeated at the start of the next window
    chunk_overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl TextSplitter {
    /// Create a splitter; `chunk_overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        Self::from_config(&ChunkingConfig {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into trimmed, non-empty fragments
    pub fn split(&self, text: &str) -> Vec<String> {
        let offsets = char_offsets(text);
        self.windows(text)
            .into_iter()
            .map(|w| text[offsets[w.start]..offsets[w.end]].trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Compute the raw windows before trimming.
    ///
    /// Window starts strictly increase and the last window ends at the
    /// character length of `text`. Consecutive windows never leave a gap.
    pub fn windows(&self, text: &str) -> Vec<Window> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut windows = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = (start + self.chunk_size).min(len);

            if end < len {
                if let Some(boundary) = (start + 1..end)
                    .rev()
                    .find(|&i| chars[i] == '.' || chars[i] == '\n')
                {
                    end = boundary + 1;
                }
            }

            windows.push(Window { start, end });

            if end >= len {
                break;
            }
            start = end.saturating_sub(self.chunk_overlap).max(start + 1);
        }

        windows
    }
}

/// Byte offset of every character plus the text length
fn char_offsets(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}
