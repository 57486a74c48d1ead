use tracing::debug;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::Document;

/// Splits text into overlapping word windows.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be greater than 0".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig { &self.config }

    pub fn stride(&self) -> usize { self.config.chunk_size - self.config.chunk_overlap }

    /// Windows start at word `0, stride, 2*stride, ...` while the start is
    /// still inside the text. Short windows are dropped and do not consume a
    /// `chunk_id`.
    pub fn chunk(&self, text: &str, source: &str) -> Vec<Document> {
        // split_whitespace both collapses runs and trims the ends
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut chunks = Vec::new();
        let mut dropped = 0usize;
        for start in (0..words.len()).step_by(self.stride()) {
            let end = (start + self.config.chunk_size).min(words.len());
            let content = words[start..end].join(" ");
            if content.chars().count() > self.config.min_chunk_chars {
                chunks.push(Document::new(content, source, chunks.len(), start));
            } else {
                dropped += 1;
            }
        }
        debug!(source, words = words.len(), chunks = chunks.len(), dropped, "chunked source");
        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self { Self { config: ChunkingConfig::default() } }
}
