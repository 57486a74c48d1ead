//! Domain types shared by the chunker, index, pipeline and composer.

use serde::{Deserialize, Serialize};

/// Where a chunk came from inside its source text.
///
/// - `source`: name of the source text (file name, or `demo`)
/// - `chunk_id`: position among the retained chunks of that source, from 0
/// - `start_offset`: word index of the chunk's first word in the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    pub chunk_id: usize,
    pub start_offset: usize,
}

/// A retrievable unit of text. Created by the chunker and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>, chunk_id: usize, start_offset: usize) -> Self {
        Self {
            content: content.into(),
            metadata: DocumentMetadata { source: source.into(), chunk_id, start_offset },
        }
    }
}

/// Plain text that has already been extracted upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceText {
    pub name: String,
    pub text: String,
}

impl SourceText {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { name: name.into(), text: text.into() }
    }
}

/// One search hit. Higher `score` is better; for unit vectors it is the
/// cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub score: f32,
    pub document: Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_vectors: usize,
    pub dimension: usize,
    pub total_documents: usize,
}

/// Maps a `[source k]` marker in a grounded prompt back to its chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub marker: usize,
    pub source: String,
    pub chunk_id: usize,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundedAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
}
