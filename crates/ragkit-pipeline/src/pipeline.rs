use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use ragkit_core::{Chunker, Document, Error, IndexStats, Result, ScoredDocument, SourceText};
use ragkit_embed::Encoder;
use ragkit_vector::VectorIndex;

use crate::demo::demo_corpus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Uninitialized,
    Ready,
    Failed,
}

enum State {
    Uninitialized,
    Ready(Arc<VectorIndex>),
    Failed,
}

/// What a successful `prepare` ingested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrepareReport {
    pub sources: usize,
    pub chunks: usize,
    pub used_fallback: bool,
    pub dimension: usize,
    pub elapsed: Duration,
}

pub struct RetrievalPipeline {
    chunker: Chunker,
    encoder: Encoder,
    batch_size: usize,
    state: RwLock<State>,
}

impl RetrievalPipeline {
    pub fn new(chunker: Chunker, encoder: Encoder, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be greater than 0".to_string()));
        }
        Ok(Self { chunker, encoder, batch_size, state: RwLock::new(State::Uninitialized) })
    }

    /// Chunks and encodes `sources` into a fresh index and makes it current.
    ///
    /// Falls back to the demo corpus when no source yields a chunk. On
    /// failure a ready pipeline keeps serving its previous index; otherwise it
    /// moves to `Failed` and `prepare` may be called again.
    pub fn prepare(&self, sources: &[SourceText]) -> Result<PrepareReport> {
        let start = Instant::now();
        match self.build(sources) {
            Ok((index, used_fallback)) => {
                let report = PrepareReport {
                    sources: if used_fallback { 0 } else { sources.len() },
                    chunks: index.len(),
                    used_fallback,
                    dimension: index.dimension(),
                    elapsed: start.elapsed(),
                };
                *self.write() = State::Ready(Arc::new(index));
                info!(chunks = report.chunks, fallback = used_fallback, elapsed_ms = report.elapsed.as_millis(), "pipeline ready");
                Ok(report)
            }
            Err(err) => {
                let mut state = self.write();
                if !matches!(*state, State::Ready(_)) {
                    *state = State::Failed;
                }
                warn!(%err, "prepare failed");
                Err(err)
            }
        }
    }

    fn build(&self, sources: &[SourceText]) -> Result<(VectorIndex, bool)> {
        let mut documents: Vec<Document> = Vec::new();
        for source in sources {
            let chunks = self.chunker.chunk(&source.text, &source.name);
            debug!(source = %source.name, chunks = chunks.len(), "chunked source");
            documents.extend(chunks);
        }

        let used_fallback = documents.is_empty();
        if used_fallback {
            warn!(sources = sources.len(), "no chunks from sources, using demo corpus");
            documents = demo_corpus();
        }

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = self.encoder.encode(&texts, self.batch_size)?;
        let mut index = VectorIndex::new(self.encoder.dimension())?;
        index.add(&vectors, documents)?;
        Ok((index, used_fallback))
    }

    /// Installs a previously built index, e.g. one loaded from the store.
    pub fn restore(&self, index: VectorIndex) -> Result<()> {
        let expected = self.encoder.dimension();
        if index.dimension() != expected {
            return Err(Error::DimensionMismatch { expected, actual: index.dimension() });
        }
        info!(chunks = index.len(), "pipeline restored from snapshot");
        *self.write() = State::Ready(Arc::new(index));
        Ok(())
    }

    /// The `top_k` chunks closest to `question`, best first.
    pub fn ask(&self, question: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        let index = self.snapshot().ok_or(Error::NotReady)?;
        let query = self.encoder.encode_query(question)?;
        let hits = index.search(&query, top_k)?;
        debug!(top_k, hits = hits.len(), "query answered");
        Ok(hits)
    }

    pub fn status(&self) -> PipelineStatus {
        match *self.read() {
            State::Uninitialized => PipelineStatus::Uninitialized,
            State::Ready(_) => PipelineStatus::Ready,
            State::Failed => PipelineStatus::Failed,
        }
    }

    pub fn stats(&self) -> Option<IndexStats> {
        self.snapshot().map(|index| index.stats())
    }

    /// The current index; searches on it are unaffected by later rebuilds.
    pub fn snapshot(&self) -> Option<Arc<VectorIndex>> {
        match &*self.read() {
            State::Ready(index) => Some(Arc::clone(index)),
            _ => None,
        }
    }

    /// Identifies the index `prepare(sources)` would build with this
    /// pipeline's encoder and chunking parameters.
    pub fn fingerprint(&self, sources: &[SourceText]) -> String {
        let cfg = self.chunker.config();
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.encoder.backend_id().as_bytes());
        hasher.update(&[0]);
        for n in [cfg.chunk_size, cfg.chunk_overlap, cfg.min_chunk_chars] {
            hasher.update(&(n as u64).to_le_bytes());
        }
        for source in sources {
            hasher.update(&(source.name.len() as u64).to_le_bytes());
            hasher.update(source.name.as_bytes());
            hasher.update(&(source.text.len() as u64).to_le_bytes());
            hasher.update(source.text.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    pub fn encoder(&self) -> &Encoder { &self.encoder }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
