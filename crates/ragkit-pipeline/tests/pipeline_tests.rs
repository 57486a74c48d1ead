use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ragkit_core::config::ChunkingConfig;
use ragkit_core::{BackendError, Chunker, Embedder, Error, RetryPolicy, SourceText};
use ragkit_embed::{Encoder, HashEmbedder};
use ragkit_pipeline::{demo_corpus, PipelineStatus, RetrievalPipeline, DEMO_SOURCE};
use ragkit_vector::VectorIndex;

fn hash_pipeline(dim: usize) -> RetrievalPipeline {
    let encoder = Encoder::new(Box::new(HashEmbedder::new(dim)), RetryPolicy::none());
    RetrievalPipeline::new(Chunker::default(), encoder, 32).unwrap()
}

fn three_sources() -> Vec<SourceText> {
    vec![
        SourceText::new("rust.txt", "Rust is a systems programming language focused on memory safety and speed."),
        SourceText::new("ocean.txt", "Coral reefs shelter thousands of marine species beneath tropical waters."),
        SourceText::new("baking.txt", "Sourdough bread rises slowly because wild yeast ferments the dough overnight."),
    ]
}

#[test]
fn ask_before_prepare_is_not_ready() {
    let pipeline = hash_pipeline(64);
    assert_eq!(pipeline.status(), PipelineStatus::Uninitialized);
    assert!(matches!(pipeline.ask("anything", 3), Err(Error::NotReady)));
    assert!(pipeline.stats().is_none());
}

#[test]
fn no_sources_falls_back_to_demo_corpus() {
    let pipeline = hash_pipeline(128);
    let report = pipeline.prepare(&[]).unwrap();

    assert!(report.used_fallback);
    assert_eq!(report.chunks, 4);
    assert_eq!(pipeline.status(), PipelineStatus::Ready);
    let stats = pipeline.stats().unwrap();
    assert_eq!((stats.total_vectors, stats.dimension), (4, 128));

    let hits = pipeline.ask("What is FAISS?", 10).unwrap();
    assert_eq!(hits.len(), 4);
    assert!(hits.iter().all(|h| h.document.metadata.source == DEMO_SOURCE));
}

#[test]
fn sources_without_chunks_also_fall_back() {
    let pipeline = hash_pipeline(64);
    let report = pipeline.prepare(&[SourceText::new("tiny.txt", "too short")]).unwrap();
    assert!(report.used_fallback);
    assert_eq!(report.chunks, demo_corpus().len());
}

#[test]
fn best_match_comes_first() {
    let pipeline = hash_pipeline(1024);
    let report = pipeline.prepare(&three_sources()).unwrap();
    assert!(!report.used_fallback);
    assert_eq!(report.chunks, 3);

    let hits = pipeline.ask("What is Rust?", 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.metadata.source, "rust.txt");

    let all = pipeline.ask("What is Rust?", 3).unwrap();
    assert!(all[0].score > all[1].score);
}

#[test]
fn index_size_matches_retained_chunks() {
    let chunker = Chunker::new(ChunkingConfig { chunk_size: 20, chunk_overlap: 5, min_chunk_chars: 50 }).unwrap();
    let words: Vec<String> = (0..100).map(|i| format!("token{i}")).collect();
    let text = words.join(" ");
    let expected = chunker.chunk(&text, "long.txt").len() + chunker.chunk("tiny", "tiny.txt").len();

    let encoder = Encoder::new(Box::new(HashEmbedder::new(32)), RetryPolicy::none());
    let pipeline = RetrievalPipeline::new(chunker, encoder, 4).unwrap();
    let report = pipeline.prepare(&[SourceText::new("long.txt", text), SourceText::new("tiny.txt", "tiny")]).unwrap();
    assert_eq!(report.chunks, expected);
    assert_eq!(pipeline.stats().unwrap().total_documents, expected);
}

struct Switchable {
    healthy: Arc<AtomicBool>,
    inner: HashEmbedder,
}

impl Embedder for Switchable {
    fn id(&self) -> &str { "switchable" }
    fn dim(&self) -> usize { self.inner.dim() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        if self.healthy.load(Ordering::SeqCst) {
            self.inner.embed_batch(texts)
        } else {
            Err(BackendError::permanent("stub", "backend down"))
        }
    }
}

#[test]
fn failed_prepare_can_be_retried() {
    let healthy = Arc::new(AtomicBool::new(false));
    let backend = Switchable { healthy: healthy.clone(), inner: HashEmbedder::new(64) };
    let pipeline = RetrievalPipeline::new(Chunker::default(), Encoder::new(Box::new(backend), RetryPolicy::none()), 8).unwrap();

    let err = pipeline.prepare(&three_sources()).unwrap_err();
    assert!(matches!(err, Error::Backend(_)));
    assert_eq!(pipeline.status(), PipelineStatus::Failed);
    assert!(matches!(pipeline.ask("rust", 1), Err(Error::NotReady)));

    healthy.store(true, Ordering::SeqCst);
    pipeline.prepare(&three_sources()).unwrap();
    assert_eq!(pipeline.status(), PipelineStatus::Ready);

    // a failed rebuild keeps serving the previous index
    healthy.store(false, Ordering::SeqCst);
    assert!(pipeline.prepare(&three_sources()).is_err());
    assert_eq!(pipeline.status(), PipelineStatus::Ready);
    assert_eq!(pipeline.stats().unwrap().total_vectors, 3);
}

#[test]
fn held_snapshot_survives_rebuild() {
    let pipeline = hash_pipeline(64);
    pipeline.prepare(&three_sources()).unwrap();
    let before = pipeline.snapshot().unwrap();

    pipeline.prepare(&[]).unwrap();
    assert_eq!(before.len(), 3);
    assert_eq!(pipeline.snapshot().unwrap().len(), 4);
}

#[test]
fn restore_checks_dimension() {
    let pipeline = hash_pipeline(16);
    assert!(matches!(
        pipeline.restore(VectorIndex::new(8).unwrap()),
        Err(Error::DimensionMismatch { expected: 16, actual: 8 })
    ));
    pipeline.restore(VectorIndex::new(16).unwrap()).unwrap();
    assert_eq!(pipeline.status(), PipelineStatus::Ready);
    assert!(pipeline.ask("anything", 3).unwrap().is_empty());
}

#[test]
fn fingerprint_tracks_corpus_and_encoder() {
    let a = hash_pipeline(64);
    let b = hash_pipeline(128);
    let sources = three_sources();

    assert_eq!(a.fingerprint(&sources), a.fingerprint(&three_sources()));
    assert_ne!(a.fingerprint(&sources), b.fingerprint(&sources));

    let mut edited = three_sources();
    edited[1].text.push_str(" Extra sentence.");
    assert_ne!(a.fingerprint(&sources), a.fingerprint(&edited));
}

#[test]
fn concurrent_queries_during_rebuilds_see_a_whole_index() {
    let pipeline = hash_pipeline(64);
    pipeline.prepare(&three_sources()).unwrap();
    let sources = three_sources();

    std::thread::scope(|s| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    for _ in 0..200 {
                        let hits = pipeline.ask("What is Rust?", 10).expect("ask during rebuild");
                        assert!(hits.len() == 3 || hits.len() == 4, "saw {} hits", hits.len());
                    }
                })
            })
            .collect();

        for round in 0..20 {
            if round % 2 == 0 {
                pipeline.prepare(&[]).unwrap();
            } else {
                pipeline.prepare(&sources).unwrap();
            }
        }
        for r in readers {
            r.join().unwrap();
        }
    });
    assert_eq!(pipeline.status(), PipelineStatus::Ready);
}
