use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use ragkit_core::config::{EmbeddingConfig, EmbeddingProvider};
use ragkit_core::{BackendError, Embedder, Error, RetryPolicy};
use ragkit_embed::ollama::{classify_status, EmbedResponse};
use ragkit_embed::{embedder_from_config, Encoder, HashEmbedder};

fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

fn texts(items: &[&str]) -> Vec<String> { items.iter().map(|s| s.to_string()).collect() }

#[test]
fn hash_encoder_is_deterministic_and_normalized() {
    let encoder = Encoder::new(Box::new(HashEmbedder::new(64)), RetryPolicy::none());
    let rows = encoder.encode(&texts(&["hello world", "hello world", "something else entirely"]), 2).unwrap();

    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.len() == 64));
    for r in &rows {
        let norm = dot(r, r).sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm={norm}");
    }
    assert!((dot(&rows[0], &rows[1]) - 1.0).abs() < 1e-5);
    assert!(dot(&rows[0], &rows[2]) < 0.999);
}

#[test]
fn shared_words_score_higher_than_disjoint_ones() {
    let encoder = Encoder::new(Box::new(HashEmbedder::new(256)), RetryPolicy::none());
    let q = encoder.encode_query("rust borrow checker").unwrap();
    let rows = encoder
        .encode(&texts(&["the rust borrow checker enforces ownership", "penguins live near the south pole"]), 8)
        .unwrap();
    assert!(dot(&q, &rows[0]) > dot(&q, &rows[1]));
}

#[test]
fn batching_preserves_input_order() {
    let encoder = Encoder::new(Box::new(HashEmbedder::new(32)), RetryPolicy::none());
    let input = texts(&["a1 alpha", "b2 bravo", "c3 charlie", "d4 delta", "e5 echo"]);
    let batched = encoder.encode(&input, 2).unwrap();
    for (i, text) in input.iter().enumerate() {
        let single = encoder.encode_query(text).unwrap();
        assert!((dot(&single, &batched[i]) - 1.0).abs() < 1e-5, "row {i} out of order");
    }
}

#[test]
fn empty_input_and_zero_batch_are_rejected() {
    let encoder = Encoder::new(Box::new(HashEmbedder::new(16)), RetryPolicy::none());
    assert!(matches!(encoder.encode(&[], 4), Err(Error::Encoding(_))));
    assert!(matches!(encoder.encode(&texts(&["x"]), 0), Err(Error::InvalidConfig(_))));
}

struct WrongDim;

impl Embedder for WrongDim {
    fn id(&self) -> &str { "wrong" }
    fn dim(&self) -> usize { 8 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        Ok(texts.iter().map(|_| vec![1.0; 5]).collect())
    }
}

#[test]
fn wrong_vector_length_is_an_encoding_error() {
    let encoder = Encoder::new(Box::new(WrongDim), RetryPolicy::none());
    let err = encoder.encode(&texts(&["x"]), 1).unwrap_err();
    assert!(matches!(err, Error::Encoding(_)), "got {err:?}");
}

struct Flaky {
    failures: usize,
    calls: Arc<AtomicUsize>,
}

impl Embedder for Flaky {
    fn id(&self) -> &str { "flaky" }
    fn dim(&self) -> usize { 2 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(BackendError::transient("stub", "connection refused"));
        }
        Ok(texts.iter().map(|_| vec![3.0, 4.0]).collect())
    }
}

#[test]
fn transient_backend_failures_are_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let encoder = Encoder::new(Box::new(Flaky { failures: 2, calls: calls.clone() }), RetryPolicy::new(3, Duration::ZERO));
    let rows = encoder.encode(&texts(&["x"]), 1).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!((rows[0][0] - 0.6).abs() < 1e-6 && (rows[0][1] - 0.8).abs() < 1e-6);

    let calls = Arc::new(AtomicUsize::new(0));
    let encoder = Encoder::new(Box::new(Flaky { failures: 5, calls: calls.clone() }), RetryPolicy::new(2, Duration::ZERO));
    let err = encoder.encode(&texts(&["x"]), 1).unwrap_err();
    assert!(matches!(err, Error::Backend(BackendError::Transient { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn config_builds_hash_backend_with_requested_dimension() {
    let cfg = EmbeddingConfig { provider: EmbeddingProvider::Hash, dimension: 48, ..EmbeddingConfig::default() };
    let backend = embedder_from_config(&cfg).unwrap();
    assert_eq!(backend.dim(), 48);
    assert_eq!(backend.id(), "hash:xxh64:d48");
}

#[test]
fn ollama_response_and_status_classification() {
    let body: EmbedResponse = serde_json::from_str(r#"{"model":"m","embeddings":[[0.1,0.2],[0.3,0.4]]}"#).unwrap();
    assert_eq!(body.embeddings.len(), 2);

    assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, "busy").is_retryable());
    assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down").is_retryable());
    assert!(!classify_status(StatusCode::NOT_FOUND, "model not found").is_retryable());
}
