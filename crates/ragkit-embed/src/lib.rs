//! ragkit-embed
//!
//! Embedding backends (candle sentence-transformers, Ollama, feature
//! hashing) and the [`Encoder`] that batches, retries and normalizes them.

use std::time::Duration;

use anyhow::Result;
use tracing::info;

use ragkit_core::config::{expand_path, EmbeddingConfig, EmbeddingProvider};
use ragkit_core::Embedder;

pub mod bert;
pub mod device;
pub mod encoder;
pub mod hashing;
pub mod ollama;
pub mod pool;
pub mod tokenize;

pub use bert::BertEmbedder;
pub use encoder::Encoder;
pub use hashing::HashEmbedder;
pub use ollama::OllamaEmbedder;
pub use pool::masked_mean_l2;

/// Builds the backend selected by `embedding.provider`.
pub fn embedder_from_config(cfg: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    let backend: Box<dyn Embedder> = match cfg.provider {
        EmbeddingProvider::Hash => Box::new(HashEmbedder::new(cfg.dimension)),
        EmbeddingProvider::Bert => Box::new(BertEmbedder::load(&expand_path(&cfg.model_dir), cfg.max_len)?),
        EmbeddingProvider::Ollama => Box::new(OllamaEmbedder::new(
            &cfg.base_url,
            &cfg.model,
            cfg.dimension,
            Duration::from_secs(cfg.timeout_secs),
        )?),
    };
    if backend.dim() != cfg.dimension {
        anyhow::bail!(
            "embedding.dimension is {} but backend {} produces {}",
            cfg.dimension,
            backend.id(),
            backend.dim()
        );
    }
    info!(backend = backend.id(), dim = backend.dim(), "embedder ready");
    Ok(backend)
}
