use std::hash::Hasher;

use twox_hash::XxHash64;

use ragkit_core::{BackendError, Embedder};

/// Deterministic bag-of-words embedder using signed feature hashing.
///
/// Tokens are lowercased alphanumeric runs; each one adds ±1 to a bucket
/// chosen by its hash. Texts sharing words get a positive inner product.
/// Needs no model files, so tests and offline demos use it.
pub struct HashEmbedder {
    dim: usize,
    id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self { dim, id: format!("hash:xxh64:d{dim}") }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lower = text.to_lowercase();
        let mut tokens = lower.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).peekable();
        if tokens.peek().is_none() {
            self.add_token(&mut v, lower.trim());
            return v;
        }
        for token in tokens {
            self.add_token(&mut v, token);
        }
        v
    }

    fn add_token(&self, v: &mut [f32], token: &str) {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(token.as_bytes());
        let h = hasher.finish();
        let idx = usize::try_from(h % self.dim as u64).unwrap_or(0);
        let sign = if (h >> 63) & 1 == 1 { -1.0 } else { 1.0 };
        v[idx] += sign;
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
