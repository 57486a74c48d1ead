use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use ragkit_core::{Embedder, Error, Result, RetryPolicy};

/// Turns texts into unit-length vectors of a fixed dimension.
///
/// Wraps an [`Embedder`] backend: batches the input, retries transient
/// backend failures, checks every row's length and L2-normalizes it.
pub struct Encoder {
    backend: Box<dyn Embedder>,
    retry: RetryPolicy,
    show_progress: bool,
}

impl Encoder {
    pub fn new(backend: Box<dyn Embedder>, retry: RetryPolicy) -> Self {
        Self { backend, retry, show_progress: false }
    }

    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn dimension(&self) -> usize { self.backend.dim() }

    pub fn backend_id(&self) -> &str { self.backend.id() }

    /// Encodes `texts` in batches of `batch_size`; row `i` belongs to `texts[i]`.
    pub fn encode(&self, texts: &[String], batch_size: usize) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(Error::Encoding("no texts to encode".to_string()));
        }
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be greater than 0".to_string()));
        }
        let pb = self.progress_bar(texts.len());
        let mut out = Vec::with_capacity(texts.len());
        for (batch_no, batch) in texts.chunks(batch_size).enumerate() {
            let rows = self.retry.run("embedding batch", || self.backend.embed_batch(batch))?;
            if rows.len() != batch.len() {
                return Err(Error::Encoding(format!(
                    "backend returned {} vectors for {} texts",
                    rows.len(),
                    batch.len()
                )));
            }
            for row in rows {
                out.push(self.normalize_row(row)?);
            }
            debug!(batch = batch_no, size = batch.len(), backend = self.backend.id(), "encoded batch");
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        Ok(out)
    }

    /// Encodes a single query text.
    pub fn encode_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut rows = self.encode(&[text.to_string()], 1)?;
        rows.pop().ok_or_else(|| Error::Encoding("backend returned no vector".to_string()))
    }

    fn normalize_row(&self, mut row: Vec<f32>) -> Result<Vec<f32>> {
        let dim = self.backend.dim();
        if row.len() != dim {
            return Err(Error::Encoding(format!("backend returned a vector of length {}, expected {}", row.len(), dim)));
        }
        if row.iter().any(|x| !x.is_finite()) {
            return Err(Error::Encoding("backend returned a non-finite value".to_string()));
        }
        let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm <= f32::EPSILON {
            return Err(Error::Encoding("backend returned a zero vector".to_string()));
        }
        for x in &mut row {
            *x /= norm;
        }
        Ok(row)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress || len < 2 {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
