use crate::error::BackendError;

/// An embedding service. Implementations return one row per input text, in
/// input order, each of length `dim()`.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the backend and model (e.g. `ollama:nomic-embed-text`).
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError>;
}

/// A text generation service.
pub trait Generator: Send + Sync {
    fn id(&self) -> &str;
    fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, BackendError>;

    /// Like `complete`, overriding the sampling temperature for this call.
    /// Backends without a temperature knob ignore it.
    fn complete_with(&self, prompt: &str, system: Option<&str>, temperature: Option<f32>) -> Result<String, BackendError> {
        let _ = temperature;
        self.complete(prompt, system)
    }
}
