//! Ollama HTTP backend for embeddings, plus the error classification shared
//! with the chat generator.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ragkit_core::{BackendError, Embedder};

const SERVICE: &str = "ollama";

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
}

pub struct OllamaEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dim: usize,
    timeout: Duration,
    id: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, dim: usize, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/embed", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dim,
            timeout,
            id: format!("ollama:{model}:d{dim}"),
        })
    }
}

impl Embedder for OllamaEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        debug!(endpoint = %self.endpoint, batch = texts.len(), "ollama embed request");
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { model: &self.model, input: texts })
            .send()
            .map_err(|e| classify_error(e, self.timeout))?;
        let resp = check_status(resp)?;
        let body: EmbedResponse = resp.json().map_err(|e| classify_error(e, self.timeout))?;
        Ok(body.embeddings)
    }
}

/// Maps a transport or decode failure onto the retryable/permanent split.
pub fn classify_error(err: reqwest::Error, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        return BackendError::Timeout { service: SERVICE.to_string(), elapsed: timeout };
    }
    if err.is_connect() || err.is_request() {
        return BackendError::transient(SERVICE, err.to_string());
    }
    if let Some(status) = err.status() {
        return classify_status(status, &err.to_string());
    }
    BackendError::permanent(SERVICE, err.to_string())
}

/// 5xx and 429 can go away on their own; other non-success codes will not.
pub fn classify_status(status: StatusCode, message: &str) -> BackendError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        BackendError::transient(SERVICE, format!("{status}: {message}"))
    } else {
        BackendError::permanent(SERVICE, format!("{status}: {message}"))
    }
}

/// Turns a non-success response into a classified error, reading the body for context.
pub fn check_status(resp: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(classify_status(status, body.trim()))
}
