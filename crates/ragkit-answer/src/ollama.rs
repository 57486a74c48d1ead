//! Chat completions through Ollama's `/api/chat`.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ragkit_core::config::GenerationConfig;
use ragkit_core::{BackendError, Generator, RetryPolicy};
use ragkit_embed::ollama::{check_status, classify_error};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub message: ChatReply,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub role: String,
    pub content: String,
}

pub struct OllamaGenerator {
    client: Client,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
    timeout: Duration,
    retry: RetryPolicy,
    id: String,
}

impl OllamaGenerator {
    pub fn new(cfg: &GenerationConfig, retry: RetryPolicy) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(cfg.timeout_secs);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", cfg.base_url.trim_end_matches('/')),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            timeout,
            retry,
            id: format!("ollama:{}", cfg.model),
        })
    }

    fn chat_once(&self, prompt: &str, system: Option<&str>, temperature: Option<f32>) -> Result<String, BackendError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage { role: "system", content: system });
        }
        messages.push(ChatMessage { role: "user", content: prompt });
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: ChatOptions { temperature },
        };

        let resp = self.client.post(&self.endpoint).json(&request).send().map_err(|e| classify_error(e, self.timeout))?;
        let resp = check_status(resp)?;
        let body: ChatResponse = resp.json().map_err(|e| classify_error(e, self.timeout))?;
        Ok(body.message.content)
    }
}

impl Generator for OllamaGenerator {
    fn id(&self) -> &str { &self.id }

    fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, BackendError> {
        self.complete_with(prompt, system, self.temperature)
    }

    fn complete_with(&self, prompt: &str, system: Option<&str>, temperature: Option<f32>) -> Result<String, BackendError> {
        debug!(model = %self.model, prompt_chars = prompt.len(), ?temperature, "chat request");
        self.retry.run("chat completion", || self.chat_once(prompt, system, temperature))
    }
}
