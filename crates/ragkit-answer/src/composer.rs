use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use ragkit_core::config::GenerationConfig;
use ragkit_core::{BackendError, GroundedAnswer, Generator, ScoredDocument};

use crate::prompt::{extraction_prompt, grounded_prompt, NO_CONTEXT_ANSWER};
use crate::structured::{parse_structured, Structured};

/// Turns retrieved chunks into a prompt and asks the generator for an answer.
///
/// `compose`/`compose_baseline` never fail: a backend error becomes a
/// readable failure message. The `try_*` variants return the typed error.
pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
    system_prompt: String,
    baseline_system_prompt: String,
    temperature: Option<f32>,
    baseline_temperature: Option<f32>,
}

impl AnswerComposer {
    /// Uses the default system prompts and temperatures of [`GenerationConfig`].
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self::with_config(generator, &GenerationConfig::default())
    }

    pub fn with_config(generator: Arc<dyn Generator>, cfg: &GenerationConfig) -> Self {
        Self {
            generator,
            system_prompt: cfg.system_prompt.clone(),
            baseline_system_prompt: cfg.baseline_system_prompt.clone(),
            temperature: cfg.temperature,
            baseline_temperature: cfg.baseline_temperature,
        }
    }

    pub fn generator_id(&self) -> &str { self.generator.id() }

    pub fn try_compose(&self, question: &str, retrieved: &[ScoredDocument]) -> Result<GroundedAnswer, BackendError> {
        if retrieved.is_empty() {
            debug!("no retrieved context, skipping generation");
            return Ok(GroundedAnswer { answer: NO_CONTEXT_ANSWER.to_string(), citations: Vec::new() });
        }
        let (prompt, citations) = grounded_prompt(question, retrieved);
        let answer = self.generator.complete_with(&prompt, system(&self.system_prompt), self.temperature)?;
        Ok(GroundedAnswer { answer, citations })
    }

    pub fn compose(&self, question: &str, retrieved: &[ScoredDocument]) -> GroundedAnswer {
        self.try_compose(question, retrieved).unwrap_or_else(|err| {
            warn!(%err, "grounded generation failed");
            let (_, citations) = grounded_prompt(question, retrieved);
            GroundedAnswer { answer: failure_message(&err), citations }
        })
    }

    /// The bare question with no retrieved context, for comparison.
    pub fn try_compose_baseline(&self, question: &str) -> Result<String, BackendError> {
        self.generator
            .complete_with(question.trim(), system(&self.baseline_system_prompt), self.baseline_temperature)
    }

    pub fn compose_baseline(&self, question: &str) -> String {
        self.try_compose_baseline(question).unwrap_or_else(|err| {
            warn!(%err, "baseline generation failed");
            failure_message(&err)
        })
    }

    /// Asks for JSON matching `T` and parses the reply strictly.
    pub fn extract<T: DeserializeOwned>(&self, instruction: &str, text: &str) -> Result<Structured<T>, BackendError> {
        let reply = self.generator.complete_with(&extraction_prompt(instruction, text), None, self.temperature)?;
        let parsed = parse_structured(&reply);
        if !parsed.is_parsed() {
            warn!(reply_chars = reply.len(), "structured reply did not parse");
        }
        Ok(parsed)
    }
}

/// An empty configured prompt means no system message.
fn system(prompt: &str) -> Option<&str> {
    Some(prompt.trim()).filter(|p| !p.is_empty())
}

pub fn failure_message(err: &BackendError) -> String {
    if err.is_retryable() {
        format!("Generation failed (temporary, try again): {err}")
    } else {
        format!("Generation failed: {err}")
    }
}
