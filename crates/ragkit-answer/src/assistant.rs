use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use ragkit_core::{GroundedAnswer, Result};
use ragkit_pipeline::RetrievalPipeline;

use crate::composer::AnswerComposer;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub grounded: GroundedAnswer,
    pub baseline: String,
}

/// Question answering over a prepared pipeline.
pub struct RagAssistant {
    pipeline: Arc<RetrievalPipeline>,
    composer: AnswerComposer,
}

impl RagAssistant {
    pub fn new(pipeline: Arc<RetrievalPipeline>, composer: AnswerComposer) -> Self {
        Self { pipeline, composer }
    }

    pub fn pipeline(&self) -> &RetrievalPipeline { &self.pipeline }

    pub fn composer(&self) -> &AnswerComposer { &self.composer }

    /// Retrieves `top_k` chunks and composes a cited answer from them.
    pub fn ask(&self, question: &str, top_k: usize) -> Result<GroundedAnswer> {
        let hits = self.pipeline.ask(question, top_k)?;
        info!(hits = hits.len(), generator = self.composer.generator_id(), "composing answer");
        Ok(self.composer.compose(question, &hits))
    }

    /// The grounded answer next to an answer produced without retrieval.
    pub fn compare(&self, question: &str, top_k: usize) -> Result<Comparison> {
        let grounded = self.ask(question, top_k)?;
        let baseline = self.composer.compose_baseline(question);
        Ok(Comparison { grounded, baseline })
    }
}
