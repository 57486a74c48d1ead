//! ragkit-answer
//!
//! Grounded answer composition on top of a [`ragkit_pipeline::RetrievalPipeline`]:
//! prompt building with `[source k]` markers, the Ollama chat backend, and
//! strict parsing of structured replies.

pub mod assistant;
pub mod composer;
pub mod ollama;
pub mod prompt;
pub mod structured;

pub use assistant::{Comparison, RagAssistant};
pub use composer::AnswerComposer;
pub use ollama::OllamaGenerator;
pub use prompt::NO_CONTEXT_ANSWER;
pub use structured::{parse_structured, Structured};
