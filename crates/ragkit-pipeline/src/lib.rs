//! ragkit-pipeline
//!
//! Ties the chunker, encoder and vector index together behind a small state
//! machine: `prepare` builds an index, `ask` queries it.

pub mod demo;
pub mod pipeline;

pub use demo::{demo_corpus, DEMO_SOURCE};
pub use pipeline::{PipelineStatus, PrepareReport, RetrievalPipeline};
