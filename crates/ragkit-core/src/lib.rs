//! ragkit-core
//!
//! Domain types, the error taxonomy, backend traits, retry policy,
//! configuration and the chunker shared by the other ragkit crates.

pub mod chunker;
pub mod config;
pub mod error;
pub mod retry;
pub mod sources;
pub mod traits;
pub mod types;

pub use chunker::Chunker;
pub use error::{BackendError, Error, Result};
pub use retry::RetryPolicy;
pub use traits::{Embedder, Generator};
pub use types::{Citation, Document, DocumentMetadata, GroundedAnswer, IndexStats, ScoredDocument, SourceText};
