//! Failure taxonomy shared by every stage of the answering path.
//!
//! All variants are recoverable from the caller's point of view. The
//! [`AnsweringPipeline`](crate::pipeline::AnsweringPipeline) catches each of
//! them and converts it into a degraded outcome; none crosses its public
//! boundary.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NaviError {
    /// The message was empty once the category annotation was stripped.
    #[error("invalid query: message is empty after removing the context tag")]
    InvalidQuery,

    #[error("embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("knowledge store unavailable: {0}")]
    StoreUnavailable(String),

    /// Embedder and store disagree on vector length.
    #[error("dimension mismatch: store holds {expected}-d vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("generation service unavailable: {0}")]
    GenerationUnavailable(String),

    /// A knowledge entry offered to a store failed validation.
    #[error("invalid knowledge entry: {0}")]
    InvalidEntry(String),
}

impl NaviError {
    /// True for failures that indicate embedder/store drift rather than an
    /// expected runtime outage.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, NaviError::DimensionMismatch { .. })
    }
}
