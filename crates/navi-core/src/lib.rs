//! # Navi Core
//!
//! Category-scoped retrieval-augmented answering, independent of any
//! runtime, database, or HTTP client.
//!
//! A question flows strictly downward:
//!
//! ```text
//! raw message ─▶ context_tag::parse ─▶ Retriever ─▶ PromptAssembler ─▶ Generator
//!                    (Query)        (Embedder + VectorStore)  (Prompt)     (text)
//! ```
//!
//! The [`pipeline::AnsweringPipeline`] composes these stages and maps every
//! failure to a [`models::AnswerOutcome::Degraded`] value with a stable
//! reason code, so callers never see an error from `answer`.
//!
//! External capabilities are injected through three traits:
//! [`embedding::Embedder`], [`store::VectorStore`], and
//! [`generation::Generator`]. Concrete HTTP and SQLite implementations live
//! in the `navi` application crate; this crate ships an
//! [`store::memory::InMemoryStore`] for tests and small corpora.

pub mod context_tag;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod retrieve;
pub mod store;

pub use error::NaviError;
pub use models::{AnswerOutcome, DegradeReason, KnowledgeEntry, Query, RetrievalResult};
pub use pipeline::AnsweringPipeline;
