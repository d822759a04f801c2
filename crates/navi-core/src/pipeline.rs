//! Top-level question answering.
//!
//! [`AnsweringPipeline`] runs one question through four stages and always
//! finishes with an [`AnswerOutcome`]:
//!
//! ```text
//! Parsing ──▶ Retrieving ──▶ Assembling ──▶ Generating ──▶ Done
//!    │             │                             │
//!    └─ invalid_query ─┴─ retrieval_failed ──────┴─ generation_failed ─▶ Done
//! ```
//!
//! Stages run strictly in order with no retries; every failure is mapped
//! to a degraded outcome with a stable [`DegradeReason`]. An empty
//! retrieval result is not a failure: the generator is still asked, and
//! the prompt tells it to say it has no information for the category.
//!
//! The pipeline holds only shared, read-only collaborators, so one instance
//! can answer many questions concurrently. Dropping an `answer` future
//! abandons whichever external call is in flight.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::context_tag;
use crate::embedding::Embedder;
use crate::error::NaviError;
use crate::generation::Generator;
use crate::models::{AnswerOutcome, DegradeReason, Query, RetrievalResult};
use crate::prompt::{Prompt, PromptAssembler};
use crate::retrieve::{RetrievalParams, Retriever};
use crate::store::VectorStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parsing,
    Retrieving,
    Assembling,
    Generating,
    Done,
}

/// Everything one call produced, for diagnostics and `--explain` output.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub outcome: AnswerOutcome,
    /// The stage that produced the outcome.
    pub decided_at: Stage,
    pub query: Option<Query>,
    pub retrieval: Option<RetrievalResult>,
    pub prompt: Option<Prompt>,
}

impl PipelineRun {
    fn degraded(reason: DegradeReason, decided_at: Stage) -> Self {
        Self {
            outcome: AnswerOutcome::degraded(reason),
            decided_at,
            query: None,
            retrieval: None,
            prompt: None,
        }
    }
}

#[derive(Clone)]
pub struct AnsweringPipeline {
    retriever: Retriever,
    assembler: PromptAssembler,
    generator: Arc<dyn Generator>,
}

impl AnsweringPipeline {
    /// Pipeline with default retrieval parameters and persona.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self::with_settings(
            embedder,
            store,
            generator,
            RetrievalParams::default(),
            PromptAssembler::default(),
        )
    }

    pub fn with_settings(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
        params: RetrievalParams,
        assembler: PromptAssembler,
    ) -> Self {
        Self {
            retriever: Retriever::new(embedder, store, params),
            assembler,
            generator,
        }
    }

    /// Answer a raw message that may carry a `[Context: …]` tag.
    pub async fn answer(&self, raw_message: &str) -> AnswerOutcome {
        self.run(raw_message).await.outcome
    }

    /// Like [`answer`](Self::answer), returning the full run record.
    pub async fn run(&self, raw_message: &str) -> PipelineRun {
        debug!(stage = ?Stage::Parsing, "answering");
        match context_tag::parse(raw_message) {
            Ok(query) => self.run_query(query).await,
            Err(_) => Self::reject_query(),
        }
    }

    /// Run with a structured category instead of an inline tag.
    ///
    /// An inline tag is still stripped from the question; `category` wins.
    pub async fn run_scoped(&self, category: &str, message: &str) -> PipelineRun {
        debug!(stage = ?Stage::Parsing, "answering");
        match Query::scoped(category, message) {
            Ok(query) => self.run_query(query).await,
            Err(_) => Self::reject_query(),
        }
    }

    /// Run from the `Retrieving` stage onward.
    pub async fn run_query(&self, query: Query) -> PipelineRun {
        debug!(stage = ?Stage::Retrieving, category = %query.category);
        let retrieval = match self.retriever.retrieve(&query).await {
            Ok(result) => result,
            Err(err) => {
                log_retrieval_failure(&err);
                let mut run =
                    PipelineRun::degraded(DegradeReason::RetrievalFailed, Stage::Retrieving);
                run.query = Some(query);
                return run;
            }
        };

        debug!(stage = ?Stage::Assembling, matches = retrieval.len());
        let prompt = self.assembler.assemble(&query, &retrieval);

        debug!(stage = ?Stage::Generating, model = self.generator.model_name());
        let outcome = match self.generator.generate(&prompt).await {
            Ok(text) => AnswerOutcome::Answered { text },
            Err(err) => {
                warn!(error = %err, "generation failed");
                AnswerOutcome::degraded(DegradeReason::GenerationFailed)
            }
        };

        debug!(stage = ?Stage::Done, answered = outcome.is_answered());
        PipelineRun {
            outcome,
            decided_at: Stage::Generating,
            query: Some(query),
            retrieval: Some(retrieval),
            prompt: Some(prompt),
        }
    }

    fn reject_query() -> PipelineRun {
        debug!("rejecting empty question");
        PipelineRun::degraded(DegradeReason::InvalidQuery, Stage::Parsing)
    }
}

fn log_retrieval_failure(err: &NaviError) {
    if err.is_invariant_violation() {
        error!(error = %err, "embedder and knowledge store disagree on vector size");
    } else {
        warn!(error = %err, "retrieval failed");
    }
}
