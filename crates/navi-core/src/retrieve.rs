//! Category-scoped semantic retrieval.
//!
//! The [`Retriever`] embeds a query's clean message and asks the
//! [`VectorStore`] for the closest entries in the query's category. It adds
//! no policy of its own: embedding failures propagate, and an empty store
//! result is returned as-is.

use std::sync::Arc;

use tracing::{debug, info};

use crate::embedding::Embedder;
use crate::error::NaviError;
use crate::models::{Query, RetrievalResult};
use crate::store::VectorStore;

/// Retrieval tuning, decoupled from application config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalParams {
    /// Minimum cosine similarity for a match.
    pub threshold: f32,
    /// Maximum number of matches.
    pub top_k: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            top_k: 3,
        }
    }
}

#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    params: RetrievalParams,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        params: RetrievalParams,
    ) -> Self {
        Self {
            embedder,
            store,
            params,
        }
    }

    pub async fn retrieve(&self, query: &Query) -> Result<RetrievalResult, NaviError> {
        debug!(
            category = %query.category,
            model = self.embedder.model_name(),
            "embedding query"
        );
        let query_vec = self.embedder.embed(&query.clean_message).await?;

        let result = self
            .store
            .search(
                &query_vec,
                &query.category,
                self.params.threshold,
                self.params.top_k,
            )
            .await?;

        info!(
            category = %query.category,
            matches = result.len(),
            top_score = result.iter().next().map(|m| m.score),
            "retrieval complete"
        );
        Ok(result)
    }
}
