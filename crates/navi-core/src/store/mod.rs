//! Knowledge store abstraction.
//!
//! The [`VectorStore`] trait is the only way the retrieval path reads
//! knowledge. Backends own their entries for the process lifetime and must
//! be `Send + Sync` so one store can serve concurrent questions.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`search`](VectorStore::search) | Category-scoped cosine nearest neighbours |
//! | [`insert`](VectorStore::insert) | Add an entry during corpus loading |
//! | [`dims`](VectorStore::dims) | Dimensionality shared by all stored entries |
//!
//! Backends share the ranking rules through [`rank`], so the in-memory and
//! SQLite stores order results identically.

pub mod memory;

use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::error::NaviError;
use crate::models::{KnowledgeEntry, RetrievalResult, ScoredEntry};

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return up to `top_k` entries in `category` whose cosine similarity to
    /// `query_vec` is at least `threshold`, best first, ties in insertion
    /// order.
    ///
    /// - Category matching is exact and case-sensitive.
    /// - No match is an empty result, not an error.
    /// - A query whose length differs from the stored dimensionality fails
    ///   with [`NaviError::DimensionMismatch`].
    /// - Backend failures surface as [`NaviError::StoreUnavailable`].
    async fn search(
        &self,
        query_vec: &[f32],
        category: &str,
        threshold: f32,
        top_k: usize,
    ) -> Result<RetrievalResult, NaviError>;

    /// Append an entry. The first entry fixes the store's dimensionality.
    async fn insert(&self, entry: KnowledgeEntry) -> Result<(), NaviError>;

    /// Dimensionality of stored embeddings, or `None` while empty.
    async fn dims(&self) -> Result<Option<usize>, NaviError>;
}

/// Fail when a vector's length disagrees with the store's dimensionality.
/// An empty store accepts any length.
pub fn check_dims(store_dims: Option<usize>, actual: usize) -> Result<(), NaviError> {
    match store_dims {
        Some(expected) if expected != actual => {
            Err(NaviError::DimensionMismatch { expected, actual })
        }
        _ => Ok(()),
    }
}

/// Score candidates against `query_vec`, keep those at or above
/// `threshold`, and return the best `top_k`.
///
/// `candidates` must already be filtered to one category and yielded in
/// insertion order; the sort is stable, so equal scores keep that order.
pub fn rank<I>(
    query_vec: &[f32],
    candidates: I,
    threshold: f32,
    top_k: usize,
) -> Result<RetrievalResult, NaviError>
where
    I: IntoIterator<Item = KnowledgeEntry>,
{
    if top_k == 0 {
        return Ok(RetrievalResult::empty());
    }

    let mut scored = Vec::new();
    for entry in candidates {
        check_dims(Some(entry.dims()), query_vec.len())?;
        let score = cosine_similarity(query_vec, &entry.embedding);
        if score >= threshold {
            scored.push(ScoredEntry { entry, score });
        }
    }

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);
    Ok(RetrievalResult::from_ranked(scored))
}
