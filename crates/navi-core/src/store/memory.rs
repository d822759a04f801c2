//! In-memory [`VectorStore`] for tests and small embedded corpora.
//!
//! Entries live in a `Vec` behind `std::sync::RwLock`; search is a
//! brute-force cosine scan over the requested category. A poisoned lock is
//! reported as [`NaviError::StoreUnavailable`].

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::NaviError;
use crate::models::{KnowledgeEntry, RetrievalResult};

use super::{check_dims, rank, VectorStore};

pub struct InMemoryStore {
    entries: RwLock<Vec<KnowledgeEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Build a store from a prepared corpus, validating every entry.
    pub fn with_entries(entries: Vec<KnowledgeEntry>) -> Result<Self, NaviError> {
        let store = Self::new();
        {
            let mut guard = store.write()?;
            for entry in entries {
                Self::admit(&guard, &entry)?;
                guard.push(entry);
            }
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<KnowledgeEntry>>, NaviError> {
        self.entries
            .read()
            .map_err(|_| NaviError::StoreUnavailable("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<KnowledgeEntry>>, NaviError> {
        self.entries
            .write()
            .map_err(|_| NaviError::StoreUnavailable("in-memory store lock poisoned".into()))
    }

    fn admit(existing: &[KnowledgeEntry], entry: &KnowledgeEntry) -> Result<(), NaviError> {
        entry.validate()?;
        check_dims(existing.first().map(KnowledgeEntry::dims), entry.dims())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn search(
        &self,
        query_vec: &[f32],
        category: &str,
        threshold: f32,
        top_k: usize,
    ) -> Result<RetrievalResult, NaviError> {
        let entries = self.read()?;
        check_dims(entries.first().map(KnowledgeEntry::dims), query_vec.len())?;

        let candidates = entries
            .iter()
            .filter(|e| e.category == category)
            .cloned();
        rank(query_vec, candidates, threshold, top_k)
    }

    async fn insert(&self, entry: KnowledgeEntry) -> Result<(), NaviError> {
        let mut entries = self.write()?;
        Self::admit(&entries, &entry)?;
        entries.push(entry);
        Ok(())
    }

    async fn dims(&self) -> Result<Option<usize>, NaviError> {
        Ok(self.read()?.first().map(KnowledgeEntry::dims))
    }
}
