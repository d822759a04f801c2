//! SQLite-backed [`VectorStore`].
//!
//! Entries live in the `knowledge_entries` table with their embedding as a
//! little-endian `f32` blob. Search loads the requested category in
//! insertion order and ranks it in process with the same rules as
//! [`InMemoryStore`](navi_core::store::memory::InMemoryStore).

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use navi_core::embedding::{blob_to_vec, vec_to_blob};
use navi_core::store::{check_dims, rank, VectorStore};
use navi_core::{KnowledgeEntry, NaviError, RetrievalResult};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn store_err(e: sqlx::Error) -> NaviError {
    NaviError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn search(
        &self,
        query_vec: &[f32],
        category: &str,
        threshold: f32,
        top_k: usize,
    ) -> Result<RetrievalResult, NaviError> {
        check_dims(self.dims().await?, query_vec.len())?;

        let rows = sqlx::query(
            "SELECT content, category, embedding FROM knowledge_entries WHERE category = ? ORDER BY id",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let candidates = rows.into_iter().map(|row| {
            let blob: Vec<u8> = row.get("embedding");
            KnowledgeEntry::new(
                row.get::<String, _>("content"),
                blob_to_vec(&blob),
                row.get::<String, _>("category"),
            )
        });

        rank(query_vec, candidates, threshold, top_k)
    }

    async fn insert(&self, entry: KnowledgeEntry) -> Result<(), NaviError> {
        entry.validate()?;
        check_dims(self.dims().await?, entry.dims())?;

        sqlx::query(
            "INSERT INTO knowledge_entries (content, category, embedding, dims, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&entry.content)
        .bind(&entry.category)
        .bind(vec_to_blob(&entry.embedding))
        .bind(entry.dims() as i64)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn dims(&self) -> Result<Option<usize>, NaviError> {
        let dims: Option<i64> =
            sqlx::query_scalar("SELECT dims FROM knowledge_entries ORDER BY id LIMIT 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;
        Ok(dims.map(|d| d as usize))
    }
}
