//! Wiring from configuration to a ready [`AnsweringPipeline`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use navi_core::embedding::Embedder;
use navi_core::store::VectorStore;
use navi_core::AnsweringPipeline;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::generation::create_generator;
use crate::sqlite_store::SqliteStore;
use crate::{db, migrate};

/// Open the knowledge database, creating the schema if it is missing.
pub async fn open_store(config: &Config) -> Result<SqliteStore> {
    let pool = db::connect(config)
        .await
        .with_context(|| format!("Failed to open database: {}", config.db.path.display()))?;
    migrate::apply(&pool).await?;
    Ok(SqliteStore::new(pool))
}

/// Build the pipeline named by `config`: SQLite store, configured
/// providers, retrieval parameters, and persona.
pub async fn build_pipeline(config: &Config) -> Result<AnsweringPipeline> {
    let store = open_store(config).await?;
    let embedder = create_embedder(&config.embedding)?;
    let generator = create_generator(&config.generation)?;
    dims_drift(embedder.as_ref(), &store).await?;

    info!(
        embedder = embedder.model_name(),
        generator = generator.model_name(),
        threshold = config.retrieval.match_threshold,
        top_k = config.retrieval.match_count,
        "pipeline ready"
    );

    Ok(AnsweringPipeline::with_settings(
        embedder,
        Arc::new(store),
        generator,
        config.retrieval.params(),
        config.prompt.assembler(),
    ))
}

/// Compare the embedder's vector size with what the store already holds.
///
/// A mismatch is logged at `error` but does not stop startup; every
/// question then degrades to `retrieval_failed` until the corpus is
/// re-seeded or `embedding.dims` is corrected. Returns `true` on drift.
pub async fn dims_drift(embedder: &dyn Embedder, store: &dyn VectorStore) -> Result<bool> {
    let expected = embedder.dims();
    if expected == 0 {
        return Ok(false);
    }
    let Some(stored) = store.dims().await? else {
        return Ok(false);
    };
    if stored != expected {
        error!(
            embedder = embedder.model_name(),
            expected,
            stored,
            "knowledge store vectors do not match embedding.dims"
        );
        return Ok(true);
    }
    Ok(false)
}
