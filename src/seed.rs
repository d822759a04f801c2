//! Corpus loading.
//!
//! `navi seed <file.json>` reads a JSON array of knowledge items, embeds
//! each item's text with the configured embedder, and appends it to the
//! store under its category:
//!
//! ```json
//! [
//!   { "id": 1, "text": "The library is open 8am-6pm.", "category": "General" },
//!   { "id": "eng-1", "text": "The dean's office is Room 101.", "category": "College of Engineering" }
//! ]
//! ```
//!
//! `id` is only used in progress output; `category` defaults to `"General"`.
//! The whole file is validated before the first embedding call. A failure
//! on one item is reported and the remaining items are still loaded.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use navi_core::embedding::Embedder;
use navi_core::models::GENERAL_CATEGORY;
use navi_core::store::VectorStore;
use navi_core::KnowledgeEntry;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::pipeline::open_store;

#[derive(Debug, Clone, Deserialize)]
pub struct CorpusItem {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl CorpusItem {
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(GENERAL_CATEGORY)
    }

    /// Label for progress output: the item's `id`, or its position.
    fn label(&self, index: usize) -> String {
        match &self.id {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => format!("#{}", index + 1),
        }
    }
}

/// Parse and validate a corpus file.
pub fn load_corpus(path: &Path) -> Result<Vec<CorpusItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
    let items: Vec<CorpusItem> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse corpus file: {}", path.display()))?;

    for (i, item) in items.iter().enumerate() {
        if item.text.trim().is_empty() {
            bail!("corpus item {} has empty text", item.label(i));
        }
    }
    Ok(items)
}

/// Outcome counts for one seeding run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub added: usize,
    pub failed: usize,
}

/// Embed and insert every item, continuing past per-item failures.
pub async fn seed_items(
    items: &[CorpusItem],
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
) -> SeedReport {
    let mut report = SeedReport::default();

    for (i, item) in items.iter().enumerate() {
        let label = item.label(i);
        let result = async {
            let embedding = embedder.embed(&item.text).await?;
            store
                .insert(KnowledgeEntry::new(item.text.clone(), embedding, item.category()))
                .await
        }
        .await;

        match result {
            Ok(()) => {
                report.added += 1;
                info!(item = %label, category = item.category(), "added");
            }
            Err(e) => {
                report.failed += 1;
                warn!(item = %label, error = %e, "failed to add corpus item");
            }
        }
    }

    report
}

pub async fn run_seed(config: &Config, path: &Path, dry_run: bool) -> Result<()> {
    let items = load_corpus(path)?;

    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for item in &items {
        *by_category.entry(item.category()).or_default() += 1;
    }

    if dry_run {
        println!("seed {} (dry-run)", path.display());
        println!("  items found: {}", items.len());
        for (category, count) in &by_category {
            println!("  {}: {}", category, count);
        }
        return Ok(());
    }

    if !config.embedding.is_enabled() {
        bail!("Seeding requires embeddings. Set [embedding] provider in config.");
    }

    let embedder = create_embedder(&config.embedding)?;
    let store = open_store(config).await?;

    let report = seed_items(&items, embedder.as_ref(), &store).await;

    println!("seed {}", path.display());
    println!("  items found: {}", items.len());
    println!("  added: {}", report.added);
    println!("  categories: {}", by_category.len());
    if report.failed > 0 {
        println!("  failed: {}", report.failed);
        bail!(
            "{} of {} corpus items failed to load",
            report.failed,
            items.len()
        );
    }
    println!("ok");

    Ok(())
}
