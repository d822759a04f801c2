//! Retrieval-only search over the knowledge base.
//!
//! `navi search` runs the same embed-and-rank step the answering pipeline
//! uses, without generation, so a corpus can be checked for coverage and
//! scoring before anyone asks it a question.

use std::sync::Arc;

use anyhow::{bail, Result};

use navi_core::context_tag;
use navi_core::retrieve::{RetrievalParams, Retriever};
use navi_core::{Query, RetrievalResult};

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::pipeline::open_store;

/// Resolve the query scope: `--category` wins over an inline tag, which is
/// stripped from the question either way.
fn resolve_query(query: &str, category: Option<&str>) -> Option<Query> {
    let parsed = match category {
        Some(category) => Query::scoped(category, query),
        None => context_tag::parse(query),
    };
    parsed.ok()
}

/// Retrieval parameters from config with command-line overrides applied.
fn effective_params(
    config: &Config,
    limit: Option<usize>,
    threshold: Option<f32>,
) -> Result<RetrievalParams> {
    let mut params = config.retrieval.params();
    if let Some(limit) = limit {
        if limit == 0 {
            bail!("--limit must be >= 1");
        }
        params.top_k = limit;
    }
    if let Some(threshold) = threshold {
        if !(-1.0..=1.0).contains(&threshold) {
            bail!("--threshold must be in [-1.0, 1.0]");
        }
        params.threshold = threshold;
    }
    Ok(params)
}

pub async fn run_search(
    config: &Config,
    query: &str,
    category: Option<&str>,
    limit: Option<usize>,
    threshold: Option<f32>,
) -> Result<()> {
    let Some(query) = resolve_query(query, category) else {
        println!("No results.");
        return Ok(());
    };

    if !config.embedding.is_enabled() {
        bail!("Search requires embeddings. Set [embedding] provider in config.");
    }

    let params = effective_params(config, limit, threshold)?;
    let embedder = create_embedder(&config.embedding)?;
    let store = open_store(config).await?;
    let retriever = Retriever::new(embedder, Arc::new(store), params);

    let result = retriever.retrieve(&query).await?;
    print_results(&query, &result);
    Ok(())
}

fn print_results(query: &Query, result: &RetrievalResult) {
    if result.is_empty() {
        println!("No results.");
        return;
    }

    println!("Category: {}", query.category);
    println!();
    for (i, m) in result.iter().enumerate() {
        println!("{}. [{:.3}] {}", i + 1, m.score, m.entry.category);
        for line in m.entry.content.lines() {
            println!("    {}", line);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        toml::from_str("[db]\npath = \"/tmp/navi.sqlite\"\n").unwrap()
    }

    #[test]
    fn test_category_flag_overrides_tag() {
        let query = resolve_query("[Context: Library] hours?", Some("General")).unwrap();
        assert_eq!(query.category, "General");
        assert_eq!(query.clean_message, "hours?");

        let query = resolve_query("[Context: Library] hours?", None).unwrap();
        assert_eq!(query.category, "Library");
        assert_eq!(query.clean_message, "hours?");
    }

    #[test]
    fn test_blank_query_has_no_results() {
        assert!(resolve_query("   ", None).is_none());
    }

    #[test]
    fn test_overrides_are_validated() {
        let cfg = config();
        let params = effective_params(&cfg, Some(10), Some(0.5)).unwrap();
        assert_eq!(params.top_k, 10);
        assert_eq!(params.threshold, 0.5);
        assert!(effective_params(&cfg, Some(0), None).is_err());
        assert!(effective_params(&cfg, None, Some(2.0)).is_err());
    }
}
