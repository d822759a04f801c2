//! Knowledge base statistics.
//!
//! Summarizes what `navi seed` has loaded: entry counts per category, the
//! embedding dimensionality, and the database size. Used by `navi stats`
//! to confirm a corpus landed under the categories the frontend sends.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;

/// Per-category breakdown of stored entries.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: String,
    pub entry_count: i64,
    pub last_added_ts: i64,
}

/// Entry counts grouped by category, largest first.
pub async fn category_stats(pool: &SqlitePool) -> Result<Vec<CategoryStats>> {
    let rows = sqlx::query(
        r#"
        SELECT category, COUNT(*) AS entry_count, MAX(created_at) AS last_added
        FROM knowledge_entries
        GROUP BY category
        ORDER BY entry_count DESC, category ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| CategoryStats {
            category: row.get("category"),
            entry_count: row.get("entry_count"),
            last_added_ts: row.get("last_added"),
        })
        .collect())
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM knowledge_entries")
        .fetch_one(&pool)
        .await?;

    let dims: Option<i64> =
        sqlx::query_scalar("SELECT dims FROM knowledge_entries ORDER BY id LIMIT 1")
            .fetch_optional(&pool)
            .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Navi Knowledge Base Stats");
    println!("=========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Entries:     {}", total);
    println!(
        "  Dimensions:  {}",
        dims.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  Embedder:    {} ({})",
        config.embedding.provider,
        config.embedding.model.as_deref().unwrap_or("-")
    );

    if let Some(d) = dims {
        if config.embedding.is_enabled() && config.embedding.dims != Some(d as usize) {
            println!(
                "  WARNING: store holds {}-dim vectors but embedding.dims is {}",
                d,
                config
                    .embedding
                    .dims
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unset".to_string())
            );
        }
    }

    let categories = category_stats(&pool).await?;
    if !categories.is_empty() {
        println!();
        println!("  By category:");
        println!("  {:<40} {:>8}   {}", "CATEGORY", "ENTRIES", "LAST ADDED");
        println!("  {}", "-".repeat(66));

        for c in &categories {
            println!(
                "  {:<40} {:>8}   {}",
                c.category,
                c.entry_count,
                format_ts_relative(c.last_added_ts)
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
