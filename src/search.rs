//! Title search over the FTS5 index.
//!
//! Queries are split on whitespace and every token is quoted as an FTS5
//! phrase, so punctuation in user input never reaches the FTS query parser.
//! The last token is matched as a prefix, which makes partially typed titles
//! ("two su") find their problem.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::SearchHit;

pub const DEFAULT_LIMIT: i64 = 20;

pub async fn run_search(config: &Config, query: &str, limit: Option<i64>) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::ensure_schema(&pool).await?;
    let hits = search_titles(&pool, query, limit.unwrap_or(DEFAULT_LIMIT)).await?;
    pool.close().await;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let id_display = if hit.source_id.is_empty() {
            "-".to_string()
        } else {
            format!("#{}", hit.source_id)
        };
        println!(
            "{}. {} {} [{}]",
            i + 1,
            id_display,
            hit.title,
            hit.difficulty
        );
        println!("    slug: {}", hit.slug);
        println!("    id: {}", hit.id);
    }

    Ok(())
}

/// Return problems whose title matches every token of `query`.
pub async fn search_titles(pool: &SqlitePool, query: &str, limit: i64) -> Result<Vec<SearchHit>> {
    let Some(match_expr) = build_match_query(query) else {
        return Ok(Vec::new());
    };

    let rows = sqlx::query(
        r#"
        SELECT p.id, p.source_id, p.slug, p.title, p.difficulty
        FROM problems_fts
        JOIN problems p ON p.id = problems_fts.rowid
        WHERE problems_fts MATCH ?
        ORDER BY problems_fts.rank, p.id
        LIMIT ?
        "#,
    )
    .bind(&match_expr)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let hits = rows
        .iter()
        .map(|row| SearchHit {
            id: row.get("id"),
            source_id: row.get("source_id"),
            slug: row.get("slug"),
            title: row.get("title"),
            difficulty: row.get("difficulty"),
        })
        .collect();

    Ok(hits)
}

/// Build an FTS5 MATCH expression, or `None` for a blank query.
fn build_match_query(query: &str) -> Option<String> {
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect();

    if tokens.is_empty() {
        return None;
    }

    Some(format!("{}*", tokens.join(" ")))
}
