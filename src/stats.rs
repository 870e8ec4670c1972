//! Import summary and database statistics.
//!
//! [`print_import_summary`] is the report printed after `problem-db import`;
//! [`run_stats`] backs `problem-db stats` and gives a quick overview of an
//! existing database: problem, topic and association counts plus a
//! per-difficulty breakdown.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::ImportSummary;
use crate::progress::format_number;

pub fn print_import_summary(summary: &ImportSummary) {
    println!("import {}", summary.source);
    println!("  found: {} records", summary.found);
    println!("  imported problems: {}", summary.imported);
    println!("    inserted: {}", summary.inserted);
    println!("    updated: {}", summary.updated);
    println!("  skipped: {}", summary.skipped());
    println!("  database: {}", summary.db_path.display());
    println!("  size: {}", format_bytes(summary.db_size));
    println!("ok");
}

/// Query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::ensure_schema(&pool).await?;

    let total_problems: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM problems")
        .fetch_one(&pool)
        .await?;
    let total_topics: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM topics")
        .fetch_one(&pool)
        .await?;
    let total_links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM problem_topics")
        .fetch_one(&pool)
        .await?;
    let unreferenced_topics: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM topics t WHERE NOT EXISTS (SELECT 1 FROM problem_topics pt WHERE pt.topic_id = t.id)",
    )
    .fetch_one(&pool)
    .await?;
    let last_update: Option<String> = sqlx::query_scalar("SELECT MAX(updated_at) FROM problems")
        .fetch_one(&pool)
        .await?;

    let difficulty_rows = sqlx::query(
        r#"
        SELECT difficulty, COUNT(*) AS n
        FROM problems
        GROUP BY difficulty
        ORDER BY CASE difficulty WHEN 'Easy' THEN 0 WHEN 'Medium' THEN 1 ELSE 2 END
        "#,
    )
    .fetch_all(&pool)
    .await?;

    pool.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Problem DB: Database Stats");
    println!("==========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Problems:    {}", format_number(total_problems.max(0) as u64));
    println!(
        "  Topics:      {} ({} unreferenced)",
        format_number(total_topics.max(0) as u64),
        unreferenced_topics
    );
    println!("  Links:       {}", format_number(total_links.max(0) as u64));
    println!(
        "  Last update: {}",
        last_update.as_deref().unwrap_or("never")
    );

    if !difficulty_rows.is_empty() {
        println!();
        println!("  By difficulty:");
        for row in &difficulty_rows {
            let difficulty: String = row.get("difficulty");
            let n: i64 = row.get("n");
            println!("  {:<10} {:>6}", difficulty, n);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
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
