//! Schema creation.
//!
//! Every statement is idempotent, so `init` and `import` can both call
//! [`ensure_schema`] on an existing database.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Open the configured database, create the schema and close it again.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    ensure_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS problems (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            source          TEXT NOT NULL DEFAULT 'leetcode',
            source_id       TEXT NOT NULL,
            slug            TEXT NOT NULL,
            title           TEXT NOT NULL,
            difficulty      TEXT NOT NULL CHECK(difficulty IN ('Easy','Medium','Hard')),
            description     TEXT NOT NULL DEFAULT '',
            examples        TEXT NOT NULL DEFAULT '[]',
            constraints     TEXT NOT NULL DEFAULT '[]',
            hints           TEXT NOT NULL DEFAULT '[]',
            python3_snippet TEXT NOT NULL DEFAULT '',
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(source, slug)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topics (
            id   INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS problem_topics (
            problem_id INTEGER NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
            topic_id   INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
            PRIMARY KEY (problem_id, topic_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // External-content FTS5 table over problems.title. No triggers: the
    // upserter maintains it explicitly and `import` rebuilds it at the end.
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='problems_fts'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE problems_fts USING fts5(
                title,
                content=problems,
                content_rowid=id
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_problem_topics_topic ON problem_topics(topic_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_problems_difficulty ON problems(difficulty)")
        .execute(pool)
        .await?;

    Ok(())
}
