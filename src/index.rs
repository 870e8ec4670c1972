//! Maintenance of the `problems_fts` title index.
//!
//! `problems_fts` is an external-content FTS5 table, so removing an entry
//! requires the exact title that was indexed. The upserter calls these
//! helpers inside its transaction; [`rebuild_index`] runs once at the end of
//! an import and regenerates the whole index from `problems`.

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};

pub async fn add_entry(conn: &mut SqliteConnection, problem_id: i64, title: &str) -> Result<()> {
    sqlx::query("INSERT INTO problems_fts(rowid, title) VALUES (?, ?)")
        .bind(problem_id)
        .bind(title)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Remove the entry for `problem_id`. `indexed_title` must be the title that
/// was stored when the entry was added.
pub async fn remove_entry(
    conn: &mut SqliteConnection,
    problem_id: i64,
    indexed_title: &str,
) -> Result<()> {
    sqlx::query("INSERT INTO problems_fts(problems_fts, rowid, title) VALUES ('delete', ?, ?)")
        .bind(problem_id)
        .bind(indexed_title)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn replace_entry(
    conn: &mut SqliteConnection,
    problem_id: i64,
    old_title: &str,
    new_title: &str,
) -> Result<()> {
    remove_entry(conn, problem_id, old_title).await?;
    add_entry(conn, problem_id, new_title).await
}

/// Regenerate the whole index from the `problems` table.
pub async fn rebuild_index(pool: &SqlitePool) -> Result<()> {
    sqlx::query("INSERT INTO problems_fts(problems_fts) VALUES ('rebuild')")
        .execute(pool)
        .await
        .context("Failed to rebuild problems_fts")?;
    tracing::info!("search index rebuilt");
    Ok(())
}
