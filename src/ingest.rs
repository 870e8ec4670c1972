//! Import pipeline: load the dump, upsert every record, rebuild the index.
//!
//! Each record is reconciled against `problems` by its natural key
//! `(source, slug)` inside its own transaction:
//!
//! 1. find the existing row, then insert or update it,
//! 2. keep `problems_fts` in step with the title,
//! 3. replace the problem's topic associations.
//!
//! Records without a title or slug are skipped and counted. Anything else
//! that goes wrong (unreadable dump, wrong field type, unknown difficulty,
//! storage error) aborts the run. Re-running is safe: the upsert is keyed by
//! the natural key, so nothing is duplicated.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::config::Config;
use crate::db;
use crate::index;
use crate::loader;
use crate::migrate;
use crate::models::{Difficulty, ImportSummary, ProblemRecord, UpsertOutcome};
use crate::progress::{ImportProgressEvent, ImportProgressReporter};

/// Where the dump comes from.
#[derive(Debug, Clone)]
pub enum DumpSource {
    File(PathBuf),
    Url(String),
}

impl fmt::Display for DumpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpSource::File(path) => write!(f, "{}", path.display()),
            DumpSource::Url(url) => f.write_str(url),
        }
    }
}

/// Topic name → id, filled lazily during one import run.
///
/// Topics are never updated or deleted, so an entry never goes stale.
#[derive(Debug, Default)]
pub struct TopicCache {
    ids: HashMap<String, i64>,
}

impl TopicCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.ids.get(name).copied()
    }

    /// Return the id of topic `name`, creating the row if it does not exist.
    async fn resolve(&mut self, conn: &mut SqliteConnection, name: &str) -> Result<i64> {
        if let Some(id) = self.get(name) {
            return Ok(id);
        }

        sqlx::query("INSERT OR IGNORE INTO topics (name) VALUES (?)")
            .bind(name)
            .execute(&mut *conn)
            .await?;
        let id: i64 = sqlx::query_scalar("SELECT id FROM topics WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;

        self.ids.insert(name.to_string(), id);
        Ok(id)
    }
}

/// Run a full import and return its summary. The database is closed before
/// its size is measured so the WAL has been folded into the main file.
pub async fn run_import(
    config: &Config,
    source: &DumpSource,
    progress: &dyn ImportProgressReporter,
) -> Result<ImportSummary> {
    let envelope_field = &config.import.envelope_field;

    progress.report(ImportProgressEvent::Loading {
        source: source.to_string(),
    });
    let records = match source {
        DumpSource::File(path) => loader::load_local(path, envelope_field)?,
        DumpSource::Url(url) => {
            loader::fetch_remote(url, envelope_field, config.import.timeout_secs).await?
        }
    };
    let total = records.len() as u64;
    tracing::info!(records = total, "problem dump loaded");

    let pool = db::connect(config).await?;
    migrate::ensure_schema(&pool).await?;

    let mut cache = TopicCache::new();
    let mut inserted = 0u64;
    let mut updated = 0u64;

    for (i, record) in records.iter().enumerate() {
        let outcome = upsert_problem(&pool, &config.import.source, record, &mut cache)
            .await
            .with_context(|| format!("Failed to import record #{}", i + 1))?;
        match outcome {
            UpsertOutcome::Inserted(_) => inserted += 1,
            UpsertOutcome::Updated(_) => updated += 1,
            UpsertOutcome::Skipped => {}
        }

        let n = i as u64 + 1;
        if n % config.import.progress_every == 0 || n == total {
            progress.report(ImportProgressEvent::Importing { n, total });
        }
    }

    progress.report(ImportProgressEvent::Indexing);
    index::rebuild_index(&pool).await?;
    tracing::debug!(topics = cache.len(), "topic cache size at end of run");

    pool.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(ImportSummary {
        source: config.import.source.clone(),
        found: total,
        imported: inserted + updated,
        inserted,
        updated,
        db_path: config.db.path.clone(),
        db_size,
    })
}

/// Reconcile one raw record against storage.
pub async fn upsert_problem(
    pool: &SqlitePool,
    source: &str,
    raw: &Value,
    cache: &mut TopicCache,
) -> Result<UpsertOutcome> {
    match extract_record(raw)? {
        Some(record) => upsert_record(pool, source, &record, cache).await,
        None => {
            tracing::debug!("skipping record without title or slug");
            Ok(UpsertOutcome::Skipped)
        }
    }
}

/// Insert or update `record` under `(source, record.slug)` and replace its topics.
pub async fn upsert_record(
    pool: &SqlitePool,
    source: &str,
    record: &ProblemRecord,
    cache: &mut TopicCache,
) -> Result<UpsertOutcome> {
    let now = now_timestamp();
    let mut tx = pool.begin().await?;

    let existing: Option<(i64, String)> =
        sqlx::query_as("SELECT id, title FROM problems WHERE source = ? AND slug = ?")
            .bind(source)
            .bind(&record.slug)
            .fetch_optional(&mut *tx)
            .await?;

    let (problem_id, outcome) = match existing {
        None => {
            let result = sqlx::query(
                r#"
                INSERT INTO problems (source, source_id, slug, title, difficulty, description,
                                      examples, constraints, hints, python3_snippet,
                                      created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(source)
            .bind(&record.source_id)
            .bind(&record.slug)
            .bind(&record.title)
            .bind(record.difficulty.as_str())
            .bind(&record.description)
            .bind(&record.examples)
            .bind(&record.constraints)
            .bind(&record.hints)
            .bind(&record.python3_snippet)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

            let id = result.last_insert_rowid();
            index::add_entry(&mut tx, id, &record.title).await?;
            (id, UpsertOutcome::Inserted(id))
        }
        Some((id, old_title)) => {
            sqlx::query(
                r#"
                UPDATE problems SET
                    source_id = ?,
                    title = ?,
                    difficulty = ?,
                    description = ?,
                    examples = ?,
                    constraints = ?,
                    hints = ?,
                    python3_snippet = ?,
                    updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&record.source_id)
            .bind(&record.title)
            .bind(record.difficulty.as_str())
            .bind(&record.description)
            .bind(&record.examples)
            .bind(&record.constraints)
            .bind(&record.hints)
            .bind(&record.python3_snippet)
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

            index::replace_entry(&mut tx, id, &old_title, &record.title).await?;
            (id, UpsertOutcome::Updated(id))
        }
    };

    sqlx::query("DELETE FROM problem_topics WHERE problem_id = ?")
        .bind(problem_id)
        .execute(&mut *tx)
        .await?;

    for name in &record.topics {
        let topic_id = cache.resolve(&mut tx, name).await?;
        sqlx::query("INSERT OR IGNORE INTO problem_topics (problem_id, topic_id) VALUES (?, ?)")
            .bind(problem_id)
            .bind(topic_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(outcome)
}

/// Delete the problem `(source, slug)` together with its index entry.
/// Associations go with it through `ON DELETE CASCADE`. Returns whether a
/// row existed.
pub async fn delete_problem(pool: &SqlitePool, source: &str, slug: &str) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let existing: Option<(i64, String)> =
        sqlx::query_as("SELECT id, title FROM problems WHERE source = ? AND slug = ?")
            .bind(source)
            .bind(slug)
            .fetch_optional(&mut *tx)
            .await?;

    let Some((id, title)) = existing else {
        return Ok(false);
    };

    index::remove_entry(&mut tx, id, &title).await?;
    sqlx::query("DELETE FROM problems WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

/// Extract and default the fields of one raw record.
///
/// Returns `Ok(None)` when `title` or `problem_slug` is missing, null or
/// empty. A field that is present with the wrong JSON type is an error.
pub fn extract_record(raw: &Value) -> Result<Option<ProblemRecord>> {
    let Some(obj) = raw.as_object() else {
        bail!("problem record is not a JSON object");
    };

    let title = optional_string(obj, "title")?.unwrap_or_default();
    let slug = optional_string(obj, "problem_slug")?.unwrap_or_default();
    if title.is_empty() || slug.is_empty() {
        return Ok(None);
    }

    let source_id = match present(obj, "frontend_id").or_else(|| present(obj, "problem_id")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => bail!("problem '{}': id must be a string or number, got {}", slug, other),
        None => String::new(),
    };

    let difficulty = match optional_string(obj, "difficulty")? {
        Some(d) => d
            .parse::<Difficulty>()
            .with_context(|| format!("problem '{}'", slug))?,
        None => Difficulty::default(),
    };

    let description = optional_string(obj, "description")?.unwrap_or_default();

    let python3_snippet = match present(obj, "code_snippets") {
        Some(Value::Object(snippets)) => optional_string(snippets, "python3")?.unwrap_or_default(),
        Some(_) => bail!("problem '{}': code_snippets must be an object", slug),
        None => String::new(),
    };

    let topics = match present(obj, "topics") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|t| match t {
                Value::String(s) => Ok(s.clone()),
                other => bail!("problem '{}': topic must be a string, got {}", slug, other),
            })
            .collect::<Result<Vec<_>>>()?,
        Some(_) => bail!("problem '{}': topics must be a list", slug),
        None => Vec::new(),
    };

    Ok(Some(ProblemRecord {
        source_id,
        slug,
        title,
        difficulty,
        description,
        examples: sub_document(obj, "examples"),
        constraints: sub_document(obj, "constraints"),
        hints: sub_document(obj, "hints"),
        python3_snippet,
        topics,
    }))
}

/// The value under `key`, treating JSON null as absent.
fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn optional_string(obj: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match present(obj, key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => bail!("field '{}' must be a string, got {}", key, other),
        None => Ok(None),
    }
}

/// Opaque structured field, stored as JSON text; `[]` when absent.
fn sub_document(obj: &Map<String, Value>, key: &str) -> String {
    match present(obj, key) {
        Some(v) => v.to_string(),
        None => "[]".to_string(),
    }
}

/// Current time in the format SQLite's `datetime('now')` produces.
fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::search_titles;
    use serde_json::json;
    use tempfile::TempDir;

    async fn test_pool(tmp: &TempDir) -> SqlitePool {
        let mut cfg = Config::default();
        cfg.db.path = tmp.path().join("problems.db");
        let pool = db::connect(&cfg).await.unwrap();
        migrate::ensure_schema(&pool).await.unwrap();
        pool
    }

    async fn count(pool: &SqlitePool, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
    }

    async fn topics_of(pool: &SqlitePool, slug: &str) -> Vec<String> {
        sqlx::query_scalar(
            r#"
            SELECT t.name FROM topics t
            JOIN problem_topics pt ON pt.topic_id = t.id
            JOIN problems p ON p.id = pt.problem_id
            WHERE p.slug = ?
            ORDER BY t.name
            "#,
        )
        .bind(slug)
        .fetch_all(pool)
        .await
        .unwrap()
    }

    // ============ Extraction ============

    #[test]
    fn extract_applies_defaults() {
        let record = extract_record(&json!({"title": "Two Sum", "problem_slug": "two-sum"}))
            .unwrap()
            .unwrap();
        assert_eq!(record.source_id, "");
        assert_eq!(record.difficulty, Difficulty::Medium);
        assert_eq!(record.description, "");
        assert_eq!(record.examples, "[]");
        assert_eq!(record.constraints, "[]");
        assert_eq!(record.hints, "[]");
        assert_eq!(record.python3_snippet, "");
        assert!(record.topics.is_empty());
    }

    #[test]
    fn extract_skips_missing_or_empty_required_fields() {
        assert!(extract_record(&json!({"title": "Two Sum"})).unwrap().is_none());
        assert!(extract_record(&json!({"problem_slug": "two-sum"})).unwrap().is_none());
        assert!(extract_record(&json!({})).unwrap().is_none());
        assert!(extract_record(&json!({"title": "", "problem_slug": "x"}))
            .unwrap()
            .is_none());
        assert!(extract_record(&json!({"title": "x", "problem_slug": null}))
            .unwrap()
            .is_none());
    }

    #[test]
    fn extract_source_id_fallback_order() {
        let both = json!({"title": "t", "problem_slug": "s", "frontend_id": "1", "problem_id": 7});
        assert_eq!(extract_record(&both).unwrap().unwrap().source_id, "1");

        let only_problem_id = json!({"title": "t", "problem_slug": "s", "problem_id": 7});
        assert_eq!(extract_record(&only_problem_id).unwrap().unwrap().source_id, "7");
    }

    #[test]
    fn extract_reads_python3_snippet_and_serializes_sub_documents() {
        let raw = json!({
            "title": "t",
            "problem_slug": "s",
            "code_snippets": {"python3": "class Solution: ...", "cpp": "class Solution {};"},
            "hints": ["use a map"],
            "examples": [{"input": "1", "output": "2"}]
        });
        let record = extract_record(&raw).unwrap().unwrap();
        assert_eq!(record.python3_snippet, "class Solution: ...");
        assert_eq!(record.hints, r#"["use a map"]"#);
        assert_eq!(record.examples, r#"[{"input":"1","output":"2"}]"#);
    }

    #[test]
    fn extract_rejects_wrong_types() {
        assert!(extract_record(&json!("not an object")).is_err());
        assert!(extract_record(&json!({"title": 5, "problem_slug": "s"})).is_err());
        assert!(extract_record(&json!({"title": "t", "problem_slug": "s", "topics": "Array"})).is_err());
        assert!(extract_record(&json!({"title": "t", "problem_slug": "s", "topics": [1]})).is_err());
    }

    #[test]
    fn extract_rejects_unknown_difficulty() {
        let err = extract_record(&json!({"title": "t", "problem_slug": "s", "difficulty": "Insane"}))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Insane"));
    }

    // ============ Upsert ============

    #[tokio::test]
    async fn insert_two_sum_scenario() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let mut cache = TopicCache::new();

        let raw = json!({
            "title": "Two Sum",
            "problem_slug": "two-sum",
            "difficulty": "Easy",
            "topics": ["Array", "Hash Table"]
        });
        let outcome = upsert_problem(&pool, "leetcode", &raw, &mut cache).await.unwrap();
        assert!(matches!(outcome, UpsertOutcome::Inserted(_)));
        index::rebuild_index(&pool).await.unwrap();

        assert_eq!(count(&pool, "SELECT COUNT(*) FROM problems").await, 1);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM topics").await, 2);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM problem_topics").await, 2);

        let difficulty: String =
            sqlx::query_scalar("SELECT difficulty FROM problems WHERE slug = 'two-sum'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(difficulty, "Easy");

        let hits = search_titles(&pool, "Two Sum", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(Some(hits[0].id), outcome.problem_id());
    }

    #[tokio::test]
    async fn reimport_updates_row_and_replaces_topics() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let mut cache = TopicCache::new();

        let first = json!({
            "title": "Two Sum", "problem_slug": "two-sum", "difficulty": "Easy",
            "topics": ["Array", "Hash Table"]
        });
        let second = json!({
            "title": "Two Sum", "problem_slug": "two-sum", "difficulty": "Medium",
            "topics": ["Array"]
        });

        let a = upsert_problem(&pool, "leetcode", &first, &mut cache).await.unwrap();
        let created_at: String = sqlx::query_scalar("SELECT created_at FROM problems")
            .fetch_one(&pool)
            .await
            .unwrap();

        let b = upsert_problem(&pool, "leetcode", &second, &mut cache).await.unwrap();
        assert!(matches!(b, UpsertOutcome::Updated(_)));
        assert_eq!(a.problem_id(), b.problem_id());

        let (difficulty, created_after): (String, String) =
            sqlx::query_as("SELECT difficulty, created_at FROM problems WHERE slug = 'two-sum'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(difficulty, "Medium");
        assert_eq!(created_after, created_at);

        assert_eq!(topics_of(&pool, "two-sum").await, vec!["Array"]);
        // Topics are never deleted, even when unreferenced.
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM topics").await, 2);
    }

    #[tokio::test]
    async fn topic_set_is_replaced_not_merged() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let mut cache = TopicCache::new();

        let ab = json!({"title": "P", "problem_slug": "p", "topics": ["A", "B"]});
        let bc = json!({"title": "P", "problem_slug": "p", "topics": ["B", "C"]});
        upsert_problem(&pool, "leetcode", &ab, &mut cache).await.unwrap();
        upsert_problem(&pool, "leetcode", &bc, &mut cache).await.unwrap();

        assert_eq!(topics_of(&pool, "p").await, vec!["B", "C"]);
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn duplicate_topics_in_one_record_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let mut cache = TopicCache::new();

        let raw = json!({"title": "P", "problem_slug": "p", "topics": ["A", "A"]});
        upsert_problem(&pool, "leetcode", &raw, &mut cache).await.unwrap();

        assert_eq!(count(&pool, "SELECT COUNT(*) FROM problem_topics").await, 1);
    }

    #[tokio::test]
    async fn topics_are_shared_across_problems() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let mut cache = TopicCache::new();

        for slug in ["a", "b", "c"] {
            let raw = json!({"title": slug, "problem_slug": slug, "topics": ["Array"]});
            upsert_problem(&pool, "leetcode", &raw, &mut cache).await.unwrap();
        }

        assert_eq!(count(&pool, "SELECT COUNT(*) FROM topics").await, 1);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM problem_topics").await, 3);
    }

    #[tokio::test]
    async fn skipped_record_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let mut cache = TopicCache::new();

        let raw = json!({"title": "No Slug", "topics": ["Array"]});
        let outcome = upsert_problem(&pool, "leetcode", &raw, &mut cache).await.unwrap();

        assert_eq!(outcome, UpsertOutcome::Skipped);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM problems").await, 0);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM topics").await, 0);
    }

    #[tokio::test]
    async fn title_change_keeps_index_in_step_without_rebuild() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let mut cache = TopicCache::new();

        let old = json!({"title": "Valid Anagram", "problem_slug": "anagram"});
        let new = json!({"title": "Group Palindromes", "problem_slug": "anagram"});
        upsert_problem(&pool, "leetcode", &old, &mut cache).await.unwrap();
        upsert_problem(&pool, "leetcode", &new, &mut cache).await.unwrap();

        assert!(search_titles(&pool, "Anagram", 10).await.unwrap().is_empty());
        assert_eq!(search_titles(&pool, "Palindromes", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_slug_under_other_source_is_a_separate_problem() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let mut cache = TopicCache::new();

        let raw = json!({"title": "Two Sum", "problem_slug": "two-sum"});
        upsert_problem(&pool, "leetcode", &raw, &mut cache).await.unwrap();
        upsert_problem(&pool, "neetcode", &raw, &mut cache).await.unwrap();

        assert_eq!(count(&pool, "SELECT COUNT(*) FROM problems").await, 2);
    }

    #[tokio::test]
    async fn delete_removes_row_index_entry_and_associations() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let mut cache = TopicCache::new();

        let raw = json!({"title": "Two Sum", "problem_slug": "two-sum", "topics": ["Array"]});
        upsert_problem(&pool, "leetcode", &raw, &mut cache).await.unwrap();

        assert!(delete_problem(&pool, "leetcode", "two-sum").await.unwrap());
        assert!(!delete_problem(&pool, "leetcode", "two-sum").await.unwrap());

        assert_eq!(count(&pool, "SELECT COUNT(*) FROM problems").await, 0);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM problem_topics").await, 0);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM topics").await, 1);
        assert!(search_titles(&pool, "Two Sum", 10).await.unwrap().is_empty());
    }
}
