//! Core data models shared by the loader, upserter and index.

use anyhow::{bail, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Difficulty classification. Stored as its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            other => bail!("unknown difficulty '{}': expected Easy, Medium or Hard", other),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw input record after field extraction and defaulting.
///
/// `examples`, `constraints` and `hints` are already serialized to JSON text.
#[derive(Debug, Clone)]
pub struct ProblemRecord {
    pub source_id: String,
    pub slug: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub examples: String,
    pub constraints: String,
    pub hints: String,
    pub python3_snippet: String,
    pub topics: Vec<String>,
}

/// Result of reconciling one record against storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Title or slug missing; nothing written.
    Skipped,
    Inserted(i64),
    Updated(i64),
}

impl UpsertOutcome {
    pub fn problem_id(&self) -> Option<i64> {
        match self {
            UpsertOutcome::Skipped => None,
            UpsertOutcome::Inserted(id) | UpsertOutcome::Updated(id) => Some(*id),
        }
    }
}

/// A title search hit.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: i64,
    pub source_id: String,
    pub slug: String,
    pub title: String,
    pub difficulty: String,
}

/// Counts reported at the end of an import.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub source: String,
    pub found: u64,
    pub imported: u64,
    pub inserted: u64,
    pub updated: u64,
    pub db_path: PathBuf,
    pub db_size: u64,
}

impl ImportSummary {
    pub fn skipped(&self) -> u64 {
        self.found - self.imported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_exact_names() {
        assert_eq!("Easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("Medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
    }

    #[test]
    fn difficulty_rejects_other_values() {
        assert!("easy".parse::<Difficulty>().is_err());
        assert!("Extreme".parse::<Difficulty>().is_err());
        assert!("".parse::<Difficulty>().is_err());
    }

    #[test]
    fn difficulty_defaults_to_medium() {
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }
}
