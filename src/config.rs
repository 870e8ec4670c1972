//! TOML configuration for the importer.
//!
//! The config file is optional: when the default path does not exist the
//! built-in defaults are used, so `problem-db import --json dump.json` works
//! without any setup. Command-line flags override values read from the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where the upstream dump is published.
pub const DEFAULT_PROBLEMS_URL: &str =
    "https://github.com/mcaupybugs/leetcode-problems-db/raw/refs/heads/master/merged_problems.json";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./problems.db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Local dump read when `--download` is not given.
    #[serde(default = "default_json_path")]
    pub json_path: PathBuf,
    /// Remote dump fetched with `--download`.
    #[serde(default = "default_url")]
    pub url: String,
    /// Value written to `problems.source`; half of the natural key.
    #[serde(default = "default_source")]
    pub source: String,
    /// Field holding the record list when the dump is wrapped in an object.
    #[serde(default = "default_envelope_field")]
    pub envelope_field: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Emit a progress event every N records.
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            json_path: default_json_path(),
            url: default_url(),
            source: default_source(),
            envelope_field: default_envelope_field(),
            timeout_secs: default_timeout_secs(),
            progress_every: default_progress_every(),
        }
    }
}

fn default_json_path() -> PathBuf {
    PathBuf::from("./merged_problems.json")
}
fn default_url() -> String {
    DEFAULT_PROBLEMS_URL.to_string()
}
fn default_source() -> String {
    "leetcode".to_string()
}
fn default_envelope_field() -> String {
    "questions".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_progress_every() -> u64 {
    100
}

/// Load the config file at `path`, falling back to defaults if it is absent.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.import.source.trim().is_empty() {
        anyhow::bail!("import.source must not be empty");
    }
    if config.import.envelope_field.trim().is_empty() {
        anyhow::bail!("import.envelope_field must not be empty");
    }
    if config.import.timeout_secs == 0 {
        anyhow::bail!("import.timeout_secs must be > 0");
    }
    if config.import.progress_every == 0 {
        anyhow::bail!("import.progress_every must be > 0");
    }
    Ok(())
}
