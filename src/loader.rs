//! Loading the problem dump.
//!
//! The dump is either a bare JSON array of problem objects or an envelope
//! object holding that array under a named field. Both shapes are flattened
//! to a `Vec<Value>` in input order. Any read, fetch or parse failure is fatal.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Read and normalize a dump from a local file.
pub fn load_local(path: &Path, envelope_field: &str) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read problems file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
    unwrap_envelope(value, envelope_field)
}

/// Download and normalize a dump from `url`.
pub async fn fetch_remote(url: &str, envelope_field: &str, timeout_secs: u64) -> Result<Vec<Value>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;

    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    let status = resp.status();
    if !status.is_success() {
        bail!("Download of {} failed with HTTP {}", url, status);
    }

    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("Failed to read response body from {}", url))?;
    tracing::info!(url, bytes = bytes.len(), "downloaded problem dump");

    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON downloaded from {}", url))?;
    unwrap_envelope(value, envelope_field)
}

/// Flatten the top-level value to the record list.
pub fn unwrap_envelope(value: Value, envelope_field: &str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove(envelope_field) {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => bail!("field '{}' in problem dump is not a list", envelope_field),
            None => bail!(
                "problem dump is an object without a '{}' list",
                envelope_field
            ),
        },
        _ => bail!("problem dump must be a JSON list or an object wrapping one"),
    }
}
