//! Diagnostic logging via `tracing`.
//!
//! `PROBLEM_DB_LOG` controls the filter (e.g. `debug` or
//! `problem_db=debug,sqlx=warn`). Logs go to stderr so the import summary on
//! stdout stays clean.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("PROBLEM_DB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
