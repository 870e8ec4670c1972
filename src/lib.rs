//! # Problem DB
//!
//! Imports a JSON dump of coding-interview problems into SQLite with an FTS5
//! index over problem titles.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌────────────────────┐   ┌──────────────┐
//! │  Loader  │──▶│  Upsert per record │──▶│ FTS rebuild  │──▶ summary
//! │ file/URL │   │ problems + topics  │   │ problems_fts │
//! └──────────┘   └────────────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! problem-db import --json merged_problems.json --db problems.db
//! problem-db import --download
//! problem-db search "two sum"
//! problem-db stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`loader`] | Reading and downloading the dump |
//! | [`ingest`] | Per-record upsert and the import run |
//! | [`index`] | FTS5 title index maintenance |
//! | [`search`] | Title search |
//! | [`stats`] | Import summary and database stats |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod config;
pub mod db;
pub mod index;
pub mod ingest;
pub mod loader;
pub mod migrate;
pub mod models;
pub mod progress;
pub mod search;
pub mod stats;
pub mod telemetry;
