// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Medfinder pipeline.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, the tiered catalog queries, a
//! crash-safe work queue with retry backoff, and the optional last-location
//! memory.

pub mod adapter;
pub mod database;
pub mod import;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use import::{ImportSummary, import_csv_file, import_records, parse_inventory};
pub use models::*;
