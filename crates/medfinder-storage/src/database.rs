// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread, which is what makes each queue claim and stock update atomic.
//! Do NOT open additional connections for writes.

use std::path::Path;

use medfinder_core::MedfinderError;
use rusqlite::functions::FunctionFlags;
use tracing::debug;

use crate::migrations;

/// SQL function exposing [`medfinder_text::normalize`] to queries.
pub const NORMALIZE_FN: &str = "medfinder_normalize";

const PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
";

/// Handle to the single SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply PRAGMAs,
    /// register SQL functions, and run pending migrations.
    pub async fn open(path: &str) -> Result<Self, MedfinderError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| MedfinderError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(map_tr_err)?;

        conn.call(|conn| -> Result<Result<(), MedfinderError>, rusqlite::Error> {
            conn.execute_batch(PRAGMAS)?;
            register_functions(conn)?;
            Ok(migrations::run_migrations(conn))
        })
        .await
        .map_err(map_tr_err)??;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), MedfinderError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)
    }
}

fn register_functions(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.create_scalar_function(
        NORMALIZE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| medfinder_text::normalize(&v)))
        },
    )
}

/// Map a tokio-rusqlite error into the storage error variant.
pub(crate) fn map_tr_err<E: std::fmt::Display>(e: E) -> MedfinderError {
    MedfinderError::Storage {
        source: e.to_string().into(),
    }
}

/// Map a plain rusqlite error into the storage error variant.
pub(crate) fn map_sql_err(e: rusqlite::Error) -> MedfinderError {
    MedfinderError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_parent_dirs_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/medfinder.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        for expected in ["branches", "medicines", "pharmacies", "queue", "user_locations"] {
            assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
        }
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn normalize_function_is_available_in_sql() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();

        let folded: String = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("SELECT medfinder_normalize(' أسبرين  PLUS ')", [], |row| {
                    row.get(0)
                })
            })
            .await
            .unwrap();
        assert_eq!(folded, "اسبرين plus");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("again.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
    }
}
