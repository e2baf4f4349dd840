// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Crash-safe work queue between the webhook and the pipeline workers.
//!
//! Entries move `pending -> processing -> completed`, or back to `pending`
//! with a backoff on failure until `max_attempts` is reached, at which point
//! they are parked as `failed`. A `processing` entry whose lock has expired
//! (its worker died mid-job) is charged one attempt and becomes claimable
//! again, or is parked as `failed` when that was its last attempt.

use medfinder_core::{MedfinderError, QueueEntry, RetryDisposition};
use rusqlite::{OptionalExtension, Row, params};

use tracing::warn;

use crate::database::{Database, map_tr_err};

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<QueueEntry> {
    Ok(QueueEntry {
        id: row.get(0)?,
        queue_name: row.get(1)?,
        payload: row.get(2)?,
        status: row.get(3)?,
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        locked_until: row.get(8)?,
    })
}

fn offset(secs: u64) -> String {
    format!("+{secs} seconds")
}

/// Enqueue a new item. Returns the auto-generated queue entry ID.
pub async fn enqueue(
    db: &Database,
    queue_name: &str,
    payload: &str,
    max_attempts: i32,
) -> Result<i64, MedfinderError> {
    let queue_name = queue_name.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO queue (queue_name, payload, max_attempts) VALUES (?1, ?2, ?3)",
                params![queue_name, payload, max_attempts],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Claim the oldest due entry of the named queue, locking it for `lock_secs`.
///
/// Due means `pending` with no (or an elapsed) backoff. Entries whose
/// `processing` lock has expired are first charged an attempt and put back
/// to `pending`, or `failed` once `max_attempts` is reached. Returns `None`
/// if nothing is due.
pub async fn dequeue(
    db: &Database,
    queue_name: &str,
    lock_secs: u64,
) -> Result<Option<QueueEntry>, MedfinderError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<QueueEntry>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let abandoned = tx.execute(
                &format!(
                    "UPDATE queue SET attempts = attempts + 1,
                     status = CASE WHEN attempts + 1 >= max_attempts THEN 'failed' ELSE 'pending' END,
                     locked_until = NULL, updated_at = {NOW}
                     WHERE queue_name = ?1 AND status = 'processing' AND locked_until <= {NOW}"
                ),
                params![queue_name],
            )?;
            if abandoned > 0 {
                warn!(queue = %queue_name, abandoned, "reclaimed entries with expired locks");
            }

            let candidate = tx
                .query_row(
                    &format!(
                        "SELECT id, queue_name, payload, status, attempts, max_attempts,
                                created_at, updated_at, locked_until
                         FROM queue
                         WHERE queue_name = ?1
                           AND status = 'pending'
                           AND (locked_until IS NULL OR locked_until <= {NOW})
                         ORDER BY id ASC
                         LIMIT 1"
                    ),
                    params![queue_name],
                    entry_from_row,
                )
                .optional()?;

            let Some(entry) = candidate else {
                tx.commit()?;
                return Ok(None);
            };

            let claimed = tx.query_row(
                &format!(
                    "UPDATE queue SET status = 'processing',
                     locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2),
                     updated_at = {NOW}
                     WHERE id = ?1
                     RETURNING id, queue_name, payload, status, attempts, max_attempts,
                               created_at, updated_at, locked_until"
                ),
                params![entry.id, offset(lock_secs)],
                entry_from_row,
            )?;
            tx.commit()?;
            Ok(Some(claimed))
        })
        .await
        .map_err(map_tr_err)
}

/// Acknowledge successful processing of a queue entry.
pub async fn ack(db: &Database, id: i64) -> Result<(), MedfinderError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                &format!(
                    "UPDATE queue SET status = 'completed', locked_until = NULL, updated_at = {NOW}
                     WHERE id = ?1"
                ),
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record a failed attempt.
///
/// Increments attempts. Below `max_attempts` the entry returns to `pending`
/// and becomes due again after `backoff_secs`; otherwise it is parked as
/// `failed`.
pub async fn fail(db: &Database, id: i64, backoff_secs: u64) -> Result<RetryDisposition, MedfinderError> {
    db.connection()
        .call(move |conn| -> Result<RetryDisposition, rusqlite::Error> {
            let tx = conn.transaction()?;
            let (attempts, max_attempts): (i32, i32) = tx.query_row(
                "SELECT attempts, max_attempts FROM queue WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let attempts = attempts + 1;
            let disposition = if attempts >= max_attempts {
                tx.execute(
                    &format!(
                        "UPDATE queue SET status = 'failed', attempts = ?1,
                         locked_until = NULL, updated_at = {NOW}
                         WHERE id = ?2"
                    ),
                    params![attempts, id],
                )?;
                RetryDisposition::Exhausted { attempts }
            } else {
                tx.execute(
                    &format!(
                        "UPDATE queue SET status = 'pending', attempts = ?1,
                         locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?3),
                         updated_at = {NOW}
                         WHERE id = ?2"
                    ),
                    params![attempts, id, offset(backoff_secs)],
                )?;
                RetryDisposition::Retrying { attempts }
            };
            tx.commit()?;
            Ok(disposition)
        })
        .await
        .map_err(map_tr_err)
}

/// Park an entry as failed without consuming further attempts.
///
/// Used for payloads that can never succeed (e.g. undecodable JSON).
pub async fn discard(db: &Database, id: i64) -> Result<(), MedfinderError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                &format!(
                    "UPDATE queue SET status = 'failed', locked_until = NULL, updated_at = {NOW}
                     WHERE id = ?1"
                ),
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
