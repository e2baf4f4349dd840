// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory work queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use medfinder_core::{
    AdapterType, HealthStatus, MedfinderError, PluginAdapter, QueueAdapter, QueueEntry,
    RetryDisposition,
};

/// Queue double. Backoff is ignored: a failed entry is due again immediately.
pub struct MockQueue {
    entries: Mutex<Vec<QueueEntry>>,
    max_attempts: i32,
    reject_enqueue: AtomicBool,
}

impl MockQueue {
    pub fn new(max_attempts: i32) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            max_attempts,
            reject_enqueue: AtomicBool::new(false),
        }
    }

    /// Make `enqueue` fail, as if storage were down.
    pub fn set_reject_enqueue(&self, reject: bool) {
        self.reject_enqueue.store(reject, Ordering::SeqCst);
    }

    /// Snapshot of every entry ever enqueued.
    pub async fn entries(&self) -> Vec<QueueEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn status_of(&self, id: i64) -> Option<String> {
        self.entries
            .lock()
            .await
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.status.clone())
    }

    async fn set_status(&self, id: i64, status: &str) -> Result<(), MedfinderError> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| MedfinderError::Internal(format!("no queue entry {id}")))?;
        entry.status = status.to_string();
        Ok(())
    }
}

impl Default for MockQueue {
    fn default() -> Self {
        Self::new(3)
    }
}

#[async_trait]
impl PluginAdapter for MockQueue {
    fn name(&self) -> &str {
        "mock-queue"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Queue
    }

    async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl QueueAdapter for MockQueue {
    async fn enqueue(&self, queue_name: &str, payload: &str) -> Result<i64, MedfinderError> {
        if self.reject_enqueue.load(Ordering::SeqCst) {
            return Err(MedfinderError::Storage {
                source: "queue unavailable".into(),
            });
        }
        let mut entries = self.entries.lock().await;
        let id = entries.len() as i64 + 1;
        let now = chrono::Utc::now().to_rfc3339();
        entries.push(QueueEntry {
            id,
            queue_name: queue_name.to_string(),
            payload: payload.to_string(),
            status: "pending".into(),
            attempts: 0,
            max_attempts: self.max_attempts,
            created_at: now.clone(),
            updated_at: now,
            locked_until: None,
        });
        Ok(id)
    }

    async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueEntry>, MedfinderError> {
        let mut entries = self.entries.lock().await;
        Ok(entries
            .iter_mut()
            .find(|e| e.queue_name == queue_name && e.status == "pending")
            .map(|e| {
                e.status = "processing".into();
                e.clone()
            }))
    }

    async fn ack(&self, id: i64) -> Result<(), MedfinderError> {
        self.set_status(id, "completed").await
    }

    async fn fail(&self, id: i64, _backoff: Duration) -> Result<RetryDisposition, MedfinderError> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| MedfinderError::Internal(format!("no queue entry {id}")))?;
        entry.attempts += 1;
        if entry.attempts >= entry.max_attempts {
            entry.status = "failed".into();
            Ok(RetryDisposition::Exhausted {
                attempts: entry.attempts,
            })
        } else {
            entry.status = "pending".into();
            Ok(RetryDisposition::Retrying {
                attempts: entry.attempts,
            })
        }
    }

    async fn discard(&self, id: i64) -> Result<(), MedfinderError> {
        self.set_status(id, "failed").await
    }
}
