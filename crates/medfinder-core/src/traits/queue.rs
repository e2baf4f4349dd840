// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable work queue contract used between the webhook and the workers.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::MedfinderError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{QueueEntry, RetryDisposition};

/// Queue carrying serialized inbound messages from the webhook to the workers.
pub const INBOUND_QUEUE: &str = "inbound_messages";

#[async_trait]
pub trait QueueAdapter: PluginAdapter {
    /// Adds a payload to the named queue and returns its id.
    async fn enqueue(&self, queue_name: &str, payload: &str) -> Result<i64, MedfinderError>;

    /// Claims the next due entry, or `None` if nothing is ready.
    async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueEntry>, MedfinderError>;

    /// Marks an entry as completed.
    async fn ack(&self, id: i64) -> Result<(), MedfinderError>;

    /// Records a failed attempt; the entry is retried after `backoff` until
    /// its attempt budget runs out.
    async fn fail(&self, id: i64, backoff: Duration) -> Result<RetryDisposition, MedfinderError>;

    /// Parks an entry as failed without further attempts.
    async fn discard(&self, id: i64) -> Result<(), MedfinderError>;
}
