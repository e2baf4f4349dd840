// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue workers.
//!
//! Each worker loop claims one queued message at a time and runs the
//! pipeline on it under a hard timeout. Business outcomes are acknowledged.
//! Errors and timeouts are retried with backoff until the entry's attempt
//! budget is spent, after which the user gets a generic apology. Payloads
//! that do not decode are discarded immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use medfinder_config::model::WorkerConfig;
use medfinder_core::{
    INBOUND_QUEUE, InboundMessage, MedfinderError, QueueAdapter, QueueEntry, RetryDisposition,
};

use crate::messages::GENERIC_ERROR;
use crate::pipeline::{MessagePipeline, PipelineOutcome};

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub concurrency: usize,
    pub job_timeout: Duration,
    pub poll_interval: Duration,
    pub retry_backoff: Duration,
}

impl From<&WorkerConfig> for WorkerSettings {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            job_timeout: Duration::from_secs(config.job_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            retry_backoff: Duration::from_secs(config.retry_backoff_secs),
        }
    }
}

/// What happened to one claimed queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Completed(PipelineOutcome),
    Retrying { attempts: i32 },
    Exhausted { attempts: i32 },
    /// The payload could not be decoded.
    Discarded,
}

pub struct QueueWorker {
    queue: Arc<dyn QueueAdapter>,
    pipeline: Arc<MessagePipeline>,
    settings: WorkerSettings,
}

impl QueueWorker {
    pub fn new(
        queue: Arc<dyn QueueAdapter>,
        pipeline: Arc<MessagePipeline>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            pipeline,
            settings,
        }
    }

    /// Runs `concurrency` loops until `cancel` fires, then waits for
    /// in-flight jobs to finish.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let tracker = TaskTracker::new();
        for worker in 0..self.settings.concurrency {
            let this = Arc::clone(&self);
            let cancel = cancel.clone();
            tracker.spawn(async move { this.poll_loop(worker, cancel).await });
        }
        tracker.close();
        info!(workers = self.settings.concurrency, "queue workers started");
        tracker.wait().await;
        info!("queue workers stopped");
    }

    async fn poll_loop(&self, worker: usize, cancel: CancellationToken) {
        while !cancel.is_cancelled() {
            let idle = match self.run_once().await {
                Ok(Some(result)) => {
                    debug!(worker, result = ?result, "job finished");
                    false
                }
                Ok(None) => true,
                Err(e) => {
                    error!(worker, error = %e, "queue error");
                    true
                }
            };
            if idle {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.settings.poll_interval) => {}
                }
            }
        }
        debug!(worker, "worker loop exiting");
    }

    /// Claims and handles one entry. `Ok(None)` when nothing is due.
    pub async fn run_once(&self) -> Result<Option<JobResult>, MedfinderError> {
        let Some(entry) = self.queue.dequeue(INBOUND_QUEUE).await? else {
            return Ok(None);
        };
        self.handle(entry).await.map(Some)
    }

    async fn handle(&self, entry: QueueEntry) -> Result<JobResult, MedfinderError> {
        let message: InboundMessage = match serde_json::from_str(&entry.payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(entry_id = entry.id, error = %e, "undecodable queue payload discarded");
                metrics::counter!("medfinder_queue_dead_letters_total", "reason" => "payload")
                    .increment(1);
                self.queue.discard(entry.id).await?;
                return Ok(JobResult::Discarded);
            }
        };

        let timeout = self.settings.job_timeout;
        let outcome = match tokio::time::timeout(timeout, self.pipeline.process(&message)).await {
            Ok(result) => result,
            Err(_) => Err(MedfinderError::Timeout { duration: timeout }),
        };

        match outcome {
            Ok(outcome) => {
                self.queue.ack(entry.id).await?;
                Ok(JobResult::Completed(outcome))
            }
            Err(e) => {
                warn!(
                    entry_id = entry.id,
                    message_id = %message.message_id,
                    attempt = entry.attempts + 1,
                    error = %e,
                    "pipeline failed"
                );
                match self.queue.fail(entry.id, self.settings.retry_backoff).await? {
                    RetryDisposition::Retrying { attempts } => {
                        metrics::counter!("medfinder_queue_retries_total").increment(1);
                        Ok(JobResult::Retrying { attempts })
                    }
                    RetryDisposition::Exhausted { attempts } => {
                        metrics::counter!("medfinder_queue_dead_letters_total", "reason" => "exhausted")
                            .increment(1);
                        error!(
                            entry_id = entry.id,
                            message_id = %message.message_id,
                            attempts,
                            "retries exhausted, notifying user"
                        );
                        self.pipeline
                            .composer()
                            .send_notice(&message.from, GENERIC_ERROR)
                            .await;
                        Ok(JobResult::Exhausted { attempts })
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medfinder_core::{
        AdapterType, CatalogAdapter, CatalogEntry, HealthStatus, PluginAdapter,
    };
    use medfinder_geo::{DistanceRanker, StaticMap};
    use medfinder_media::ModalityExtractor;
    use medfinder_test_utils::fixtures::{SENDER, entry, text_message};
    use medfinder_test_utils::{InMemoryCatalog, MockChannel, MockQueue};

    use crate::reply::ReplyComposer;
    use crate::search::CatalogSearch;

    const CAIRO: (f64, f64) = (30.0444, 31.2357);

    fn settings() -> WorkerSettings {
        WorkerSettings {
            concurrency: 2,
            job_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
            retry_backoff: Duration::ZERO,
        }
    }

    fn pipeline(channel: Arc<MockChannel>, catalog: Arc<dyn CatalogAdapter>) -> Arc<MessagePipeline> {
        Arc::new(MessagePipeline::new(
            ModalityExtractor::new(channel.clone()),
            CatalogSearch::new(catalog),
            DistanceRanker::new(30.0, None),
            ReplyComposer::new(
                channel,
                StaticMap::new("https://maps.example.com".into(), "600x400".into(), None),
            ),
        ))
    }

    async fn enqueue(queue: &MockQueue, message: &InboundMessage) -> i64 {
        queue
            .enqueue(INBOUND_QUEUE, &serde_json::to_string(message).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn completed_job_is_acked() {
        let channel = Arc::new(MockChannel::new());
        let catalog = Arc::new(InMemoryCatalog::new(vec![entry(1, "Panadol", 3, CAIRO)]));
        let queue = Arc::new(MockQueue::new(3));
        let id = enqueue(&queue, &text_message("panadol", Some(CAIRO))).await;

        let worker = QueueWorker::new(queue.clone(), pipeline(channel, catalog), settings());
        let result = worker.run_once().await.unwrap().unwrap();
        assert!(matches!(
            result,
            JobResult::Completed(PipelineOutcome::Replied { results: 1, .. })
        ));
        assert_eq!(queue.status_of(id).await.as_deref(), Some("completed"));
        assert!(worker.run_once().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn business_dead_ends_are_not_retried() {
        let channel = Arc::new(MockChannel::new());
        let catalog = Arc::new(InMemoryCatalog::new(Vec::new()));
        let queue = Arc::new(MockQueue::new(3));
        let id = enqueue(&queue, &text_message("panadol", Some(CAIRO))).await;

        let worker = QueueWorker::new(queue.clone(), pipeline(channel, catalog), settings());
        let result = worker.run_once().await.unwrap().unwrap();
        assert!(matches!(
            result,
            JobResult::Completed(PipelineOutcome::NoStock { .. })
        ));
        assert_eq!(queue.status_of(id).await.as_deref(), Some("completed"));
    }

    #[tokio::test]
    async fn poison_payload_is_discarded() {
        let channel = Arc::new(MockChannel::new());
        let catalog = Arc::new(InMemoryCatalog::new(Vec::new()));
        let queue = Arc::new(MockQueue::new(3));
        let id = queue.enqueue(INBOUND_QUEUE, "not json").await.unwrap();

        let worker = QueueWorker::new(queue.clone(), pipeline(channel.clone(), catalog), settings());
        assert_eq!(worker.run_once().await.unwrap(), Some(JobResult::Discarded));
        assert_eq!(queue.status_of(id).await.as_deref(), Some("failed"));
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn infrastructure_failure_retries_then_apologizes() {
        let channel = Arc::new(MockChannel::new());
        let catalog = Arc::new(InMemoryCatalog::new(vec![entry(1, "Panadol", 3, CAIRO)]));
        catalog.set_unavailable(true);
        let queue = Arc::new(MockQueue::new(2));
        let id = enqueue(&queue, &text_message("panadol", Some(CAIRO))).await;

        let worker = QueueWorker::new(
            queue.clone(),
            pipeline(channel.clone(), catalog),
            settings(),
        );
        assert_eq!(
            worker.run_once().await.unwrap(),
            Some(JobResult::Retrying { attempts: 1 })
        );
        assert_eq!(channel.sent_count().await, 0);

        assert_eq!(
            worker.run_once().await.unwrap(),
            Some(JobResult::Exhausted { attempts: 2 })
        );
        assert_eq!(queue.status_of(id).await.as_deref(), Some("failed"));
        let sent = channel.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text(), Some(GENERIC_ERROR));
        assert_eq!(sent[0].to(), SENDER);
    }

    struct StalledCatalog;

    #[async_trait]
    impl PluginAdapter for StalledCatalog {
        fn name(&self) -> &str {
            "stalled"
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }

        fn adapter_type(&self) -> AdapterType {
            AdapterType::Catalog
        }

        async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl CatalogAdapter for StalledCatalog {
        async fn find_exact(&self, _term: &str) -> Result<Vec<CatalogEntry>, MedfinderError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }

        async fn find_containing(
            &self,
            _term: &str,
            _limit: usize,
        ) -> Result<Vec<CatalogEntry>, MedfinderError> {
            Ok(Vec::new())
        }

        async fn find_any_word(
            &self,
            _words: &[String],
            _limit: usize,
        ) -> Result<Vec<CatalogEntry>, MedfinderError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn timed_out_job_counts_as_a_failed_attempt() {
        let channel = Arc::new(MockChannel::new());
        let queue = Arc::new(MockQueue::new(3));
        enqueue(&queue, &text_message("panadol", Some(CAIRO))).await;

        let worker = QueueWorker::new(
            queue.clone(),
            pipeline(channel, Arc::new(StalledCatalog)),
            WorkerSettings {
                job_timeout: Duration::from_millis(50),
                ..settings()
            },
        );
        assert_eq!(
            worker.run_once().await.unwrap(),
            Some(JobResult::Retrying { attempts: 1 })
        );
    }

    #[tokio::test]
    async fn run_drains_the_queue_and_stops_on_cancel() {
        let channel = Arc::new(MockChannel::new());
        let catalog = Arc::new(InMemoryCatalog::new(vec![entry(1, "Panadol", 3, CAIRO)]));
        let queue = Arc::new(MockQueue::new(3));
        for _ in 0..4 {
            enqueue(&queue, &text_message("panadol", Some(CAIRO))).await;
        }

        let worker = Arc::new(QueueWorker::new(
            queue.clone(),
            pipeline(channel.clone(), catalog),
            settings(),
        ));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(worker.run(cancel.clone()));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let entries = queue.entries().await;
            if entries.iter().all(|e| e.status == "completed") {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "queue not drained");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        handle.await.unwrap();
        // Text and buttons per reply; no map without a key.
        assert_eq!(channel.sent_count().await, 8);
    }
}
