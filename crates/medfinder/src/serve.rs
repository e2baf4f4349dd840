// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `medfinder serve` command implementation.
//!
//! Wires storage, the provider channel and webhook, the extraction engines,
//! and the distance ranker into one pipeline, then runs the queue workers
//! next to the webhook gateway until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use medfinder_agent::{
    CatalogSearch, MessagePipeline, QueueWorker, ReplyComposer, WorkerSettings, drain,
    install_signal_handler,
};
use medfinder_config::MedfinderConfig;
use medfinder_core::{MedfinderError, PluginAdapter};
use medfinder_gateway::GatewayState;
use medfinder_geo::{DistanceRanker, StaticMap};
use medfinder_media::ModalityExtractor;
use medfinder_storage::SqliteStorage;
use medfinder_whatsapp::{channel_for, webhook_for};

/// Extra time granted to in-flight jobs beyond their own timeout.
const DRAIN_GRACE: Duration = Duration::from_secs(5);

pub async fn run_serve(config: MedfinderConfig) -> Result<(), MedfinderError> {
    info!(provider = %config.whatsapp.provider, "starting medfinder serve");

    let client = http_client(&config)?;

    let storage = Arc::new(SqliteStorage::new(
        config.storage.clone(),
        &config.worker,
    ));
    storage.initialize().await?;

    let channel = channel_for(&config, client.clone())?;
    let webhook = webhook_for(&config)?;
    info!(channel = channel.name(), "messaging channel ready");

    let extractor = ModalityExtractor::from_config(&config, client.clone(), channel.clone());
    if extractor.ocr_engines().is_empty() {
        warn!("no OCR engine configured, image messages will not be understood");
    }
    if extractor.speech_engines().is_empty() {
        warn!("no speech engine configured, voice messages will not be understood");
    }

    let ranker = DistanceRanker::from_config(&config, client);
    info!(strategies = ?ranker.strategies(), "distance ranking ready");

    let composer = ReplyComposer::new(channel, StaticMap::from_config(&config.maps));
    let mut pipeline = MessagePipeline::new(
        extractor,
        CatalogSearch::new(storage.clone()),
        ranker,
        composer,
    );
    if config.location.remember_last {
        info!("remembering last shared location per user");
        pipeline = pipeline.with_location_store(storage.clone());
    }

    let cancel = install_signal_handler();

    let settings = WorkerSettings::from(&config.worker);
    let drain_timeout = settings.job_timeout + DRAIN_GRACE;
    let worker = Arc::new(QueueWorker::new(
        storage.clone(),
        Arc::new(pipeline),
        settings,
    ));
    let workers = tokio::spawn(worker.run(cancel.clone()));

    let state = GatewayState::new(
        webhook,
        storage,
        config.whatsapp.verify_token.clone(),
        config.gateway.public_url.clone(),
    );
    let served = medfinder_gateway::serve(&config.gateway, state, cancel.clone()).await;

    // A gateway failure also stops the workers.
    cancel.cancel();
    drain("queue workers", workers, drain_timeout).await;

    info!("medfinder stopped");
    served
}

/// The one pooled HTTP client every adapter shares.
pub fn http_client(config: &MedfinderConfig) -> Result<reqwest::Client, MedfinderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.request_timeout_secs))
        .user_agent(concat!("medfinder/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| MedfinderError::Internal(format!("failed to build HTTP client: {e}")))
}
