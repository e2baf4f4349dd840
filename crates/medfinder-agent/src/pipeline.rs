// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One inbound message, start to finish.
//!
//! Stages run strictly in order: extract text, extract a medicine name,
//! resolve the user's location, search the catalog, rank by distance, reply.
//! Every expected dead end (nothing readable, no name, no location, no
//! stock) ends the run with a user-facing reply and an `Ok` outcome. Only
//! infrastructure failures with no safe default come back as `Err`, which
//! the worker treats as retryable.

use std::sync::Arc;

use tracing::{debug, info, warn};

use medfinder_core::{InboundMessage, LocationStore, MedfinderError, UserLocation};
use medfinder_geo::DistanceRanker;
use medfinder_media::{Extraction, ModalityExtractor};
use medfinder_text::NameExtractor;

use crate::messages::{
    EXTRACTION_FAILED, LOCATION_RECEIVED, LOCATION_REQUEST, NAME_NOT_FOUND,
};
use crate::reply::ReplyComposer;
use crate::search::CatalogSearch;

/// How a message run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Results were sent.
    Replied { medicine: String, results: usize },
    /// The search ran and nothing in stock matched.
    NoStock { medicine: String },
    /// A name was found but no location is known; a location prompt was sent.
    AwaitingLocation { medicine: String },
    /// A bare location share was acknowledged.
    LocationReceived,
    /// No text could be read from the message.
    ExtractionFailed,
    /// Text was read but no medicine name could be identified.
    NameNotFound,
}

impl PipelineOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Replied { .. } => "replied",
            Self::NoStock { .. } => "no_stock",
            Self::AwaitingLocation { .. } => "awaiting_location",
            Self::LocationReceived => "location_received",
            Self::ExtractionFailed => "extraction_failed",
            Self::NameNotFound => "name_not_found",
        }
    }
}

pub struct MessagePipeline {
    extractor: ModalityExtractor,
    names: NameExtractor,
    search: CatalogSearch,
    ranker: DistanceRanker,
    composer: ReplyComposer,
    locations: Option<Arc<dyn LocationStore>>,
}

impl MessagePipeline {
    pub fn new(
        extractor: ModalityExtractor,
        search: CatalogSearch,
        ranker: DistanceRanker,
        composer: ReplyComposer,
    ) -> Self {
        Self {
            extractor,
            names: NameExtractor::new(),
            search,
            ranker,
            composer,
            locations: None,
        }
    }

    /// Remember each user's last shared location and fall back to it.
    pub fn with_location_store(mut self, store: Arc<dyn LocationStore>) -> Self {
        self.locations = Some(store);
        self
    }

    pub fn composer(&self) -> &ReplyComposer {
        &self.composer
    }

    pub async fn process(
        &self,
        message: &InboundMessage,
    ) -> Result<PipelineOutcome, MedfinderError> {
        let outcome = self.run(message).await?;
        info!(
            message_id = %message.message_id,
            outcome = outcome.label(),
            "message processed"
        );
        metrics::counter!("medfinder_pipeline_outcomes_total", "outcome" => outcome.label())
            .increment(1);
        Ok(outcome)
    }

    async fn run(&self, message: &InboundMessage) -> Result<PipelineOutcome, MedfinderError> {
        let message_id = message.message_id.as_str();
        let to = message.from.as_str();

        let text = match self.extractor.extract(message).await {
            Extraction::Text(extracted) => {
                debug!(message_id, stage = "extracting", engine = %extracted.engine, "text extracted");
                extracted.text
            }
            Extraction::LocationOnly => {
                if let Some(location) = message.location() {
                    self.remember(to, location).await;
                }
                self.composer.send_notice(to, LOCATION_RECEIVED).await;
                return Ok(PipelineOutcome::LocationReceived);
            }
            Extraction::NotFound => {
                self.composer.send_notice(to, EXTRACTION_FAILED).await;
                return Ok(PipelineOutcome::ExtractionFailed);
            }
        };

        let Some(name) = self.names.extract(&text) else {
            debug!(message_id, stage = "name_extracted", "no medicine name found");
            self.composer.send_notice(to, NAME_NOT_FOUND).await;
            return Ok(PipelineOutcome::NameNotFound);
        };
        let medicine = name.name;
        debug!(message_id, stage = "name_extracted", medicine = %medicine, source = ?name.source);

        let Some(location) = self.resolve_location(message).await else {
            self.composer.send_notice(to, LOCATION_REQUEST).await;
            return Ok(PipelineOutcome::AwaitingLocation { medicine });
        };

        let entries = self.search.search(&medicine).await.inspect_err(|e| {
            warn!(message_id, stage = "searching", error = %e, "catalog search failed");
        })?;
        debug!(message_id, stage = "searching", results = entries.len());

        let ranked = self.ranker.rank(entries, location).await;
        self.composer
            .send_results(to, &medicine, &ranked, location)
            .await;

        Ok(if ranked.is_empty() {
            PipelineOutcome::NoStock { medicine }
        } else {
            PipelineOutcome::Replied {
                medicine,
                results: ranked.len(),
            }
        })
    }

    /// Coordinates on the message win; otherwise the remembered location, if any.
    async fn resolve_location(&self, message: &InboundMessage) -> Option<UserLocation> {
        if let Some(location) = message.location() {
            self.remember(&message.from, location).await;
            return Some(location);
        }
        let store = self.locations.as_ref()?;
        match store.get(&message.from).await {
            Ok(found) => found,
            Err(e) => {
                warn!(message_id = %message.message_id, error = %e, "location lookup failed");
                None
            }
        }
    }

    async fn remember(&self, user: &str, location: UserLocation) {
        if let Some(store) = &self.locations
            && let Err(e) = store.put(user, location).await
        {
            warn!(error = %e, "failed to remember location");
        }
    }
}
