// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound reply protocol: results text, map image, then actions.
//!
//! Every send is best-effort. A failed part is logged and counted, and the
//! remaining parts are still attempted.

use std::sync::Arc;

use tracing::{debug, warn};

use medfinder_core::traits::numbered_options;
use medfinder_core::{ChannelAdapter, MedfinderError, MessageId, RankedResult, UserLocation};
use medfinder_geo::StaticMap;

use crate::messages::{
    ACTION_PROMPT, MAP_CAPTION, MAX_SHOWN_RESULTS, action_buttons, not_found, results_text,
};

/// How many parts of a reply went out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplyReport {
    pub sent: usize,
    pub failed: usize,
}

impl ReplyReport {
    fn record(&mut self, part: &str, result: Result<MessageId, MedfinderError>) {
        match result {
            Ok(id) => {
                debug!(part, message_id = %id.0, "reply part sent");
                self.sent += 1;
            }
            Err(e) => {
                warn!(part, error = %e, "reply part failed");
                metrics::counter!("medfinder_reply_send_failures_total", "part" => part.to_string())
                    .increment(1);
                self.failed += 1;
            }
        }
    }
}

pub struct ReplyComposer {
    channel: Arc<dyn ChannelAdapter>,
    map: StaticMap,
}

impl ReplyComposer {
    pub fn new(channel: Arc<dyn ChannelAdapter>, map: StaticMap) -> Self {
        Self { channel, map }
    }

    /// A single text message.
    pub async fn send_notice(&self, to: &str, body: &str) -> ReplyReport {
        let mut report = ReplyReport::default();
        report.record("notice", self.channel.send_text(to, body).await);
        report
    }

    /// Sends search results for `medicine` to `to`.
    ///
    /// No results: one "not found" text. Otherwise the top results as text,
    /// a map with matching numbered markers, and actions for the nearest
    /// result. Channels without buttons get the actions as a numbered list
    /// at the end of the results text.
    ///
    /// Result blocks are dropped from the end until the text fits the
    /// channel's length limit. If even one block leaves no room for the
    /// numbered actions, the actions follow as their own text.
    pub async fn send_results(
        &self,
        to: &str,
        medicine: &str,
        results: &[RankedResult],
        user: UserLocation,
    ) -> ReplyReport {
        let Some(nearest) = results.first() else {
            return self.send_notice(to, &not_found(medicine)).await;
        };

        let capabilities = self.channel.capabilities();
        let buttons = action_buttons(nearest);
        let options =
            (!capabilities.supports_buttons).then(|| numbered_options(ACTION_PROMPT, &buttons));

        let mut count = results.len().min(MAX_SHOWN_RESULTS);
        let mut text = compose(medicine, results, count, options.as_deref());
        while count > 1 && !capabilities.fits(&text) {
            count -= 1;
            text = compose(medicine, results, count, options.as_deref());
        }
        let mut trailing_options = None;
        if !capabilities.fits(&text) && options.is_some() {
            text = compose(medicine, results, count, None);
            trailing_options = options;
        }
        if count < results.len().min(MAX_SHOWN_RESULTS) {
            debug!(shown = count, "results text shortened to fit the channel");
        }
        let shown = &results[..count];

        let mut report = ReplyReport::default();
        report.record("results", self.channel.send_text(to, &text).await);

        if capabilities.supports_images {
            let places: Vec<UserLocation> = shown
                .iter()
                .map(|r| UserLocation {
                    latitude: r.entry.latitude,
                    longitude: r.entry.longitude,
                })
                .collect();
            if let Some(url) = self.map.url(user, &places) {
                report.record(
                    "map",
                    self.channel.send_image(to, &url, Some(MAP_CAPTION)).await,
                );
            }
        }

        if capabilities.supports_buttons {
            let limit = capabilities.max_buttons.min(buttons.len());
            report.record(
                "actions",
                self.channel
                    .send_buttons(to, ACTION_PROMPT, &buttons[..limit])
                    .await,
            );
        } else if let Some(options) = trailing_options {
            report.record("actions", self.channel.send_text(to, &options).await);
        }
        report
    }
}

/// Results text for the first `count` results, with `options` appended.
fn compose(
    medicine: &str,
    results: &[RankedResult],
    count: usize,
    options: Option<&str>,
) -> String {
    let mut text = results_text(medicine, &results[..count], results.len());
    if let Some(options) = options {
        text.push_str(options);
    }
    text
}
