// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message processing for Medfinder.
//!
//! A queued [`InboundMessage`](medfinder_core::InboundMessage) flows through
//! the [`MessagePipeline`]:
//! - text is pulled out of the message by the modality extractor
//! - a medicine name is derived from that text
//! - the catalog is searched tier by tier ([`CatalogSearch`])
//! - matches are ranked by distance from the user
//! - the [`ReplyComposer`] renders the answer for the active channel
//!
//! [`QueueWorker`] drives the pipeline from the durable queue with timeouts
//! and bounded retries.

pub mod messages;
pub mod pipeline;
pub mod reply;
pub mod search;
pub mod shutdown;
pub mod worker;

pub use pipeline::{MessagePipeline, PipelineOutcome};
pub use reply::{ReplyComposer, ReplyReport};
pub use search::CatalogSearch;
pub use shutdown::{drain, install_signal_handler};
pub use worker::{JobResult, QueueWorker, WorkerSettings};
