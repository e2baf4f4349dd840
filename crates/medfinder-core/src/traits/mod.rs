// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for every external collaborator of the pipeline.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod catalog;
pub mod channel;
pub mod location;
pub mod maps;
pub mod media;
pub mod queue;

pub use adapter::PluginAdapter;
pub use catalog::CatalogAdapter;
pub use channel::{ChannelAdapter, numbered_options};
pub use location::LocationStore;
pub use maps::DistanceMatrixAdapter;
pub use media::{OcrAdapter, SpeechAdapter};
pub use queue::{INBOUND_QUEUE, QueueAdapter};
