// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text handling for noisy Arabic/English chat messages.
//!
//! [`normalize`] is shared by name extraction and catalog search so both sides
//! compare strings over the same folded alphabet.

pub mod extractor;
pub mod normalize;

pub use extractor::{NameExtractor, NameMatch, NameSource};
pub use normalize::normalize;
