// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only medicine catalog query contract.

use async_trait::async_trait;

use crate::error::MedfinderError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CatalogEntry;

/// Query interface onto the inventory system, one method per search tier.
///
/// Every term passed in is already normalized. Every returned row has
/// `quantity > 0`, carries its branch and pharmacy metadata, and rows are
/// ordered by descending quantity.
#[async_trait]
pub trait CatalogAdapter: PluginAdapter {
    /// Normalized display or scientific name equals `term`.
    async fn find_exact(&self, term: &str) -> Result<Vec<CatalogEntry>, MedfinderError>;

    /// Normalized display or scientific name contains `term`.
    async fn find_containing(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, MedfinderError>;

    /// Normalized display or scientific name contains any of `words`.
    async fn find_any_word(
        &self,
        words: &[String],
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, MedfinderError>;
}
