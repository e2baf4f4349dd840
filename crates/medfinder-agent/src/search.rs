// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tiered catalog search.
//!
//! Three tiers run in order and the first non-empty one wins:
//!
//! 1. `exact`: normalized name or scientific name equals the query.
//! 2. `fuzzy`: either name contains the query, at most [`FUZZY_LIMIT`] rows.
//! 3. `partial`: either name contains any query word of at least
//!    [`MIN_WORD_CHARS`] characters, at most [`PARTIAL_LIMIT`] rows.
//!
//! An empty result is a valid answer. A catalog failure aborts the cascade
//! and surfaces as `Err` so the job can be retried.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use medfinder_core::{
    Attempt, CatalogAdapter, CatalogEntry, FallbackChain, MedfinderError, Strategy,
};
use medfinder_text::normalize;

pub const FUZZY_LIMIT: usize = 20;
pub const PARTIAL_LIMIT: usize = 15;
pub const MIN_WORD_CHARS: usize = 3;

fn tier_outcome(found: Result<Vec<CatalogEntry>, MedfinderError>) -> Attempt<Vec<CatalogEntry>> {
    match found {
        Ok(entries) if entries.is_empty() => Attempt::Miss,
        Ok(entries) => Attempt::Hit(entries),
        Err(e) => Attempt::Abort(e),
    }
}

struct ExactTier(Arc<dyn CatalogAdapter>);

#[async_trait]
impl Strategy<str, Vec<CatalogEntry>> for ExactTier {
    fn label(&self) -> &str {
        "exact"
    }

    async fn attempt(&self, term: &str) -> Attempt<Vec<CatalogEntry>> {
        tier_outcome(self.0.find_exact(term).await)
    }
}

struct FuzzyTier(Arc<dyn CatalogAdapter>);

#[async_trait]
impl Strategy<str, Vec<CatalogEntry>> for FuzzyTier {
    fn label(&self) -> &str {
        "fuzzy"
    }

    async fn attempt(&self, term: &str) -> Attempt<Vec<CatalogEntry>> {
        tier_outcome(self.0.find_containing(term, FUZZY_LIMIT).await)
    }
}

struct PartialTier(Arc<dyn CatalogAdapter>);

#[async_trait]
impl Strategy<str, Vec<CatalogEntry>> for PartialTier {
    fn label(&self) -> &str {
        "partial"
    }

    async fn attempt(&self, term: &str) -> Attempt<Vec<CatalogEntry>> {
        let words = significant_words(term);
        if words.is_empty() {
            return Attempt::Miss;
        }
        tier_outcome(self.0.find_any_word(&words, PARTIAL_LIMIT).await)
    }
}

/// Query words long enough for the partial tier.
pub fn significant_words(term: &str) -> Vec<String> {
    term.split_whitespace()
        .filter(|word| word.chars().count() >= MIN_WORD_CHARS)
        .map(str::to_string)
        .collect()
}

/// The exact → fuzzy → partial cascade over a [`CatalogAdapter`].
pub struct CatalogSearch {
    chain: FallbackChain<str, Vec<CatalogEntry>>,
}

impl CatalogSearch {
    pub fn new(catalog: Arc<dyn CatalogAdapter>) -> Self {
        let chain = FallbackChain::new("catalog_search")
            .with(Arc::new(ExactTier(catalog.clone())))
            .with(Arc::new(FuzzyTier(catalog.clone())))
            .with(Arc::new(PartialTier(catalog)));
        Self { chain }
    }

    pub fn tiers(&self) -> Vec<&str> {
        self.chain.labels()
    }

    /// In-stock entries for `name`, best-stocked first within the winning tier.
    pub async fn search(&self, name: &str) -> Result<Vec<CatalogEntry>, MedfinderError> {
        let term = normalize(name);
        if term.is_empty() {
            return Ok(Vec::new());
        }
        match self.chain.run(term.as_str()).await? {
            Some(resolved) => {
                debug!(
                    term = %term,
                    tier = %resolved.strategy,
                    results = resolved.value.len(),
                    "catalog search hit"
                );
                Ok(resolved.value)
            }
            None => {
                debug!(term = %term, "catalog search found nothing");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medfinder_test_utils::InMemoryCatalog;
    use medfinder_test_utils::fixtures::entry;

    fn search_over(entries: Vec<CatalogEntry>) -> (Arc<InMemoryCatalog>, CatalogSearch) {
        let catalog = Arc::new(InMemoryCatalog::new(entries));
        let search = CatalogSearch::new(catalog.clone());
        (catalog, search)
    }

    fn ids(entries: &[CatalogEntry]) -> Vec<i64> {
        entries.iter().map(|e| e.medicine_id).collect()
    }

    #[tokio::test]
    async fn exact_hit_skips_later_tiers() {
        let (catalog, search) = search_over(vec![
            entry(1, "Panadol", 5, (30.0, 31.0)),
            entry(2, "Panadol Extra", 9, (30.0, 31.0)),
        ]);
        let found = search.search("panadol").await.unwrap();
        assert_eq!(ids(&found), vec![1]);
        assert_eq!(catalog.exact_calls(), 1);
        assert_eq!(catalog.containing_calls(), 0);
        assert_eq!(catalog.any_word_calls(), 0);
    }

    #[tokio::test]
    async fn fuzzy_tier_finds_substrings() {
        let (catalog, search) = search_over(vec![
            entry(1, "Panadol Extra", 3, (30.0, 31.0)),
            entry(2, "Panadol Night", 8, (30.0, 31.0)),
        ]);
        let found = search.search("PANADOL").await.unwrap();
        assert_eq!(ids(&found), vec![2, 1]);
        assert_eq!(catalog.containing_calls(), 1);
        assert_eq!(catalog.any_word_calls(), 0);
    }

    #[tokio::test]
    async fn partial_tier_matches_any_long_word() {
        let (catalog, search) = search_over(vec![entry(1, "Congestal", 4, (30.0, 31.0))]);
        let found = search.search("congestal tablets").await.unwrap();
        assert_eq!(ids(&found), vec![1]);
        assert_eq!(catalog.any_word_calls(), 1);
    }

    #[tokio::test]
    async fn short_words_never_reach_the_partial_tier() {
        let (catalog, search) = search_over(vec![entry(1, "Congestal", 4, (30.0, 31.0))]);
        assert!(search.search("xx yy").await.unwrap().is_empty());
        assert_eq!(catalog.any_word_calls(), 0);
    }

    #[tokio::test]
    async fn out_of_stock_exact_match_is_never_returned() {
        let (_, search) = search_over(vec![
            entry(1, "Augmentin", 0, (30.0, 31.0)),
            entry(2, "Augmentin 1g", 2, (30.0, 31.0)),
        ]);
        let found = search.search("augmentin").await.unwrap();
        assert_eq!(ids(&found), vec![2]);
        assert!(found.iter().all(|e| e.quantity > 0));
    }

    #[tokio::test]
    async fn arabic_variants_fold_before_search() {
        let (_, search) = search_over(vec![entry(1, "اسبرين", 6, (30.0, 31.0))]);
        assert_eq!(ids(&search.search("أسبرين").await.unwrap()), vec![1]);
    }

    #[tokio::test]
    async fn no_match_is_an_empty_result() {
        let (catalog, search) = search_over(vec![entry(1, "Panadol", 5, (30.0, 31.0))]);
        assert!(search.search("zyrtec").await.unwrap().is_empty());
        assert_eq!(catalog.total_calls(), 3);
        assert!(search.search("   ").await.unwrap().is_empty());
        assert_eq!(catalog.total_calls(), 3);
    }

    #[tokio::test]
    async fn catalog_failure_is_an_error() {
        let (catalog, search) = search_over(vec![entry(1, "Panadol", 5, (30.0, 31.0))]);
        catalog.set_unavailable(true);
        assert!(search.search("panadol").await.is_err());
        assert_eq!(catalog.containing_calls(), 0);
    }

    #[test]
    fn tier_order_is_fixed() {
        let (_, search) = search_over(Vec::new());
        assert_eq!(search.tiers(), vec!["exact", "fuzzy", "partial"]);
        assert_eq!(significant_words("ab panadol cd extra"), vec!["panadol", "extra"]);
    }
}
