// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory catalog with per-tier call counters.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use medfinder_core::{
    AdapterType, CatalogAdapter, CatalogEntry, HealthStatus, MedfinderError, PluginAdapter,
};
use medfinder_text::normalize;

/// Catalog double that applies the same matching rules as the SQLite tiers.
#[derive(Default)]
pub struct InMemoryCatalog {
    entries: Vec<CatalogEntry>,
    unavailable: AtomicBool,
    exact_calls: AtomicUsize,
    containing_calls: AtomicUsize,
    any_word_calls: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Make every query fail as if storage were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn exact_calls(&self) -> usize {
        self.exact_calls.load(Ordering::SeqCst)
    }

    pub fn containing_calls(&self) -> usize {
        self.containing_calls.load(Ordering::SeqCst)
    }

    pub fn any_word_calls(&self) -> usize {
        self.any_word_calls.load(Ordering::SeqCst)
    }

    /// Calls across all tiers.
    pub fn total_calls(&self) -> usize {
        self.exact_calls() + self.containing_calls() + self.any_word_calls()
    }

    fn check(&self) -> Result<(), MedfinderError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(MedfinderError::Storage {
                source: "catalog unavailable".into(),
            });
        }
        Ok(())
    }

    fn select(&self, limit: Option<usize>, matches: impl Fn(&str) -> bool) -> Vec<CatalogEntry> {
        let mut found: Vec<CatalogEntry> = self
            .entries
            .iter()
            .filter(|e| e.quantity > 0)
            .filter(|e| {
                matches(&normalize(&e.medicine_name))
                    || e.scientific_name
                        .as_deref()
                        .is_some_and(|s| matches(&normalize(s)))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then(a.medicine_id.cmp(&b.medicine_id))
        });
        if let Some(limit) = limit {
            found.truncate(limit);
        }
        found
    }
}

#[async_trait]
impl PluginAdapter for InMemoryCatalog {
    fn name(&self) -> &str {
        "in-memory-catalog"
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
impl CatalogAdapter for InMemoryCatalog {
    async fn find_exact(&self, term: &str) -> Result<Vec<CatalogEntry>, MedfinderError> {
        self.exact_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.select(None, |name| name == term))
    }

    async fn find_containing(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, MedfinderError> {
        self.containing_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.select(Some(limit), |name| name.contains(term)))
    }

    async fn find_any_word(
        &self,
        words: &[String],
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, MedfinderError> {
        self.any_word_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.select(Some(limit), |name| {
            words.iter().any(|w| name.contains(w.as_str()))
        }))
    }
}
