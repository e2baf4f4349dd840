// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered fallback chains with "first successful attempt wins" semantics.
//!
//! OCR engine choice, speech engine choice, search tiers, and distance
//! strategies are all expressed as a [`FallbackChain`] of [`Strategy`] values.
//! Each attempt reports one of four outcomes:
//!
//! - [`Attempt::Hit`] stops the chain and yields the value.
//! - [`Attempt::Miss`] means the strategy ran (or did not apply) and produced
//!   nothing; the next strategy runs.
//! - [`Attempt::Failed`] is an absorbed failure: it is logged and the next
//!   strategy runs.
//! - [`Attempt::Abort`] is a failure with no safe default; the chain stops and
//!   the error propagates.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::MedfinderError;

/// Outcome of a single strategy attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Hit(T),
    Miss,
    Failed(MedfinderError),
    Abort(MedfinderError),
}

/// One link in a fallback chain.
#[async_trait]
pub trait Strategy<I, O>: Send + Sync
where
    I: ?Sized + Sync + 'static,
    O: Send + 'static,
{
    /// Short stable name used in logs and metrics.
    fn label(&self) -> &str;

    async fn attempt(&self, input: &I) -> Attempt<O>;
}

/// The value produced by a chain, tagged with the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<O> {
    pub strategy: String,
    pub value: O,
}

/// An ordered list of strategies.
pub struct FallbackChain<I: ?Sized, O> {
    name: &'static str,
    strategies: Vec<Arc<dyn Strategy<I, O>>>,
}

impl<I, O> FallbackChain<I, O>
where
    I: ?Sized + Sync + 'static,
    O: Send + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy to the end of the chain.
    pub fn with(mut self, strategy: Arc<dyn Strategy<I, O>>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn push(&mut self, strategy: Arc<dyn Strategy<I, O>>) {
        self.strategies.push(strategy);
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Strategy labels in attempt order.
    pub fn labels(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.label()).collect()
    }

    /// Runs strategies in order until one hits.
    ///
    /// Returns `Ok(None)` when every strategy missed or failed, and `Err` only
    /// when a strategy aborts.
    pub async fn run(&self, input: &I) -> Result<Option<Resolved<O>>, MedfinderError> {
        for strategy in &self.strategies {
            let label = strategy.label();
            match strategy.attempt(input).await {
                Attempt::Hit(value) => {
                    debug!(chain = self.name, strategy = label, "fallback chain resolved");
                    metrics::counter!(
                        "medfinder_fallback_hits_total",
                        "chain" => self.name,
                        "strategy" => label.to_string()
                    )
                    .increment(1);
                    return Ok(Some(Resolved {
                        strategy: label.to_string(),
                        value,
                    }));
                }
                Attempt::Miss => {
                    debug!(chain = self.name, strategy = label, "strategy produced nothing");
                }
                Attempt::Failed(e) => {
                    warn!(
                        chain = self.name,
                        strategy = label,
                        error = %e,
                        "strategy failed, trying next"
                    );
                }
                Attempt::Abort(e) => {
                    warn!(chain = self.name, strategy = label, error = %e, "strategy aborted chain");
                    return Err(e);
                }
            }
        }
        Ok(None)
    }
}
