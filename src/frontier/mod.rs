//! Crawl frontier: durable priority-tier sets
//!
//! The frontier is a named collection of unordered, at-least-once pop sets
//! in the shared queue store, one per priority tier. Admission workers add
//! destination URLs to the tier matching their computed priority; fetch
//! workers pop from their assigned tier. Membership is a set, so re-adding
//! a queued URL is a no-op, and a pop hands each URL to exactly one
//! consumer.

mod seen;

pub use seen::SeenSet;

use crate::queue::{QueueResult, QueueStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Handle over the durable frontier tier sets
#[derive(Clone)]
pub struct Frontier {
    store: Arc<dyn QueueStore>,
}

impl Frontier {
    pub fn new(store: Arc<dyn QueueStore>) -> Self {
        Self { store }
    }

    /// Name of the durable set backing a priority tier
    pub fn tier_set(priority: u32) -> String {
        format!("frontier:{priority}")
    }

    /// Adds a URL to the tier set for its priority
    ///
    /// Returns true if the URL was not already queued in that tier.
    pub async fn push(&self, priority: u32, url: &str) -> QueueResult<bool> {
        self.store.set_add(&Self::tier_set(priority), url).await
    }

    /// Pops one URL from a tier set, or None if the tier is empty
    pub async fn pop(&self, priority: u32) -> QueueResult<Option<String>> {
        self.store.set_pop(&Self::tier_set(priority)).await
    }

    /// Pops one URL from a tier, polling with a fixed backoff while the
    /// tier is empty
    ///
    /// The external store offers no blocking pop, so this is the single
    /// poll-and-sleep point in the pipeline. Returns None once shutdown is
    /// signalled.
    pub async fn pop_wait(
        &self,
        priority: u32,
        backoff: Duration,
        shutdown: &mut watch::Receiver<bool>,
    ) -> QueueResult<Option<String>> {
        loop {
            if *shutdown.borrow() {
                return Ok(None);
            }
            if let Some(url) = self.pop(priority).await? {
                return Ok(Some(url));
            }
            tokio::select! {
                _ = tokio::time::sleep(backoff) => {}
                changed = shutdown.changed() => {
                    // A dropped sender means the pipeline is going away.
                    if changed.is_err() {
                        return Ok(None);
                    }
                }
            }
        }
    }
}
