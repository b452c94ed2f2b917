//! Queue admission stage
//!
//! The last gate before the frontier. A scored link is dropped when its
//! priority is the discard sentinel (0) or when the seen-set says the
//! destination was already admitted; otherwise its URL joins the tier set
//! named for its priority and the discovered counter ticks.

use crate::pipeline::{PipelineContext, ScoredLink};
use crate::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Runs the admission loop until the upstream channel closes
pub async fn admission_worker(
    ctx: Arc<PipelineContext>,
    scored_rx: Arc<Mutex<mpsc::Receiver<ScoredLink>>>,
) -> Result<()> {
    loop {
        let link = {
            let mut rx = scored_rx.lock().await;
            rx.recv().await
        };
        let Some(link) = link else {
            tracing::debug!("Admission worker draining: channel closed");
            return Ok(());
        };

        // Discard sentinel: not queued, and the seen-set is left untouched
        // so a later, better-scored discovery can still be admitted.
        if link.priority == 0 {
            continue;
        }

        if ctx.seen.test_and_mark(link.dest.as_str()) {
            continue;
        }

        ctx.frontier.push(link.priority, link.dest.as_str()).await?;
        ctx.counters.add_discovered();
    }
}
