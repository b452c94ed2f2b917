//! Link ingest stage
//!
//! Receives raw extracted links, resolves both site identities, persists
//! the link edge with its keyword evidence, scores the link, and forwards
//! it to queue admission. Persistence failures here are fatal: they mean
//! the store is broken, not that the input was bad.

use crate::pipeline::extract::RawLink;
use crate::pipeline::{PipelineContext, ScoredLink};
use crate::scoring::{link_priority, link_rating};
use crate::storage::{LinkEdgeRecord, Storage};
use crate::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Runs the ingest loop until the upstream channel closes
pub async fn ingest_worker(
    ctx: Arc<PipelineContext>,
    links_rx: Arc<Mutex<mpsc::Receiver<RawLink>>>,
    scored_tx: mpsc::Sender<ScoredLink>,
) -> Result<()> {
    loop {
        let link = {
            let mut rx = links_rx.lock().await;
            rx.recv().await
        };
        let Some(link) = link else {
            tracing::debug!("Ingest worker draining: channel closed");
            return Ok(());
        };

        let scored = ingest_one(&ctx, link).await?;
        if scored_tx.send(scored).await.is_err() {
            return Ok(());
        }
    }
}

/// Persists one link edge and computes its score
async fn ingest_one(ctx: &PipelineContext, link: RawLink) -> Result<ScoredLink> {
    let origin_id = ctx.sites.resolve(&link.origin).await?;
    let destination_id = ctx.sites.resolve(&link.dest).await?;

    let rating = if link.keywords.is_empty() {
        0.0
    } else {
        link_rating(&ctx.flagged_words, &link.keywords, &ctx.config.scoring)
    };

    {
        let mut storage = ctx.storage.lock().unwrap();
        let edge_id = storage.insert_link_edge(&LinkEdgeRecord {
            time_found: link.time_found.timestamp_micros(),
            origin: origin_id,
            destination: destination_id,
            rating,
        })?;
        for keyword in &link.keywords {
            storage.insert_link_keyword(edge_id, keyword.visibility, &keyword.text)?;
        }
    }

    let priority = link_priority(&link.dest, rating, &ctx.reputation, &ctx.config.scoring);

    // The destination's hostname is now known; later links to it no longer
    // qualify for the new-domain tier.
    if let Some(host) = link.dest.host_str() {
        ctx.reputation.observe(host);
    }

    Ok(ScoredLink {
        dest: link.dest,
        priority,
    })
}
