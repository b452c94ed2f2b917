//! Fetch-and-extract stage
//!
//! One worker instance runs per (worker set × assigned tier). Each
//! iteration pops one URL from the assigned tier, retrieves it through the
//! transport, fingerprints and persists the content, dispatches analyzers
//! and file persistence by sniffed type, and for markup extracts raw
//! links into the ingest channel.
//!
//! Every per-URL failure is recovered: a structured error row is written
//! and the loop moves on. Only storage/queue failures escape the loop.

use crate::pipeline::analyzers::Analysis;
use crate::pipeline::extract::{extract_links, RawLink};
use crate::pipeline::sniff;
use crate::pipeline::transport::FetchError;
use crate::pipeline::PipelineContext;
use crate::storage::{
    ContentRecord, ExifRecord, FaceRecord, PerceptualHashRecord, Storage,
};
use crate::telemetry::ErrorKind;
use crate::Result;
use chrono::Utc;
use sha1::Sha1;
use sha2::{Digest, Sha512};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use url::Url;

/// Runs the fetch-and-extract loop for one tier until shutdown
pub async fn fetch_worker(
    ctx: Arc<PipelineContext>,
    tier: u32,
    links_tx: mpsc::Sender<RawLink>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let backoff = Duration::from_millis(ctx.config.crawler.empty_backoff_ms);
    tracing::debug!("Fetch worker started on tier {tier}");

    loop {
        let Some(raw_url) = ctx.frontier.pop_wait(tier, backoff, &mut shutdown).await? else {
            tracing::debug!("Fetch worker on tier {tier} shutting down");
            return Ok(());
        };

        // A URL that does not parse is lost, not retried.
        let url = match Url::parse(&raw_url) {
            Ok(u) => u,
            Err(e) => {
                ctx.errors
                    .record(ErrorKind::UrlParse, &raw_url, &e.to_string())?;
                continue;
            }
        };

        if process_one(&ctx, &url, &links_tx).await? {
            ctx.counters.add_fetched();
        }
    }
}

/// Fetches and processes a single URL
///
/// Returns `Ok(true)` when a content record was written, `Ok(false)` when
/// the URL was abandoned after a recoverable failure. Storage and queue
/// errors propagate as fatal.
async fn process_one(
    ctx: &PipelineContext,
    url: &Url,
    links_tx: &mpsc::Sender<RawLink>,
) -> Result<bool> {
    let fetched = match ctx.transport.fetch(url).await {
        Ok(f) => f,
        Err(FetchError::TooLarge { advertised, limit }) => {
            ctx.errors.record(
                ErrorKind::ResponseTooLarge,
                url.as_str(),
                &format!("{advertised} bytes advertised, ceiling {limit}"),
            )?;
            return Ok(false);
        }
        Err(e) => {
            ctx.errors
                .record(ErrorKind::Fetch, url.as_str(), &e.to_string())?;
            return Ok(false);
        }
    };

    if fetched.body.is_empty() {
        ctx.errors
            .record(ErrorKind::EmptyBody, url.as_str(), "zero-length body")?;
        return Ok(false);
    }
    if fetched.truncated {
        // Short read: keep what arrived and continue.
        ctx.errors.record(
            ErrorKind::BodyRead,
            url.as_str(),
            &format!("body ended early after {} bytes", fetched.body.len()),
        )?;
    } else if let Some(advertised) = fetched.advertised_len {
        if advertised != fetched.body.len() as u64 {
            ctx.errors.record(
                ErrorKind::LengthMismatch,
                url.as_str(),
                &format!("read {} bytes, header said {advertised}", fetched.body.len()),
            )?;
        }
    }

    let sha512_hex = hex::encode(Sha512::digest(&fetched.body));
    let sha1_hex = hex::encode(Sha1::digest(&fetched.body));
    let content_type = sniff::detect_content_type(&fetched.body);

    let site_id = ctx.sites.resolve(url).await?;
    let content_type_id = ctx.content_types.resolve(content_type)?;

    let content_id = {
        let mut storage = ctx.storage.lock().unwrap();
        storage.insert_content(&ContentRecord {
            time_found: Utc::now().timestamp_micros(),
            site_id,
            content_type_id,
            http_status: fetched.status,
            size: fetched.body.len(),
            sha512: sha512_hex,
            sha1: sha1_hex.clone(),
        })?
    };

    if sniff::is_image(content_type) {
        run_analyzers(ctx, url, content_type, &fetched.body, content_id)?;
    } else if sniff::is_archivable(content_type) {
        let mut storage = ctx.storage.lock().unwrap();
        storage.store_file(&sha1_hex, &fetched.body)?;
    }

    if !sniff::is_markup(content_type) {
        return Ok(true);
    }

    // html5ever tolerates arbitrary tag soup; the only markup input it
    // cannot take is a body that is not text at all.
    let html = match String::from_utf8(fetched.body) {
        Ok(s) => s,
        Err(e) => {
            ctx.errors
                .record(ErrorKind::MarkupParse, url.as_str(), &e.to_string())?;
            return Ok(true);
        }
    };

    for link in extract_links(url, &html) {
        if links_tx.send(link).await.is_err() {
            // Ingest pool is gone; shutdown is in progress.
            break;
        }
    }

    Ok(true)
}

/// Dispatches the analyzer registry for an image and persists the results
fn run_analyzers(
    ctx: &PipelineContext,
    url: &Url,
    content_type: &str,
    bytes: &[u8],
    content_id: i64,
) -> Result<()> {
    for analyzer in &ctx.analyzers {
        if !analyzer.supports(content_type) {
            continue;
        }
        match analyzer.analyze(content_type, bytes) {
            Ok(Some(analysis)) => persist_analysis(ctx, url, analysis, content_id)?,
            Ok(None) => {}
            Err(e) => {
                ctx.errors
                    .record(analyzer.failure_kind(), url.as_str(), &e.to_string())?;
            }
        }
    }
    Ok(())
}

fn persist_analysis(
    ctx: &PipelineContext,
    url: &Url,
    analysis: Analysis,
    content_id: i64,
) -> Result<()> {
    let mut storage = ctx.storage.lock().unwrap();
    match analysis {
        Analysis::PerceptualHash {
            average,
            difference,
            perception,
        } => {
            storage.insert_perceptual_hash(&PerceptualHashRecord {
                content_id,
                average_hash: average,
                difference_hash: difference,
                perception_hash: perception,
            })?;
        }
        Analysis::Exif {
            camera,
            timestamp,
            latitude,
            longitude,
        } => {
            storage.insert_exif(&ExifRecord {
                content_id,
                camera,
                timestamp,
                latitude,
                longitude,
            })?;
            // Geolocated content promotes the hosting domain.
            if latitude != 0.0 {
                if let Some(host) = url.host_str() {
                    ctx.reputation.mark_good(host);
                }
            }
        }
        Analysis::Faces(faces) => {
            for face in faces {
                storage.insert_face(&FaceRecord {
                    content_id,
                    descriptor: face.descriptor,
                    bounds: face.bounds,
                })?;
            }
        }
    }
    Ok(())
}
