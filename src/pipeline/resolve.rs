//! Image resolution: ensure a local image file exists for every identifier.
//!
//! ## The cache is the contract
//!
//! The dominant fast path is a plain existence check on
//! `<image_dir>/<id>.jpg` — no network, no HTTP client, nothing to retry.
//! Card scans for a given passcode never change, so a cached file, however
//! old, is always preferred over re-fetching. This makes resolution
//! idempotent and cheap to re-run: a later job re-attempts a failed
//! identifier naturally, because failure never populates the cache.
//!
//! ## Partial failure is data, not control flow
//!
//! One dead identifier must not sink a sixty-card sheet. Every failure is
//! recorded as a [`ResolveFailure`] and iteration continues; only the
//! orchestrator decides (on a fully empty resolved set) that the job is
//! lost.
//!
//! ## Cache writes are atomic
//!
//! A fetched body is validated and fully buffered before anything touches
//! the cache directory, then written to a uniquely named temp file and
//! atomically renamed into place. A failed transfer therefore leaves no
//! partial file behind, and concurrent jobs racing on the same identifier
//! each rename identical bytes — last writer wins, readers never observe a
//! torn file.

use crate::config::JobConfig;
use crate::error::ResolveError;
use crate::output::{Resolution, ResolveFailure};
use crate::pipeline::normalize::{DeckEntry, Decklist};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cache location for one identifier.
pub fn image_path(image_dir: &Path, id: &str) -> PathBuf {
    image_dir.join(format!("{id}.jpg"))
}

/// Build the HTTP client used for a job's fetches.
///
/// The client-level timeout covers the whole request including the body
/// read, so one unreachable image can stall a job for at most
/// `fetch_timeout_secs`.
pub(crate) fn build_client(fetch_timeout_secs: u64) -> Result<reqwest::Client, ResolveError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(fetch_timeout_secs))
        .build()
        .map_err(|e| ResolveError::Unknown(e.to_string()))
}

/// Resolve every identifier in the decklist, strictly in order, one fetch
/// at a time.
///
/// Returns the distinct-identifier partition: duplicates collapse because
/// the first occurrence decides for all later ones — a resolved id's file
/// now exists, and a failed id gets exactly one attempt per job.
pub async fn resolve(decklist: &Decklist, config: &JobConfig) -> Resolution {
    if let Err(e) = tokio::fs::create_dir_all(&config.image_dir).await {
        warn!("Could not create image cache dir {}: {e}", config.image_dir.display());
    }

    let client = build_client(config.fetch_timeout_secs);

    let mut resolution = Resolution::default();
    let mut seen: HashSet<&str> = HashSet::new();
    let distinct_total = decklist
        .ids()
        .collect::<HashSet<_>>()
        .len();

    let mut index = 0;
    for entry in decklist.entries() {
        if !seen.insert(entry.id.as_str()) {
            continue;
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_card_start(&entry.id, index, distinct_total);
        }

        match resolve_entry(&client, entry, config).await {
            Ok(from_cache) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_card_resolved(&entry.id, index, distinct_total, from_cache);
                }
                resolution.resolved.push(entry.id.clone());
            }
            Err(reason) => {
                warn!("Could not resolve card {}: {reason}", entry.id);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_card_failed(&entry.id, index, distinct_total, &reason.to_string());
                }
                resolution.failed.push(ResolveFailure {
                    id: entry.id.clone(),
                    original_id: entry.original.clone(),
                    reason,
                });
            }
        }
        index += 1;
    }

    info!(
        "Resolution complete: {} resolved, {} failed ({} distinct of {} entries)",
        resolution.resolved.len(),
        resolution.failed.len(),
        distinct_total,
        decklist.len()
    );

    resolution
}

/// Resolve a single deck entry: cache check, then at most one fetch.
///
/// Returns `Ok(true)` on a cache hit, `Ok(false)` after a successful fetch.
pub(crate) async fn resolve_entry(
    client: &Result<reqwest::Client, ResolveError>,
    entry: &DeckEntry,
    config: &JobConfig,
) -> Result<bool, ResolveError> {
    if entry.id.is_empty() {
        // All-zero input; an empty path segment would make a nonsense URL.
        return Err(ResolveError::InvalidIdentifier);
    }

    let path = image_path(&config.image_dir, &entry.id);
    if path.exists() {
        debug!("Cache hit: {}", path.display());
        return Ok(true);
    }

    let client = client.as_ref().map_err(Clone::clone)?;
    fetch_image(client, &entry.id, &path, config).await?;
    Ok(false)
}

/// Fetch one image from the remote host into the cache. Exactly one
/// attempt, no backoff — a later job retries naturally.
async fn fetch_image(
    client: &reqwest::Client,
    id: &str,
    path: &Path,
    config: &JobConfig,
) -> Result<(), ResolveError> {
    let url = format!("{}/{id}.jpg", config.image_host);
    info!("Fetching card image: {url}");

    let secs = config.fetch_timeout_secs;
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| map_transport_error(e, secs))?;

    if !response.status().is_success() {
        return Err(ResolveError::HttpStatus(response.status().as_u16()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| map_transport_error(e, secs))?;

    // A 200 carrying an HTML error page must never poison the cache.
    image::load_from_memory(&bytes).map_err(|e| ResolveError::NotAnImage(e.to_string()))?;

    let image_dir = config.image_dir.clone();
    let final_path = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_cache_atomic(&bytes, &image_dir, &final_path))
        .await
        .map_err(|e| ResolveError::Unknown(format!("cache write task panicked: {e}")))??;

    debug!("Cached {} ({} bytes)", path.display(), path.metadata().map(|m| m.len()).unwrap_or(0));
    Ok(())
}

/// Write fully buffered image bytes via a unique temp file + atomic rename.
fn write_cache_atomic(bytes: &[u8], image_dir: &Path, path: &Path) -> Result<(), ResolveError> {
    let mut tmp = tempfile::NamedTempFile::new_in(image_dir)
        .map_err(|e| ResolveError::Unknown(format!("cache temp file: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ResolveError::Unknown(format!("cache write: {e}")))?;
    // Dropping `tmp` on any earlier error deletes the temp file.
    tmp.persist(path)
        .map_err(|e| ResolveError::Unknown(format!("cache rename: {e}")))?;
    Ok(())
}

/// Map a reqwest transport error onto the resolution taxonomy.
fn map_transport_error(e: reqwest::Error, secs: u64) -> ResolveError {
    if e.is_timeout() {
        ResolveError::Timeout { secs }
    } else {
        ResolveError::Network(e.to_string())
    }
}
