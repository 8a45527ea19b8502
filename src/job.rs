//! Job orchestration: one submission in, one proxy sheet out.
//!
//! The orchestrator is deliberately thin glue — it sequences
//! normalize → resolve → render, decides whether the job can proceed at all
//! (at least one resolved image), and assembles the user-facing
//! [`JobOutput`]. All the actual work lives in the pipeline stages.

use crate::config::JobConfig;
use crate::error::ProxyError;
use crate::locale;
use crate::output::{JobOutput, JobStats};
use crate::pipeline::normalize::{self, Decklist};
use crate::pipeline::{render, resolve};
use once_cell::sync::Lazy;
use rand::distr::Alphanumeric;
use rand::Rng;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Prefix used for artifact names when the submission has no filename.
const DEFAULT_PREFIX: &str = "deck";
/// Artifact prefixes are cut to this many characters.
const PREFIX_MAX_LEN: usize = 12;
/// Length of the random artifact suffix.
const SUFFIX_LEN: usize = 12;

/// One job submission, exactly one of the three accepted shapes.
#[derive(Debug, Clone)]
pub enum JobSubmission {
    /// An uploaded newline-delimited decklist file. `name` is the original
    /// filename and must end in `.ydk`.
    DeckFile { name: String, contents: String },
    /// An encoded `ydke://` deck token (scheme optional).
    Token(String),
    /// A JSON array of `{id, quantity}` objects, possibly double-encoded.
    CardList(String),
}

/// Run one proxy-sheet job end to end.
///
/// # Returns
/// `Ok(JobOutput)` on success, even when some identifiers failed to resolve
/// (check `output.failures` / `output.warning`).
///
/// # Errors
/// Returns `Err(ProxyError)` only for fatal errors:
/// - malformed or missing submission (before any resolution work starts)
/// - an empty resolved set after a full resolution pass (`NoValidImages`)
/// - inability to write the artifact
pub async fn run_job(
    submission: JobSubmission,
    config: &JobConfig,
) -> Result<JobOutput, ProxyError> {
    let total_start = Instant::now();

    // ── Step 1: Validate and normalize the submission ────────────────────
    let (decklist, prefix) = normalize_submission(&submission, config).await?;
    info!(
        "Job started: {} deck entries ({} distinct)",
        decklist.len(),
        decklist.ids().collect::<HashSet<_>>().len()
    );

    if let Some(ref cb) = config.progress_callback {
        let distinct = decklist.ids().collect::<HashSet<_>>().len();
        cb.on_job_start(decklist.len(), distinct);
    }

    // ── Step 2: Resolve images, sequentially, accumulating failures ──────
    let resolve_start = Instant::now();
    let resolution = resolve::resolve(&decklist, config).await;
    let resolve_duration_ms = resolve_start.elapsed().as_millis() as u64;

    if resolution.resolved.is_empty() {
        let first_error = resolution
            .failed
            .first()
            .map(|f| f.reason.to_string())
            .unwrap_or_else(|| "decklist is empty".to_string());
        return Err(ProxyError::NoValidImages {
            requested: decklist.len(),
            first_error,
        });
    }

    // ── Step 3: Lay out and render the resolved images ───────────────────
    // Placement order is deck order restricted to resolved identifiers,
    // duplicates included — each duplicate is a distinct proxy.
    let resolved_set: HashSet<&str> = resolution.resolved.iter().map(String::as_str).collect();
    let placement_ids: Vec<String> = decklist
        .ids()
        .filter(|id| resolved_set.contains(id))
        .map(String::from)
        .collect();

    let render_start = Instant::now();
    let document = render::render_document(&placement_ids, &config.image_dir).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    if document.placed == 0 {
        // Everything resolved vanished before layout; nothing to ship.
        return Err(ProxyError::NoValidImages {
            requested: decklist.len(),
            first_error: "all resolved images disappeared before layout".to_string(),
        });
    }

    // ── Step 4: Write the artifact under a collision-resistant name ──────
    let filename = artifact_filename(&prefix);
    write_artifact(&config.output_dir, &filename, &document.bytes).await?;
    info!(
        "Job complete: {}/{} images on {} page(s) → {}",
        document.placed,
        placement_ids.len(),
        document.pages,
        filename
    );

    // ── Step 5: Assemble the result summary ──────────────────────────────
    let mut missing: Vec<String> = resolution
        .failed
        .iter()
        .map(|f| f.original_id.clone())
        .collect();
    missing.extend(document.skipped.iter().cloned());

    let warning = if missing.is_empty() {
        None
    } else {
        Some(locale::partial_warning(config.lang, &missing, document.placed))
    };

    let failed_count = resolution.failed.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_job_complete(document.placed, failed_count);
    }

    Ok(JobOutput {
        filename,
        success_count: document.placed,
        failures: resolution.failed,
        warning,
        stats: JobStats {
            requested: decklist.len(),
            resolved: resolution.resolved.len(),
            failed: failed_count,
            placed: document.placed,
            pages: document.pages,
            resolve_duration_ms,
            render_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        },
    })
}

/// Check which artifact filenames exist in the output store.
///
/// Each candidate is reduced to its final path component before probing,
/// so traversal sequences (`../`, absolute paths) cannot escape the store.
pub async fn artifact_exists<S: AsRef<str>>(output_dir: &Path, names: &[S]) -> Vec<bool> {
    let checks = names.iter().map(|name| {
        let candidate = Path::new(name.as_ref())
            .file_name()
            .map(|f| output_dir.join(f));
        async move {
            match candidate {
                Some(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
                None => false,
            }
        }
    });
    futures::future::join_all(checks).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Validate the submission shape and normalize it into a decklist, plus the
/// prefix used for the artifact name.
async fn normalize_submission(
    submission: &JobSubmission,
    config: &JobConfig,
) -> Result<(Decklist, String), ProxyError> {
    match submission {
        JobSubmission::DeckFile { name, contents } => {
            if !name.to_ascii_lowercase().ends_with(".ydk") {
                return Err(ProxyError::InvalidFileType { name: name.clone() });
            }
            archive_upload(config, name, contents).await;
            let stem = Path::new(name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(DEFAULT_PREFIX);
            Ok((normalize::from_list_file(contents), sanitize_prefix(stem)))
        }
        JobSubmission::Token(token) => {
            if token.trim().is_empty() {
                return Err(ProxyError::NoInputProvided);
            }
            Ok((normalize::from_token(token)?, DEFAULT_PREFIX.to_string()))
        }
        JobSubmission::CardList(payload) => {
            if payload.trim().is_empty() {
                return Err(ProxyError::NoInputProvided);
            }
            Ok((normalize::from_card_list(payload)?, DEFAULT_PREFIX.to_string()))
        }
    }
}

/// Best-effort copy of an uploaded decklist into the archive directory.
async fn archive_upload(config: &JobConfig, name: &str, contents: &str) {
    let Some(ref upload_dir) = config.upload_dir else {
        return;
    };
    let Some(file_name) = Path::new(name).file_name() else {
        return;
    };
    let path = upload_dir.join(file_name);
    let result = async {
        tokio::fs::create_dir_all(upload_dir).await?;
        tokio::fs::write(&path, contents).await
    }
    .await;
    match result {
        Ok(()) => debug!("Archived upload to {}", path.display()),
        Err(e) => warn!("Could not archive upload {}: {e}", path.display()),
    }
}

static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").unwrap());

/// Strip whitespace and non-word characters from a name and cut it to
/// [`PREFIX_MAX_LEN`]; an empty result falls back to the fixed prefix.
fn sanitize_prefix(name: &str) -> String {
    let stripped = RE_NON_WORD.replace_all(name, "");
    let prefix: String = stripped.chars().take(PREFIX_MAX_LEN).collect();
    if prefix.is_empty() {
        DEFAULT_PREFIX.to_string()
    } else {
        prefix
    }
}

/// `<prefix>_<12 alphanumeric chars>.pdf`
fn artifact_filename(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{prefix}_{suffix}.pdf")
}

/// Write the PDF atomically (temp name + rename) so a crashed job never
/// leaves a half-written artifact that passes an existence check.
async fn write_artifact(output_dir: &Path, filename: &str, bytes: &[u8]) -> Result<(), ProxyError> {
    let path = output_dir.join(filename);

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| ProxyError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| ProxyError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| ProxyError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    Ok(())
}
