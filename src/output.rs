//! Result types produced by a proxy-sheet job.

use crate::error::ResolveError;
use serde::{Deserialize, Serialize};

/// One identifier that could not be resolved to a local image.
///
/// Carries both the canonical identifier (`id`) and the form the user
/// actually submitted (`original_id`, before leading-zero stripping) so the
/// warning shown back to the user matches what they typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveFailure {
    /// Canonical identifier (leading zeros stripped).
    pub id: String,
    /// Identifier as it appeared in the submission.
    pub original_id: String,
    /// Why resolution failed.
    pub reason: ResolveError,
}

/// Partition of a decklist's distinct identifiers after a resolution pass.
///
/// Invariant: every distinct identifier in the decklist appears in exactly
/// one of `resolved` / `failed`, each ordered by first occurrence. Duplicate
/// deck entries collapse here — the decklist itself keeps them, because each
/// duplicate is a distinct slot on the printed sheet.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Distinct identifiers with a usable local image file.
    pub resolved: Vec<String>,
    /// Distinct identifiers that could not be resolved, with reasons.
    pub failed: Vec<ResolveFailure>,
}

impl Resolution {
    /// Count of distinct identifiers examined.
    pub fn distinct(&self) -> usize {
        self.resolved.len() + self.failed.len()
    }
}

/// Timing and count statistics for one job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStats {
    /// Deck entries after normalization (duplicates included).
    pub requested: usize,
    /// Distinct identifiers with a local image after resolution.
    pub resolved: usize,
    /// Distinct identifiers that failed to resolve.
    pub failed: usize,
    /// Images actually placed on the sheet. Can fall below the duplicate-
    /// expanded resolved count if a cached file vanished between resolution
    /// and layout.
    pub placed: usize,
    /// Pages in the generated document.
    pub pages: usize,
    /// Wall-clock time spent resolving images (cache checks + fetches).
    pub resolve_duration_ms: u64,
    /// Wall-clock time spent building and writing the PDF.
    pub render_duration_ms: u64,
    /// Total job duration.
    pub total_duration_ms: u64,
}

/// The user-facing result of a successful (possibly partially successful)
/// job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutput {
    /// Artifact filename inside the output directory, e.g.
    /// `burningabyss_h3kQ9mPx2LtZ.pdf`.
    pub filename: String,
    /// Images actually rendered onto the sheet.
    pub success_count: usize,
    /// Identifiers that could not be resolved; empty on full success.
    pub failures: Vec<ResolveFailure>,
    /// Localized warning when the sheet is incomplete; `None` on full
    /// success.
    pub warning: Option<String>,
    /// Timing and count statistics.
    pub stats: JobStats,
}
