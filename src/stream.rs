//! Streaming resolution API: emit per-card outcomes as they happen.
//!
//! ## Why stream?
//!
//! A sixty-card decklist with a cold cache takes sixty sequential fetches.
//! A streams-based API lets callers (a progress page, an SSE endpoint) show
//! each card land instead of staring at a spinner until the batch returns.
//!
//! Unlike the eager [`crate::pipeline::resolve::resolve`] which returns the
//! full partition at once, [`resolve_stream`] yields one
//! `Result<ResolvedCard, ResolveFailure>` per distinct identifier, strictly
//! in first-occurrence order — resolution is sequential by design, so the
//! stream is too.

use crate::config::JobConfig;
use crate::output::ResolveFailure;
use crate::pipeline::normalize::{DeckEntry, Decklist};
use crate::pipeline::resolve;
use std::collections::HashSet;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A successfully resolved identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCard {
    /// Canonical identifier.
    pub id: String,
    /// True when the image was already cached and no fetch was issued.
    pub from_cache: bool,
}

/// A boxed stream of per-card resolution outcomes.
pub type ResolveStream = Pin<Box<dyn Stream<Item = Result<ResolvedCard, ResolveFailure>> + Send>>;

/// Resolve a decklist, yielding each distinct identifier's outcome as it is
/// decided.
///
/// Duplicate deck entries collapse exactly as in the eager API: the first
/// occurrence is resolved, later occurrences are silently skipped.
pub fn resolve_stream(decklist: &Decklist, config: &JobConfig) -> ResolveStream {
    info!("Starting streaming resolution: {} entries", decklist.len());

    // Collapse duplicates up front; the stream owns its work list.
    let mut seen: HashSet<&str> = HashSet::new();
    let entries: Vec<DeckEntry> = decklist
        .entries()
        .iter()
        .filter(|e| seen.insert(e.id.as_str()))
        .cloned()
        .collect();

    let config = config.clone();
    let client = resolve::build_client(config.fetch_timeout_secs);

    let s = futures::stream::unfold(
        (entries.into_iter(), client, config),
        |(mut entries, client, config)| async move {
            let entry = entries.next()?;
            let outcome = match resolve::resolve_entry(&client, &entry, &config).await {
                Ok(from_cache) => Ok(ResolvedCard {
                    id: entry.id,
                    from_cache,
                }),
                Err(reason) => Err(ResolveFailure {
                    id: entry.id,
                    original_id: entry.original,
                    reason,
                }),
            };
            Some((outcome, (entries, client, config)))
        },
    );

    Box::pin(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::from_list_file;
    use crate::pipeline::resolve::image_path;
    use tokio_stream::StreamExt;

    fn offline_config(image_dir: &std::path::Path) -> JobConfig {
        JobConfig::builder()
            .image_host("http://127.0.0.1:9")
            .image_dir(image_dir)
            .fetch_timeout_secs(1)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn stream_yields_outcomes_in_first_occurrence_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(image_path(dir.path(), "1111"), b"stub").unwrap();
        let config = offline_config(dir.path());

        let deck = from_list_file("1111\n2222\n1111\n");
        let outcomes: Vec<_> = resolve_stream(&deck, &config).collect().await;

        assert_eq!(outcomes.len(), 2, "duplicates collapse");
        let first = outcomes[0].as_ref().unwrap();
        assert_eq!(first.id, "1111");
        assert!(first.from_cache);
        assert_eq!(outcomes[1].as_ref().unwrap_err().id, "2222");
    }

    #[tokio::test]
    async fn stream_and_eager_agree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(image_path(dir.path(), "46986414"), b"stub").unwrap();
        let config = offline_config(dir.path());
        let deck = from_list_file("46986414\n0000\n");

        let eager = resolve::resolve(&deck, &config).await;
        let streamed: Vec<_> = resolve_stream(&deck, &config).collect().await;

        let streamed_ok: Vec<String> = streamed
            .iter()
            .filter_map(|r| r.as_ref().ok().map(|c| c.id.clone()))
            .collect();
        assert_eq!(streamed_ok, eager.resolved);
        assert_eq!(
            streamed.iter().filter(|r| r.is_err()).count(),
            eager.failed.len()
        );
    }
}
