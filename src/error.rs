//! Error types for the deck2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ProxyError`] — **Fatal**: the job cannot proceed at all (malformed
//!   submission, wrong file type, nothing resolved). Returned as
//!   `Err(ProxyError)` from the top-level [`crate::job::run_job`].
//!
//! * [`ResolveError`] — **Non-fatal**: a single card identifier failed to
//!   resolve (HTTP error, timeout, empty identifier) but every other
//!   identifier is fine. Stored inside [`crate::output::ResolveFailure`] so
//!   callers can inspect partial success rather than losing the whole sheet
//!   to one dead image link.
//!
//! Partial failure is the normal case here, not exceptional: a decklist of
//! sixty cards with one unknown passcode should still print fifty-nine
//! proxies and name the missing one in the warning.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the deck2pdf library.
///
/// Per-identifier failures use [`ResolveError`] and are stored in
/// [`crate::output::ResolveFailure`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ProxyError {
    // ── Submission errors ─────────────────────────────────────────────────
    /// Uploaded decklist file does not carry the `.ydk` extension.
    #[error("Not a decklist file: '{name}'\nExpected a filename ending in .ydk.")]
    InvalidFileType { name: String },

    /// The submission payload could not be parsed into a decklist.
    #[error("Invalid decklist format: {0}")]
    InvalidFormat(String),

    /// The submission carried neither a file, a deck token, nor a card list.
    #[error("No decklist provided: submit a .ydk file, a ydke:// token, or a card list")]
    NoInputProvided,

    // ── Resolution errors ─────────────────────────────────────────────────
    /// Every requested identifier failed to resolve; no sheet can be built.
    #[error("No card image could be resolved ({requested} requested, first error: {first_error})")]
    NoValidImages {
        requested: usize,
        first_error: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the generated PDF artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal resolution error for a single card identifier.
///
/// Stored alongside the identifier in [`crate::output::ResolveFailure`].
/// The overall job continues unless ALL identifiers fail.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ResolveError {
    /// The image host answered with a non-success status.
    #[error("image host returned HTTP {0}")]
    HttpStatus(u16),

    /// Transport-level failure (DNS, refused connection, dropped stream).
    #[error("network error: {0}")]
    Network(String),

    /// The fetch exceeded the per-image timeout.
    #[error("fetch timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The identifier normalized to an empty string (all-zero input) and
    /// was never sent to the image host.
    #[error("identifier is empty after normalization")]
    InvalidIdentifier,

    /// The transfer succeeded but the body is not a decodable image.
    #[error("response is not a valid image: {0}")]
    NotAnImage(String),

    /// Anything else.
    #[error("unknown error: {0}")]
    Unknown(String),
}
