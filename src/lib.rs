//! # deck2pdf
//!
//! Turn a trading-card decklist into a print-ready PDF sheet of card images
//! laid out in a fixed grid, suitable for proxy printing.
//!
//! ## Why this crate?
//!
//! Testing a deck on paper shouldn't require owning every card. Given a
//! decklist — a `.ydk` file, a shareable `ydke://` token, or a JSON card
//! list with quantities — this crate resolves every card to a locally
//! cached scan and packs the images three-per-row onto A4 pages at real
//! card size. Missing cards never sink the job: they are reported back by
//! identifier while the rest of the sheet prints.
//!
//! ## Pipeline Overview
//!
//! ```text
//! decklist
//!  │
//!  ├─ 1. Normalize  .ydk lines / ydke:// token / {id, quantity} JSON
//!  │                → one ordered identifier list
//!  ├─ 2. Resolve    local cache hit, or one sequential fetch per card
//!  ├─ 3. Layout     deterministic 3-column grid, page breaks on row ends
//!  ├─ 4. Render     aspect-fit images into cells, emit PDF
//!  └─ 5. Output     <prefix>_<random suffix>.pdf + per-card failure report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deck2pdf::{run_job, JobConfig, JobSubmission};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = JobConfig::default();
//!     let contents = std::fs::read_to_string("burning-abyss.ydk")?;
//!     let output = run_job(
//!         JobSubmission::DeckFile {
//!             name: "burning-abyss.ydk".into(),
//!             contents,
//!         },
//!         &config,
//!     )
//!     .await?;
//!     println!("{} proxies → pdf/{}", output.success_count, output.filename);
//!     if let Some(warning) = output.warning {
//!         eprintln!("{warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `deck2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! deck2pdf = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod job;
pub mod locale;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{JobConfig, JobConfigBuilder, DEFAULT_IMAGE_HOST};
pub use error::{ProxyError, ResolveError};
pub use job::{artifact_exists, run_job, JobSubmission};
pub use locale::Lang;
pub use output::{JobOutput, JobStats, Resolution, ResolveFailure};
pub use pipeline::normalize::{DeckEntry, Decklist};
pub use progress::{JobProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{resolve_stream, ResolveStream, ResolvedCard};
