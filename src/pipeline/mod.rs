//! Pipeline stages for decklist-to-proxy-sheet jobs.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. switch the PDF backend) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! normalize ──▶ resolve ──▶ layout ──▶ render
//! (3 formats)   (cache/HTTP)  (grid)    (PDF)
//! ```
//!
//! 1. [`normalize`] — turn a `.ydk` file, a `ydke://` token, or a JSON card
//!    list into one ordered [`normalize::Decklist`]
//! 2. [`resolve`] — ensure a local image exists per identifier; the only
//!    stage with network I/O, strictly sequential within a job
//! 3. [`layout`] — pure grid placement across A4 pages, deterministic by
//!    construction
//! 4. [`render`] — decode cached images, apply the layout, emit PDF bytes
//!    in `spawn_blocking`

pub mod layout;
pub mod normalize;
pub mod render;
pub mod resolve;
