//! CLI binary for deck2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to `JobConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use deck2pdf::{
    artifact_exists, run_job, JobConfig, JobProgressCallback, JobSubmission, Lang,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-card log
/// lines using [indicatif]. Resolution is sequential, so events arrive in
/// order; the counters are atomics only because the trait is `Sync`.
struct CliProgressCallback {
    bar: ProgressBar,
    fetches: AtomicUsize,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set by `on_job_start`
    /// (called once the decklist has been normalized).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_job_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading decklist…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            fetches: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} cards  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Resolving");
    }
}

impl JobProgressCallback for CliProgressCallback {
    fn on_job_start(&self, total_cards: usize, distinct: usize) {
        self.activate_bar(distinct);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Resolving {distinct} distinct cards ({total_cards} deck slots)…"
            ))
        ));
    }

    fn on_card_start(&self, id: &str, _index: usize, _distinct: usize) {
        self.bar.set_message(format!("card {id}"));
    }

    fn on_card_resolved(&self, id: &str, _index: usize, _distinct: usize, from_cache: bool) {
        if from_cache {
            self.bar
                .println(format!("  {} {:<10}  {}", green("✓"), id, dim("cached")));
        } else {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.bar
                .println(format!("  {} {:<10}  {}", green("✓"), id, dim("fetched")));
        }
        self.bar.inc(1);
    }

    fn on_card_failed(&self, id: &str, _index: usize, _distinct: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };

        self.bar
            .println(format!("  {} {:<10}  {}", red("✗"), id, red(&msg)));
        self.bar.inc(1);
    }

    fn on_job_complete(&self, placed: usize, failed: usize) {
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} proxies rendered",
                green("✔"),
                bold(&placed.to_string())
            );
        } else {
            eprintln!(
                "{} {} proxies rendered  ({} cards missing)",
                cyan("⚠"),
                bold(&placed.to_string()),
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print proxies from a .ydk decklist
  deck2pdf burning-abyss.ydk

  # From a shareable deck token (scheme optional)
  deck2pdf --token 'ydke://5m3qAu...!!...!'

  # From a JSON card list with quantities
  deck2pdf --cards '[{"id":46986414,"quantity":3},{"id":89631139}]'

  # French messages, custom stores
  deck2pdf --lang fr --image-dir /var/cache/cards --output-dir /srv/pdf deck.ydk

  # Machine-readable result
  deck2pdf --json deck.ydk

  # Check whether generated sheets still exist
  deck2pdf --exists deck_h3kQ9mPx2LtZ.pdf deck_a81bC02dEf34.pdf

STORES:
  images/   cached card scans, shared between runs; cache hits never touch
            the network, so repeat sheets are instant
  pdf/      generated sheets, one immutable file per job

ENVIRONMENT VARIABLES:
  DECK2PDF_IMAGE_HOST   Override the card image host
  DECK2PDF_IMAGE_DIR    Override the image cache directory
  DECK2PDF_OUTPUT_DIR   Override the artifact directory
"#;

/// Turn decklists into print-ready proxy PDF sheets.
#[derive(Parser, Debug)]
#[command(
    name = "deck2pdf",
    version,
    about = "Turn decklists into print-ready proxy PDF sheets",
    long_about = "Turn a trading-card decklist (.ydk file, ydke:// token, or JSON card list) \
into a print-ready PDF sheet of card images, three per row on A4 pages at real card size. \
Card scans are cached locally; missing cards are reported without sinking the sheet.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to a .ydk decklist file.
    deckfile: Option<PathBuf>,

    /// Encoded ydke:// deck token (scheme optional).
    #[arg(long, conflicts_with = "deckfile")]
    token: Option<String>,

    /// JSON array of {id, quantity} objects.
    #[arg(long, conflicts_with_all = ["deckfile", "token"])]
    cards: Option<String>,

    /// Check artifact existence instead of running a job.
    #[arg(long, num_args = 1.., value_name = "FILENAME")]
    exists: Option<Vec<String>>,

    /// Directory for generated PDF sheets.
    #[arg(long, env = "DECK2PDF_OUTPUT_DIR", default_value = "pdf")]
    output_dir: PathBuf,

    /// Local cache directory for card images.
    #[arg(long, env = "DECK2PDF_IMAGE_DIR", default_value = "images")]
    image_dir: PathBuf,

    /// Remote image host serving <host>/<id>.jpg.
    #[arg(long, env = "DECK2PDF_IMAGE_HOST")]
    image_host: Option<String>,

    /// Archive directory for submitted decklist files.
    #[arg(long, env = "DECK2PDF_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Per-image fetch timeout in seconds.
    #[arg(long, env = "DECK2PDF_FETCH_TIMEOUT", default_value_t = 10)]
    fetch_timeout: u64,

    /// Message language: en, fr, or an Accept-Language header value.
    #[arg(long, env = "DECK2PDF_LANG", default_value = "en")]
    lang: String,

    /// Output the job result as JSON instead of a summary.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Existence-check mode ─────────────────────────────────────────────
    if let Some(ref names) = cli.exists {
        let found = artifact_exists(&cli.output_dir, names).await;
        for (name, ok) in names.iter().zip(&found) {
            if cli.json {
                println!("{}", serde_json::json!({ "filename": name, "exists": ok }));
            } else {
                println!("{}  {}", if *ok { green("✔") } else { red("✗") }, name);
            }
        }
        if found.iter().all(|ok| *ok) {
            return Ok(());
        }
        std::process::exit(1);
    }

    // ── Build submission and config ──────────────────────────────────────
    let submission = build_submission(&cli).await?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn JobProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let lang = config.lang;

    // ── Run the job ──────────────────────────────────────────────────────
    let output = match run_job(submission, &config).await {
        Ok(output) => output,
        Err(err) => {
            eprintln!("{} {}", red("✘"), deck2pdf::locale::error_message(lang, &err));
            std::process::exit(1);
        }
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else {
        let artifact = cli.output_dir.join(&output.filename);
        eprintln!(
            "{}  {} proxies on {} page(s)  {}ms  →  {}",
            if output.failures.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            output.success_count,
            output.stats.pages,
            output.stats.total_duration_ms,
            bold(&artifact.display().to_string()),
        );
        if let Some(ref warning) = output.warning {
            eprintln!("   {}", cyan(warning));
        }
        for failure in &output.failures {
            eprintln!(
                "   {} {}  {}",
                red("✗"),
                failure.original_id,
                dim(&failure.reason.to_string())
            );
        }
    }

    Ok(())
}

/// Map CLI args to a `JobSubmission`.
async fn build_submission(cli: &Cli) -> Result<JobSubmission> {
    if let Some(ref path) = cli.deckfile {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read decklist {:?}", path))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("deck.ydk")
            .to_string();
        return Ok(JobSubmission::DeckFile { name, contents });
    }
    if let Some(ref token) = cli.token {
        return Ok(JobSubmission::Token(token.clone()));
    }
    if let Some(ref cards) = cli.cards {
        return Ok(JobSubmission::CardList(cards.clone()));
    }
    anyhow::bail!("No decklist provided: pass a .ydk file, --token, or --cards")
}

/// Map CLI args to `JobConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<JobConfig> {
    let lang = match cli.lang.to_ascii_lowercase().as_str() {
        "en" => Lang::En,
        "fr" => Lang::Fr,
        header => Lang::negotiate(header),
    };

    let mut builder = JobConfig::builder()
        .image_dir(&cli.image_dir)
        .output_dir(&cli.output_dir)
        .fetch_timeout_secs(cli.fetch_timeout)
        .lang(lang);

    if let Some(ref host) = cli.image_host {
        builder = builder.image_host(host.clone());
    }
    if let Some(ref dir) = cli.upload_dir {
        builder = builder.upload_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
