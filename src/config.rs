//! Configuration types for proxy-sheet jobs.
//!
//! All job behaviour is controlled through [`JobConfig`], built via its
//! [`JobConfigBuilder`]. Keeping every knob in one struct makes it trivial to
//! share configs across jobs, log them, and diff two runs to understand why
//! their outputs differ.
//!
//! The grid geometry is deliberately NOT here: page size, margins, and cell
//! dimensions are fixed constants in [`crate::pipeline::layout`]. A proxy
//! sheet that doesn't match real card dimensions is useless, so there is
//! nothing to configure.

use crate::error::ProxyError;
use crate::locale::Lang;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Default image host serving card scans as `<host>/<passcode>.jpg`.
pub const DEFAULT_IMAGE_HOST: &str = "https://storage.googleapis.com/ygoprodeck.com/pics";

/// Configuration for one proxy-sheet job.
///
/// Built via [`JobConfig::builder()`] or using [`JobConfig::default()`].
///
/// # Example
/// ```rust
/// use deck2pdf::JobConfig;
///
/// let config = JobConfig::builder()
///     .image_dir("images")
///     .output_dir("pdf")
///     .fetch_timeout_secs(10)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct JobConfig {
    /// Base URL of the remote image source. Default: the ygoprodeck pics
    /// bucket. Each identifier is fetched as `<image_host>/<id>.jpg`.
    pub image_host: String,

    /// Local cache directory for fetched card images. Default: `images`.
    ///
    /// A cached image, however stale, is always preferred over re-fetching;
    /// card scans for a given passcode never change, and the cache makes
    /// repeat jobs effectively free of network traffic.
    pub image_dir: PathBuf,

    /// Directory where generated PDF artifacts are written. Default: `pdf`.
    pub output_dir: PathBuf,

    /// Optional archive directory for uploaded decklist files. When set,
    /// file submissions are copied here before processing; archival failure
    /// is logged and ignored.
    pub upload_dir: Option<PathBuf>,

    /// Per-image fetch timeout in seconds. Default: 10.
    ///
    /// Fetches are strictly sequential within a job, so a single unreachable
    /// image must not be allowed to stall the sheet indefinitely. Ten
    /// seconds is generous for a ~100 kB JPEG; a host slower than that is
    /// effectively down.
    pub fetch_timeout_secs: u64,

    /// Language for user-facing messages (warning text, error messages).
    /// Default: English. Negotiate from an `Accept-Language` header with
    /// [`Lang::negotiate`].
    pub lang: Lang,

    /// Optional per-card progress events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            image_host: DEFAULT_IMAGE_HOST.to_string(),
            image_dir: PathBuf::from("images"),
            output_dir: PathBuf::from("pdf"),
            upload_dir: None,
            fetch_timeout_secs: 10,
            lang: Lang::En,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for JobConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobConfig")
            .field("image_host", &self.image_host)
            .field("image_dir", &self.image_dir)
            .field("output_dir", &self.output_dir)
            .field("upload_dir", &self.upload_dir)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("lang", &self.lang)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn JobProgressCallback>"),
            )
            .finish()
    }
}

impl JobConfig {
    /// Create a new builder for `JobConfig`.
    pub fn builder() -> JobConfigBuilder {
        JobConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`JobConfig`].
#[derive(Debug)]
pub struct JobConfigBuilder {
    config: JobConfig,
}

impl JobConfigBuilder {
    pub fn image_host(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        // A trailing slash would double up in the fetch URL.
        self.config.image_host = host.trim_end_matches('/').to_string();
        self
    }

    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.image_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = Some(dir.into());
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs.max(1);
        self
    }

    pub fn lang(mut self, lang: Lang) -> Self {
        self.config.lang = lang;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<JobConfig, ProxyError> {
        let c = &self.config;
        if c.image_host.is_empty() {
            return Err(ProxyError::InvalidConfig("image_host must not be empty".into()));
        }
        if !c.image_host.starts_with("http://") && !c.image_host.starts_with("https://") {
            return Err(ProxyError::InvalidConfig(format!(
                "image_host must be an HTTP(S) URL, got '{}'",
                c.image_host
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = JobConfig::default();
        assert_eq!(c.fetch_timeout_secs, 10);
        assert_eq!(c.image_dir, PathBuf::from("images"));
        assert_eq!(c.lang, Lang::En);
        assert!(c.image_host.starts_with("https://"));
    }

    #[test]
    fn builder_strips_trailing_slash() {
        let c = JobConfig::builder()
            .image_host("https://example.com/pics/")
            .build()
            .unwrap();
        assert_eq!(c.image_host, "https://example.com/pics");
    }

    #[test]
    fn builder_rejects_non_http_host() {
        let err = JobConfig::builder().image_host("ftp://nope").build();
        assert!(matches!(err, Err(ProxyError::InvalidConfig(_))));
    }

    #[test]
    fn timeout_is_clamped_to_at_least_one() {
        let c = JobConfig::builder().fetch_timeout_secs(0).build().unwrap();
        assert_eq!(c.fetch_timeout_secs, 1);
    }
}
