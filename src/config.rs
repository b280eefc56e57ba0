//! Configuration types for batch conversion.
//!
//! All workflow behaviour is controlled through [`ConvertConfig`], built via
//! its [`ConvertConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across calls, serialise the scalar parts for
//! logging, and diff two runs to understand why their outcomes differ.
//!
//! The poll loop deserves its own type: the service we talk to completes
//! conversion jobs asynchronously, and the cadence of status queries is the
//! only place where this client can either behave well or hammer the remote
//! side. [`PollPolicy`] makes that cadence explicit and injectable.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Cadence for status polling of a single conversion task.
///
/// The default is a bounded interval with mild exponential backoff and no
/// attempt cap: conversions routinely take minutes, so the poller waits as
/// long as the service needs while keeping request volume low.
///
/// [`PollPolicy::legacy`] reproduces the historical client behaviour — an
/// unbounded zero-delay spin until the service flips its `done` flag. That
/// cadence saturates one CPU and the network path for the whole wait and is
/// offered for strict compatibility only.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second status query. Default: 2000 ms.
    pub interval_ms: u64,

    /// Multiplier applied to the delay after each pending response. Default: 1.5.
    ///
    /// 2 s → 3 s → 4.5 s → … keeps early feedback snappy for fast jobs while
    /// long-running conversions settle at [`max_interval_ms`](Self::max_interval_ms).
    pub backoff_multiplier: f64,

    /// Upper bound on the inter-query delay. Default: 30 000 ms.
    pub max_interval_ms: u64,

    /// Give up on a task after this many status queries. Default: `None`.
    ///
    /// `None` polls until the service reports completion — a stalled service
    /// stalls the batch. Set a cap to surface
    /// [`ConvertError::PollTimeout`](crate::ConvertError::PollTimeout) instead.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            backoff_multiplier: 1.5,
            max_interval_ms: 30_000,
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    /// Zero-delay, unbounded polling — the historical client's busy-loop.
    pub fn legacy() -> Self {
        Self {
            interval_ms: 0,
            backoff_multiplier: 1.0,
            max_interval_ms: 0,
            max_attempts: None,
        }
    }

    /// Fixed-interval polling with no backoff and no attempt cap.
    pub fn fixed(interval: Duration) -> Self {
        let ms = interval.as_millis() as u64;
        Self {
            interval_ms: ms,
            backoff_multiplier: 1.0,
            max_interval_ms: ms,
            max_attempts: None,
        }
    }

    /// Delay to sleep after the `attempt`-th pending response (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.interval_ms == 0 {
            return Duration::ZERO;
        }
        let factor = self.backoff_multiplier.max(1.0).powi(attempt.saturating_sub(1).min(64) as i32);
        let ms = (self.interval_ms as f64 * factor).min(self.max_interval_ms.max(self.interval_ms) as f64);
        Duration::from_millis(ms as u64)
    }
}

/// Configuration for one batch-conversion call.
///
/// Built via [`ConvertConfig::builder()`] or [`ConvertConfig::default()`].
///
/// # Example
/// ```rust
/// use doc2json::{ConvertConfig, PollPolicy};
///
/// let config = ConvertConfig::builder()
///     .poll(PollPolicy::default())
///     .download_results(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConvertConfig {
    /// Status-poll cadence. Default: [`PollPolicy::default`].
    pub poll: PollPolicy,

    /// Also locate, download, and report results after polling. Default: false.
    ///
    /// With the flag off the orchestrators stop after polling and return the
    /// structured [`ConversionResult`](crate::output::ConversionResult) for
    /// programmatic use. With it on — the CLI's mode — completed results are
    /// downloaded into [`result_dir`](Self::result_dir) and a completion
    /// report is written alongside them. The flag is set by the caller, never
    /// auto-detected.
    pub download_results: bool,

    /// Directory for downloaded artifacts and the report.
    ///
    /// `None` creates a timestamped `results_<unix-secs>` directory under the
    /// current working directory when the download phase runs.
    pub result_dir: Option<PathBuf>,

    /// Staging root whose `tmpzip/` subdirectory is scanned for batched input.
    ///
    /// The batching of loose files into upload-ready zips is done by an
    /// external collaborator that stages its output under
    /// `<staging_root>/tmpzip/`. `None` uses a fresh temporary directory per
    /// call, so only pre-zipped inputs are picked up.
    pub staging_dir: Option<PathBuf>,

    /// Progress callback fired per phase and per task. Default: `None`.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            download_results: false,
            result_dir: None,
            staging_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConvertConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertConfig")
            .field("poll", &self.poll)
            .field("download_results", &self.download_results)
            .field("result_dir", &self.result_dir)
            .field("staging_dir", &self.staging_dir)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ConvertConfig {
    /// Create a new builder for `ConvertConfig`.
    pub fn builder() -> ConvertConfigBuilder {
        ConvertConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConvertConfig`].
#[derive(Debug)]
pub struct ConvertConfigBuilder {
    config: ConvertConfig,
}

impl ConvertConfigBuilder {
    pub fn poll(mut self, policy: PollPolicy) -> Self {
        self.config.poll = policy;
        self
    }

    pub fn download_results(mut self, v: bool) -> Self {
        self.config.download_results = v;
        self
    }

    pub fn result_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.result_dir = Some(dir.into());
        self
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConvertConfig, ConvertError> {
        let c = &self.config;
        if c.poll.max_attempts == Some(0) {
            return Err(ConvertError::InvalidConfig(
                "Poll max_attempts must be ≥ 1 when set".into(),
            ));
        }
        if c.poll.backoff_multiplier < 1.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "Poll backoff multiplier must be ≥ 1.0, got {}",
                c.poll.backoff_multiplier
            )));
        }
        Ok(self.config)
    }
}
