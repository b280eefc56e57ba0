//! CLI binary for doc2json.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConvertConfig`, renders batch progress with indicatif, and prints the
//! outcome.

use anyhow::{bail, Context, Result};
use clap::Parser;
use doc2json::{
    convert_files, convert_urls, BatchProgressCallback, ConversionService, ConvertConfig,
    HttpConversionService, PollPolicy, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar per workflow phase, replaced as the batch
/// moves from submission to conversion to download.
struct CliBatchProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliBatchProgress {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn start_phase(&self, prefix: &str, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:<20.bold} [{bar:42.green/238}] {pos:>3}/{len}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix(prefix.to_string());

        let mut slot = self.bar.lock().unwrap();
        if let Some(old) = slot.take() {
            old.finish_and_clear();
        }
        *slot = Some(bar);
    }

    fn advance(&self, pos: usize, msg: String) {
        if let Some(bar) = self.bar.lock().unwrap().as_ref() {
            bar.set_position(pos as u64);
            bar.set_message(msg);
        }
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl BatchProgressCallback for CliBatchProgress {
    fn on_submit_start(&self, total: usize) {
        self.start_phase("Submitting input:", total);
    }

    fn on_task_submitted(&self, submitted: usize, _total: usize, task_id: &str) {
        self.advance(submitted, format!("task {task_id}"));
    }

    fn on_convert_start(&self, total: usize) {
        self.start_phase("Converting input:", total);
    }

    fn on_task_done(&self, done: usize, _total: usize, _task_id: &str, state: &str) {
        self.advance(done, state.to_string());
    }

    fn on_download_start(&self, total: usize) {
        self.start_phase("Downloading result:", total);
    }

    fn on_artifact_downloaded(&self, downloaded: usize, _total: usize, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.advance(downloaded, name);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a zip of documents, download results into ./results_<ts>/
  doc2json --project 1234567890abcdef batch.zip

  # Convert every zip under a directory, results into a chosen directory
  doc2json --project 1234567890abcdef ./batches/ -o converted/

  # Convert online documents by URL
  doc2json --project 1234567890abcdef \
      --url https://arxiv.org/pdf/1706.03762 \
      --url https://arxiv.org/pdf/2010.11929

  # Submit and poll only, print the result object as JSON
  doc2json --project 1234567890abcdef batch.zip --submit-only --json

  # Reproduce the historical zero-delay polling
  doc2json --project 1234567890abcdef batch.zip --legacy-poll

ENVIRONMENT VARIABLES:
  DOC2JSON_API_URL   Base URL of the conversion service
  DOC2JSON_API_KEY   Bearer token for the service
  DOC2JSON_PROJECT   Default project key
  DOC2JSON_OUTPUT    Default result directory

The service performs the conversion; this tool uploads, submits, polls,
and downloads. A batch with a failed conversion still completes — check
the per-task status column in the final summary and report.json.
"#;

/// Batch-convert documents to structured JSON via a remote conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "doc2json",
    version,
    about = "Batch-convert documents to structured JSON via a remote conversion service",
    long_about = "Submit local .zip archives or document URLs to a remote conversion service, \
poll the asynchronous tasks to completion, and download the converted JSON packages.",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local .zip file, or a directory scanned recursively for *.zip.
    input: Option<PathBuf>,

    /// Remote document URL to convert (repeatable). Mutually exclusive with INPUT.
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// Project key the batch runs under.
    #[arg(short, long, env = "DOC2JSON_PROJECT")]
    project: String,

    /// Base URL of the conversion service.
    #[arg(long, env = "DOC2JSON_API_URL")]
    api_url: String,

    /// Bearer token for the conversion service.
    #[arg(long, env = "DOC2JSON_API_KEY")]
    api_key: Option<String>,

    /// Directory for downloaded results (default: ./results_<unix-secs>/).
    #[arg(short, long, env = "DOC2JSON_OUTPUT")]
    output: Option<PathBuf>,

    /// Staging root whose tmpzip/ subdirectory holds pre-batched zips.
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Delay before the second status query, in milliseconds.
    #[arg(long, default_value_t = 2_000)]
    poll_interval_ms: u64,

    /// Backoff multiplier applied after each pending response.
    #[arg(long, default_value_t = 1.5)]
    poll_backoff: f64,

    /// Upper bound on the inter-query delay, in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    poll_max_interval_ms: u64,

    /// Give up on a task after this many status queries.
    #[arg(long)]
    poll_max_attempts: Option<u32>,

    /// Zero-delay unbounded polling, as the historical client did it.
    #[arg(long, conflicts_with_all = ["poll_interval_ms", "poll_backoff", "poll_max_interval_ms"])]
    legacy_poll: bool,

    /// Stop after polling: no download, no report.
    #[arg(long)]
    submit_only: bool,

    /// Print the result object as JSON instead of the summary table.
    #[arg(long)]
    json: bool,

    /// Timeout for control-plane requests, in seconds.
    #[arg(long, default_value_t = 30)]
    request_timeout: u64,

    /// Timeout for upload/download transfers, in seconds.
    #[arg(long, default_value_t = 300)]
    transfer_timeout: u64,

    /// Disable progress bars.
    #[arg(long, env = "DOC2JSON_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2JSON_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Progress bars provide the feedback that matters; keep library logs
    // quiet while a bar is live unless the user asked for them.
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

    // ── Validate input selection ─────────────────────────────────────────
    if cli.input.is_some() && !cli.urls.is_empty() {
        bail!("Provide either a local INPUT path or --url, not both");
    }
    if cli.input.is_none() && cli.urls.is_empty() {
        bail!("Nothing to convert: provide a local INPUT path or at least one --url");
    }

    // ── Build service handle and config ──────────────────────────────────
    let service: Arc<dyn ConversionService> = Arc::new(
        HttpConversionService::with_timeouts(
            &cli.api_url,
            cli.api_key.as_deref(),
            cli.request_timeout,
            cli.transfer_timeout,
        )
        .context("Failed to build the service client")?,
    );

    let poll = if cli.legacy_poll {
        PollPolicy {
            max_attempts: cli.poll_max_attempts,
            ..PollPolicy::legacy()
        }
    } else {
        PollPolicy {
            interval_ms: cli.poll_interval_ms,
            backoff_multiplier: cli.poll_backoff,
            max_interval_ms: cli.poll_max_interval_ms,
            max_attempts: cli.poll_max_attempts,
        }
    };

    let cli_progress: Option<Arc<CliBatchProgress>> = if show_progress {
        Some(CliBatchProgress::new())
    } else {
        None
    };
    let progress: Option<ProgressCallback> = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn BatchProgressCallback>);

    let mut builder = ConvertConfig::builder()
        .poll(poll)
        .download_results(!cli.submit_only);
    if let Some(ref dir) = cli.output {
        builder = builder.result_dir(dir);
    }
    if let Some(ref dir) = cli.staging_dir {
        builder = builder.staging_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run the batch ────────────────────────────────────────────────────
    let result = if let Some(ref input) = cli.input {
        convert_files(&service, &cli.project, input, &config)
            .await
            .context("Batch conversion failed")?
    } else {
        convert_urls(&service, &cli.project, &cli.urls, &config)
            .await
            .context("Batch conversion failed")?
    };

    // Clear any bar still on screen before printing the summary.
    if let Some(cb) = cli_progress {
        cb.finish();
    }

    // ── Report outcome ───────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
        return Ok(());
    }

    if !cli.quiet {
        let failed = result
            .statuses
            .iter()
            .filter(|s| !s.eq_ignore_ascii_case("success"))
            .count();
        let ok = result.task_ids.len() - failed;

        for (task_id, status) in result.records() {
            let tick = if status.eq_ignore_ascii_case("success") {
                green("✓")
            } else {
                red("✗")
            };
            eprintln!("  {tick} {task_id}  {status}");
        }
        eprintln!(
            "{} {}/{} conversions succeeded",
            if failed == 0 { green("✔") } else { red("✘") },
            bold(&ok.to_string()),
            result.task_ids.len(),
        );
        if !result.artifacts.is_empty() {
            eprintln!(
                "   {} artifact(s) downloaded {}",
                result.artifacts.len(),
                dim(&format!(
                    "→ {}",
                    result.artifacts[0].parent().unwrap_or(Path::new(".")).display()
                )),
            );
        }
    }

    Ok(())
}
