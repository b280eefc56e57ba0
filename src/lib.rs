//! # doc2json
//!
//! Batch-convert documents to structured JSON through a remote
//! document-processing service.
//!
//! ## What this crate does
//!
//! The heavy lifting — parsing PDFs, OCR, layout analysis — happens on the
//! remote service. This crate is the batch client around it: it uploads
//! local archives to scratch storage, submits conversion requests, polls
//! the asynchronous tasks to completion, and (in download mode) fetches the
//! result packages into numbered local archives with a completion report.
//!
//! ## Workflow Overview
//!
//! ```text
//! inputs (zips / URLs)
//!  │
//!  ├─ 1. Discover  collect .zip inputs (file, directory, staged tmpzip/)
//!  ├─ 2. Upload    scratch slot + multipart POST → private retrieval URL
//!  ├─ 3. Submit    fixed-shape request → task id per document
//!  ├─ 4. Poll      sequential status queries, PollPolicy cadence
//!  ├─ 5. Locate    package URLs per completed task   (download mode)
//!  └─ 6. Download  json_000001.zip … + report.json   (download mode)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2json::{convert_urls, ConvertConfig, ConversionService, HttpConversionService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service: Arc<dyn ConversionService> =
//!         Arc::new(HttpConversionService::new("https://convert.example.com", Some("sk-…"))?);
//!
//!     let config = ConvertConfig::builder().download_results(true).build()?;
//!     let urls = vec!["https://arxiv.org/pdf/1706.03762".to_string()];
//!
//!     let result = convert_urls(&service, "my-project", &urls, &config).await?;
//!     for (task_id, status) in result.records() {
//!         println!("{task_id}: {status}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The service handle is always passed explicitly — there is no implicit
//! client constructed from the environment, and tests inject an in-process
//! fake through the same [`ConversionService`] trait.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2json` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! doc2json = { version = "0.1", default-features = false }
//! ```
//!
//! ## A note on polling
//!
//! Tasks are polled strictly sequentially, and a stalled service stalls the
//! batch unless [`PollPolicy::max_attempts`] is set. The default cadence is
//! a bounded interval with mild backoff; [`PollPolicy::legacy`] restores the
//! historical zero-delay busy-loop for strict compatibility.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{
    ConversionService, HttpConversionService, PackageList, ProjectContext, ResultPackage,
    TaskStatus, UploadSlot, UploadTarget,
};
pub use config::{ConvertConfig, ConvertConfigBuilder, PollPolicy};
pub use convert::{convert_files, convert_files_sync, convert_urls, convert_urls_sync};
pub use error::ConvertError;
pub use output::{BatchSource, ConversionResult};
pub use progress::{BatchProgressCallback, NoopBatchProgress, ProgressCallback};
pub use report::{BatchReport, TaskRow};
