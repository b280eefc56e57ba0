//! Progress-callback trait for batch workflow events.
//!
//! Inject an `Arc<dyn BatchProgressCallback>` via
//! [`crate::config::ConvertConfigBuilder::progress_callback`] to receive
//! events as the orchestrator moves through its three phases: submitting
//! inputs, waiting for conversions, downloading results.
//!
//! The callback approach keeps the library ignorant of how the host
//! application renders progress — the CLI draws terminal bars, a service
//! might update a job record. All methods have default no-op
//! implementations so callers only override what they care about. The
//! workflow is single-threaded, but the trait is `Send + Sync` so one
//! callback can be shared across batches.

use std::path::Path;
use std::sync::Arc;

/// Called by the orchestrators as the batch advances.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any input is uploaded or submitted.
    fn on_submit_start(&self, total: usize) {
        let _ = total;
    }

    /// Called after each input is accepted by the service.
    ///
    /// `submitted` is 1-based; `task_id` is the identifier the service issued.
    fn on_task_submitted(&self, submitted: usize, total: usize, task_id: &str) {
        let _ = (submitted, total, task_id);
    }

    /// Called once before status polling begins.
    fn on_convert_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when a task reaches its terminal state.
    ///
    /// `state` is the service's label ("SUCCESS", "FAILURE", …) — reaching
    /// this callback means polling finished, not that conversion succeeded.
    fn on_task_done(&self, done: usize, total: usize, task_id: &str, state: &str) {
        let _ = (done, total, task_id, state);
    }

    /// Called once before any result package is fetched. Only fires in
    /// download mode.
    fn on_download_start(&self, total: usize) {
        let _ = total;
    }

    /// Called after each artifact is written to disk.
    fn on_artifact_downloaded(&self, downloaded: usize, total: usize, path: &Path) {
        let _ = (downloaded, total, path);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopBatchProgress;

impl BatchProgressCallback for NoopBatchProgress {}

/// Convenience alias matching the type stored in [`crate::config::ConvertConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
