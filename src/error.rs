//! Error types for the doc2json library.
//!
//! Every failure in the batch workflow is fatal to the operation that hit it
//! — there are no automatic retries anywhere. The one tolerated condition,
//! a task whose result carries an empty package list, is *not* an error:
//! the locator logs a diagnostic and contributes zero URLs (see
//! [`crate::pipeline::result`]).
//!
//! Note that a task finishing with a terminal state of `"FAILURE"` is also
//! not an error here: "done polling" and "conversion succeeded" are distinct.
//! The terminal state string is reported in
//! [`crate::output::ConversionResult::statuses`] and left to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the doc2json library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input file or directory does not exist.
    #[error("Input not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    // ── Service errors ────────────────────────────────────────────────────
    /// Resolving the project key to its internal project key and collection
    /// name failed.
    #[error("Failed to resolve project '{proj_key}': {detail}\nCheck your connection and try again.")]
    ProjectResolution { proj_key: String, detail: String },

    /// The scratch-file slot request or the binary upload returned a
    /// non-success status.
    #[error("Failed to upload '{path}': {detail}\nCheck your connection and try again.")]
    Upload { path: PathBuf, detail: String },

    /// The conversion submission returned a non-success status.
    #[error("Failed to submit '{url}' for conversion: {detail}\nCheck your connection and try again.")]
    Submission { url: String, detail: String },

    /// A response body did not have the expected shape.
    ///
    /// Most commonly: the submission response contained neither a `task_id`
    /// field nor a single-entry map to fall back on.
    #[error("Unexpected response while {context}: {detail}")]
    UnexpectedResponse { context: String, detail: String },

    /// A status query for an in-flight task failed outright.
    ///
    /// Distinct from a task *reporting* failure — that is a terminal state
    /// string, not an error.
    #[error("Failed to query status of task '{task_id}': {detail}\nCheck your connection and try again.")]
    StatusQuery { task_id: String, detail: String },

    /// Querying a completed task's result packages failed.
    #[error("Failed to retrieve results for task '{task_id}': {detail}\nCheck your connection and try again.")]
    ResultRetrieval { task_id: String, detail: String },

    /// Fetching a result package URL failed.
    #[error("Failed to download '{url}': {detail}\nCheck your connection and try again.")]
    Download { url: String, detail: String },

    /// A task did not reach `done` within the configured attempt cap.
    ///
    /// Only possible when [`crate::config::PollPolicy::max_attempts`] is set;
    /// the default policy polls until the service reports completion.
    #[error("Task '{task_id}' still pending after {attempts} status queries\nRaise the poll attempt limit or check the service.")]
    PollTimeout { task_id: String, attempts: u32 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write a downloaded artifact or the completion report.
    #[error("Failed to write '{path}': {source}")]
    OutputWrite {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_display_carries_hint() {
        let e = ConvertError::Upload {
            path: PathBuf::from("batch_01.zip"),
            detail: "HTTP 503 Service Unavailable".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("batch_01.zip"), "got: {msg}");
        assert!(msg.contains("Check your connection"), "got: {msg}");
    }

    #[test]
    fn poll_timeout_display() {
        let e = ConvertError::PollTimeout {
            task_id: "a1b2".into(),
            attempts: 30,
        };
        assert!(e.to_string().contains("a1b2"));
        assert!(e.to_string().contains("30"));
    }

    #[test]
    fn project_resolution_display() {
        let e = ConvertError::ProjectResolution {
            proj_key: "proj-42".into(),
            detail: "HTTP 404 Not Found".into(),
        };
        assert!(e.to_string().contains("proj-42"));
        assert!(e.to_string().contains("404"));
    }

    #[test]
    fn output_write_preserves_source() {
        use std::error::Error;
        let e = ConvertError::OutputWrite {
            path: PathBuf::from("results/json_000001.zip"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
    }
}
