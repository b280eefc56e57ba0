//! Completion report for download-mode runs.
//!
//! One `report.json` is written next to the downloaded artifacts: the
//! project key, where the batch came from, and a `(task_id, status)` row per
//! task. The report states what the service said — a `"FAILURE"` row is
//! recorded, not hidden.

use crate::error::ConvertError;
use crate::output::{BatchSource, ConversionResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the completion report inside the result directory.
pub const REPORT_FILE: &str = "report.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub proj_key: String,
    pub source: BatchSource,
    pub tasks: Vec<TaskRow>,
    pub artifacts: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRow {
    pub task_id: String,
    pub status: String,
}

/// Assemble the report rows from a finished batch.
pub fn build_report(result: &ConversionResult) -> BatchReport {
    BatchReport {
        proj_key: result.proj_key.clone(),
        source: result.source.clone(),
        tasks: result
            .records()
            .map(|(task_id, status)| TaskRow {
                task_id: task_id.to_string(),
                status: status.to_string(),
            })
            .collect(),
        artifacts: result.artifacts.clone(),
    }
}

/// Write `report.json` into `result_dir` and log the completion summary.
pub fn write_report(result: &ConversionResult, result_dir: &Path) -> Result<PathBuf, ConvertError> {
    let report = build_report(result);
    let path = result_dir.join(REPORT_FILE);
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| ConvertError::Internal(format!("serialising report: {e}")))?;
    std::fs::write(&path, json).map_err(|e| ConvertError::OutputWrite {
        path: path.clone(),
        source: e,
    })?;

    let shown = result_dir
        .canonicalize()
        .unwrap_or_else(|_| result_dir.to_path_buf());
    info!(
        "Batch processed successfully.\nResults: {}",
        shown.display()
    );
    Ok(path)
}
