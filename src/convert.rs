//! Batch orchestration entry points.
//!
//! Two flows share everything downstream of submission:
//!
//! * [`convert_files`] — discover local `.zip` inputs, upload each to
//!   scratch storage, submit the private retrieval URLs.
//! * [`convert_urls`] — submit remote URLs as-is.
//!
//! Both resolve the project context exactly once, submit sequentially, poll
//! every task to completion, and return a [`ConversionResult`] whose
//! `task_ids` and `statuses` are index-aligned. When
//! [`ConvertConfig::download_results`] is set, the completed batch is
//! additionally located, downloaded into the result directory, and
//! summarised in a completion report.
//!
//! Per-task lifecycle: created → submitted → pending → done. There is no
//! separate failed branch — a conversion that failed is a task that is done
//! with a failure *state*, and it stays in the batch.

use crate::api::{ConversionService, ProjectContext};
use crate::config::ConvertConfig;
use crate::error::ConvertError;
use crate::output::{BatchSource, ConversionResult};
use crate::pipeline::{download, input, result, status, submit, upload};
use crate::report;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Convert a local `.zip` file, or a directory of them, through the remote
/// service.
///
/// Files staged by the external batching step under
/// `<staging_root>/tmpzip/` are picked up alongside the caller's own zips;
/// see [`ConvertConfig::staging_dir`].
///
/// # Errors
/// Any upload, submission, or polling failure aborts the batch and is
/// returned as-is. An input path that exists but contains no zips is not an
/// error — the result simply carries no tasks.
pub async fn convert_files(
    service: &Arc<dyn ConversionService>,
    proj_key: &str,
    source: impl AsRef<Path>,
    config: &ConvertConfig,
) -> Result<ConversionResult, ConvertError> {
    let source = source.as_ref();
    let started = Instant::now();
    info!("Starting batch conversion of '{}'", source.display());

    let ctx = service.project_defaults(proj_key).await?;

    // The staging root must outlive discovery and upload; when the caller
    // didn't provide one, a throwaway temp dir stands in.
    let tmp_staging;
    let staging_root: &Path = match &config.staging_dir {
        Some(dir) => dir,
        None => {
            tmp_staging = tempfile::tempdir()
                .map_err(|e| ConvertError::Internal(format!("creating staging dir: {e}")))?;
            tmp_staging.path()
        }
    };

    let files = input::discover_zip_inputs(source, Some(staging_root))?;
    if files.is_empty() {
        warn!("No .zip inputs under '{}'; nothing to submit", source.display());
    }

    if let Some(cb) = &config.progress_callback {
        cb.on_submit_start(files.len());
    }

    let mut task_ids = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        let retrieval_url = upload::upload_file(service, proj_key, file).await?;
        let task_id = submit::submit_url(service, &ctx, &retrieval_url).await?;
        if let Some(cb) = &config.progress_callback {
            cb.on_task_submitted(i + 1, files.len(), &task_id);
        }
        task_ids.push(task_id);
    }
    check_unique(&task_ids);

    let statuses = status::poll_tasks(
        service,
        &ctx,
        &task_ids,
        &config.poll,
        config.progress_callback.as_ref(),
    )
    .await?;

    let result = ConversionResult {
        proj_key: proj_key.to_string(),
        task_ids,
        statuses,
        source: BatchSource::File(source.to_path_buf()),
        artifacts: Vec::new(),
    };
    info!(
        "Batch of {} task(s) finished polling in {}ms",
        result.task_ids.len(),
        started.elapsed().as_millis()
    );

    finish_batch(service, &ctx, result, config).await
}

/// Convert remote documents by URL through the remote service.
///
/// # Errors
/// Any submission or polling failure aborts the batch and is returned
/// as-is.
pub async fn convert_urls(
    service: &Arc<dyn ConversionService>,
    proj_key: &str,
    urls: &[String],
    config: &ConvertConfig,
) -> Result<ConversionResult, ConvertError> {
    let started = Instant::now();
    info!("Starting batch conversion of {} URL(s)", urls.len());

    let ctx = service.project_defaults(proj_key).await?;

    if let Some(cb) = &config.progress_callback {
        cb.on_submit_start(urls.len());
    }

    let mut task_ids = Vec::with_capacity(urls.len());
    for (i, url) in urls.iter().enumerate() {
        let task_id = submit::submit_url(service, &ctx, url).await?;
        if let Some(cb) = &config.progress_callback {
            cb.on_task_submitted(i + 1, urls.len(), &task_id);
        }
        task_ids.push(task_id);
    }
    check_unique(&task_ids);

    let statuses = status::poll_tasks(
        service,
        &ctx,
        &task_ids,
        &config.poll,
        config.progress_callback.as_ref(),
    )
    .await?;

    let result = ConversionResult {
        proj_key: proj_key.to_string(),
        task_ids,
        statuses,
        source: BatchSource::Urls(urls.to_vec()),
        artifacts: Vec::new(),
    };
    info!(
        "Batch of {} task(s) finished polling in {}ms",
        result.task_ids.len(),
        started.elapsed().as_millis()
    );

    finish_batch(service, &ctx, result, config).await
}

/// Synchronous wrapper around [`convert_files`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_files_sync(
    service: &Arc<dyn ConversionService>,
    proj_key: &str,
    source: impl AsRef<Path>,
    config: &ConvertConfig,
) -> Result<ConversionResult, ConvertError> {
    runtime()?.block_on(convert_files(service, proj_key, source, config))
}

/// Synchronous wrapper around [`convert_urls`].
pub fn convert_urls_sync(
    service: &Arc<dyn ConversionService>,
    proj_key: &str,
    urls: &[String],
    config: &ConvertConfig,
) -> Result<ConversionResult, ConvertError> {
    runtime()?.block_on(convert_urls(service, proj_key, urls, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn runtime() -> Result<tokio::runtime::Runtime, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {e}")))
}

/// Task identifiers within a batch must be unique; the service owns them,
/// so a duplicate is worth a loud warning but not an abort.
fn check_unique(task_ids: &[String]) {
    let mut seen = HashSet::new();
    for id in task_ids {
        if !seen.insert(id.as_str()) {
            warn!("Service issued duplicate task id '{}' within one batch", id);
        }
    }
}

/// Run the download phase when the caller asked for it: locate package
/// URLs, fetch them into the result directory, write the report.
async fn finish_batch(
    service: &Arc<dyn ConversionService>,
    ctx: &ProjectContext,
    mut result: ConversionResult,
    config: &ConvertConfig,
) -> Result<ConversionResult, ConvertError> {
    if !config.download_results {
        return Ok(result);
    }

    let result_dir = prepare_result_dir(config)?;
    let urls = result::locate_results(service, ctx, &result.task_ids).await?;
    result.artifacts = download::download_all(
        service,
        &urls,
        &result_dir,
        config.progress_callback.as_ref(),
    )
    .await?;
    report::write_report(&result, &result_dir)?;
    Ok(result)
}

/// Resolve and create the result directory: the configured one, or a fresh
/// `results_<unix-secs>` under the current working directory.
fn prepare_result_dir(config: &ConvertConfig) -> Result<PathBuf, ConvertError> {
    let dir = match &config.result_dir {
        Some(dir) => dir.clone(),
        None => {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            PathBuf::from(format!("results_{secs}"))
        }
    };
    std::fs::create_dir_all(&dir).map_err(|e| ConvertError::OutputWrite {
        path: dir.clone(),
        source: e,
    })?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_result_dir_uses_configured_path() {
        let tmp = tempfile::tempdir().unwrap();
        let wanted = tmp.path().join("out/converted");
        let config = ConvertConfig::builder()
            .result_dir(&wanted)
            .build()
            .unwrap();
        let dir = prepare_result_dir(&config).unwrap();
        assert_eq!(dir, wanted);
        assert!(dir.is_dir());
    }

    #[test]
    fn check_unique_tolerates_duplicates() {
        // warns, never panics
        check_unique(&["t1".to_string(), "t1".to_string()]);
        check_unique(&[]);
    }
}
