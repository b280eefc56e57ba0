//! Upload stage: push one local file to scratch storage.
//!
//! The service hands out an upload slot keyed by project and filename; the
//! binary leg goes directly to the returned storage endpoint with the
//! returned form fields. The slot's private download URL is what the
//! submission stage sends on. The remote temporary object's lifetime is
//! managed by the service, not by this client.

use crate::api::ConversionService;
use crate::error::ConvertError;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Upload a single file and return its private retrieval URL.
///
/// No retry: a non-success response from either the slot request or the
/// binary upload is [`ConvertError::Upload`], fatal to the batch.
pub async fn upload_file(
    service: &Arc<dyn ConversionService>,
    proj_key: &str,
    path: &Path,
) -> Result<String, ConvertError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ConvertError::InputNotFound {
            path: path.to_path_buf(),
        })?;

    let content = tokio::fs::read(path).await.map_err(|e| ConvertError::Upload {
        path: path.to_path_buf(),
        detail: format!("reading file: {e}"),
    })?;

    let slot = service.create_scratch_file(proj_key, filename).await?;
    service
        .upload_scratch_file(&slot.upload, filename, content)
        .await?;

    debug!("'{}' uploaded, retrieval URL issued", path.display());
    Ok(slot.download_url)
}
