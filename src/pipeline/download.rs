//! Download stage: fetch result packages into numbered local archives.
//!
//! Files are named `json_{n:06}.zip` with a 1-based counter that follows
//! URL iteration order, independent of which task produced each URL. No
//! deduplication and no integrity check — the archives are opaque to this
//! client.

use crate::api::ConversionService;
use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Build the artifact filename for the `n`-th URL (1-based).
pub(crate) fn artifact_name(n: usize) -> String {
    format!("json_{n:06}.zip")
}

/// Fetch every URL, in order, into `dest_dir`. Returns the written paths.
pub async fn download_all(
    service: &Arc<dyn ConversionService>,
    urls: &[String],
    dest_dir: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<PathBuf>, ConvertError> {
    let total = urls.len();
    if let Some(cb) = progress {
        cb.on_download_start(total);
    }

    let mut paths = Vec::with_capacity(total);
    for (i, url) in urls.iter().enumerate() {
        let content = service.fetch_package(url).await?;
        let path = dest_dir.join(artifact_name(i + 1));
        tokio::fs::write(&path, &content)
            .await
            .map_err(|e| ConvertError::OutputWrite {
                path: path.clone(),
                source: e,
            })?;
        debug!("Wrote {} ({} bytes)", path.display(), content.len());
        if let Some(cb) = progress {
            cb.on_artifact_downloaded(i + 1, total, &path);
        }
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PackageList, ProjectContext, TaskStatus, UploadSlot, UploadTarget};
    use crate::pipeline::submit::ConversionPayload;
    use async_trait::async_trait;

    /// Serves each URL's own bytes back, so the test can check file contents.
    struct EchoFetcher;

    #[async_trait]
    impl ConversionService for EchoFetcher {
        async fn project_defaults(&self, _: &str) -> Result<ProjectContext, ConvertError> {
            unimplemented!()
        }
        async fn create_scratch_file(
            &self,
            _: &str,
            _: &str,
        ) -> Result<UploadSlot, ConvertError> {
            unimplemented!()
        }
        async fn upload_scratch_file(
            &self,
            _: &UploadTarget,
            _: &str,
            _: Vec<u8>,
        ) -> Result<(), ConvertError> {
            unimplemented!()
        }
        async fn submit_conversion(
            &self,
            _: &ProjectContext,
            _: &ConversionPayload,
        ) -> Result<String, ConvertError> {
            unimplemented!()
        }
        async fn task_status(
            &self,
            _: &ProjectContext,
            _: &str,
        ) -> Result<TaskStatus, ConvertError> {
            unimplemented!()
        }
        async fn task_result(
            &self,
            _: &ProjectContext,
            _: &str,
        ) -> Result<PackageList, ConvertError> {
            unimplemented!()
        }
        async fn fetch_package(&self, url: &str) -> Result<Vec<u8>, ConvertError> {
            Ok(url.as_bytes().to_vec())
        }
    }

    #[test]
    fn artifact_names_are_zero_padded() {
        assert_eq!(artifact_name(1), "json_000001.zip");
        assert_eq!(artifact_name(42), "json_000042.zip");
        assert_eq!(artifact_name(123_456), "json_123456.zip");
    }

    #[tokio::test]
    async fn downloads_follow_url_order() {
        let service: Arc<dyn ConversionService> = Arc::new(EchoFetcher);
        let dir = tempfile::tempdir().unwrap();
        let urls: Vec<String> = (1..=3).map(|i| format!("https://s/pkg{i}.zip")).collect();

        let paths = download_all(&service, &urls, dir.path(), None).await.unwrap();

        assert_eq!(paths.len(), 3);
        for (i, path) in paths.iter().enumerate() {
            assert_eq!(
                path.file_name().unwrap().to_str().unwrap(),
                artifact_name(i + 1)
            );
            let content = std::fs::read(path).unwrap();
            assert_eq!(content, urls[i].as_bytes());
        }
    }

    #[tokio::test]
    async fn no_urls_writes_no_files() {
        let service: Arc<dyn ConversionService> = Arc::new(EchoFetcher);
        let dir = tempfile::tempdir().unwrap();
        let paths = download_all(&service, &[], dir.path(), None).await.unwrap();
        assert!(paths.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
