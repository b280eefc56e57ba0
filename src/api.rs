//! Service boundary: the [`ConversionService`] trait and its production
//! HTTP implementation.
//!
//! Every pipeline stage talks to the remote conversion service through a
//! `Arc<dyn ConversionService>` handle passed in explicitly by the caller —
//! there is no ambient default client constructed from the environment.
//! The explicit handle is what makes the whole workflow testable: the
//! integration suite swaps in an in-process fake and exercises the
//! orchestrators end-to-end without a network.
//!
//! The REST contract itself is an external collaborator and deliberately
//! thin here: the service returns task identifiers, `{done, state}` status
//! objects, and result package URLs, and this module does not model anything
//! beyond that.

use crate::error::ConvertError;
use crate::pipeline::submit::ConversionPayload;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

// ── Wire types ───────────────────────────────────────────────────────────

/// A project key resolved to the service's internal identifiers.
///
/// Fetched once per orchestrator call and reused for every task in the
/// batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    /// The service's internal project key, distinct from the caller-facing one.
    pub ccs_proj_key: String,
    /// Collection the converted documents are filed under.
    pub collection_name: String,
}

/// Where and how to perform the binary upload of a scratch file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTarget {
    /// Storage endpoint accepting the multipart POST.
    pub url: String,
    /// Form fields the storage endpoint requires alongside the file part.
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

/// A scratch-file upload slot issued by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSlot {
    /// Upload target for the binary leg.
    pub upload: UploadTarget,
    /// Private, time-limited URL from which the service can retrieve the
    /// uploaded file. This is what gets submitted for conversion.
    pub download_url: String,
}

/// Status of one conversion task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Completion flag. Polling stops when this turns true.
    pub done: bool,
    /// Service-defined terminal label ("SUCCESS", "FAILURE", …). Only
    /// meaningful once `done` is true; distinct from `done` itself.
    #[serde(default)]
    pub state: String,
}

/// One downloadable output artifact of a completed task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultPackage {
    pub url: String,
}

/// The packages a completed task produced. May be empty — the service can
/// decline to produce output for a failed conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageList {
    #[serde(default)]
    pub packages: Vec<ResultPackage>,
}

// ── Service trait ────────────────────────────────────────────────────────

/// The remote conversion service as seen by the pipeline stages.
///
/// Implementations must be `Send + Sync`; the production implementation is
/// [`HttpConversionService`]. All calls block (asynchronously) until the
/// underlying request completes; no method retries on failure.
#[async_trait]
pub trait ConversionService: Send + Sync {
    /// Resolve a caller-facing project key to the internal project key and
    /// collection name.
    async fn project_defaults(&self, proj_key: &str) -> Result<ProjectContext, ConvertError>;

    /// Request an upload slot for a scratch file, keyed by project and
    /// filename. The returned slot's retrieval URL is private and
    /// time-limited; the remote temporary object's lifetime is managed by
    /// the service.
    async fn create_scratch_file(
        &self,
        proj_key: &str,
        filename: &str,
    ) -> Result<UploadSlot, ConvertError>;

    /// Perform the binary upload leg: multipart POST of the slot's form
    /// fields plus the file content to the slot's storage endpoint.
    async fn upload_scratch_file(
        &self,
        target: &UploadTarget,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<(), ConvertError>;

    /// Submit a conversion request; returns the new task identifier.
    async fn submit_conversion(
        &self,
        ctx: &ProjectContext,
        payload: &ConversionPayload,
    ) -> Result<String, ConvertError>;

    /// Query the status of one task.
    async fn task_status(
        &self,
        ctx: &ProjectContext,
        task_id: &str,
    ) -> Result<TaskStatus, ConvertError>;

    /// Query the result packages of one completed task.
    async fn task_result(
        &self,
        ctx: &ProjectContext,
        task_id: &str,
    ) -> Result<PackageList, ConvertError>;

    /// Fetch one result package URL into memory.
    async fn fetch_package(&self, url: &str) -> Result<Vec<u8>, ConvertError>;
}

// ── HTTP implementation ──────────────────────────────────────────────────

/// `reqwest`-backed [`ConversionService`] implementation.
///
/// Two clients are held: an authenticated one for the service's control
/// plane, and a bare one for the transfer legs — upload targets and result
/// package URLs are presigned and carry their own credentials, so the
/// bearer token must not be sent to those hosts.
pub struct HttpConversionService {
    control: reqwest::Client,
    transfer: reqwest::Client,
    base_url: String,
}

impl HttpConversionService {
    /// Create a service client with default timeouts (30 s control requests,
    /// 300 s transfers).
    pub fn new(base_url: impl Into<String>, api_key: Option<&str>) -> Result<Self, ConvertError> {
        Self::with_timeouts(base_url, api_key, 30, 300)
    }

    /// Create a service client with explicit per-request timeouts.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        api_key: Option<&str>,
        request_timeout_secs: u64,
        transfer_timeout_secs: u64,
    ) -> Result<Self, ConvertError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| ConvertError::InvalidConfig(format!("API key is not a valid header value: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let control = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ConvertError::Internal(format!("Failed to build HTTP client: {e}")))?;

        let transfer = reqwest::Client::builder()
            .timeout(Duration::from_secs(transfer_timeout_secs))
            .build()
            .map_err(|e| ConvertError::Internal(format!("Failed to build HTTP client: {e}")))?;

        let base_url: String = base_url.into();
        Ok(Self {
            control,
            transfer,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Shape of the project-defaults response.
#[derive(Debug, Deserialize)]
struct ProjectDefaultsWire {
    ccs_project: CcsProjectWire,
}

#[derive(Debug, Deserialize)]
struct CcsProjectWire {
    proj_key: String,
    collection_name: String,
}

/// Shape of the scratch-file slot response.
#[derive(Debug, Deserialize)]
struct ScratchFileWire {
    upload: UploadTarget,
    download_private: PrivateUrlWire,
}

#[derive(Debug, Deserialize)]
struct PrivateUrlWire {
    url: String,
}

/// Pull the task identifier out of a submission response.
///
/// The documented contract is `{"task_id": "<id>"}`. Older service builds
/// return a single-entry map under a varying key, so when `task_id` is
/// absent the one value present is taken instead — a compatibility shim,
/// not a shape worth preserving once the old builds are gone.
fn extract_task_id(body: &serde_json::Value) -> Result<String, ConvertError> {
    if let Some(id) = body.get("task_id").and_then(|v| v.as_str()) {
        return Ok(id.to_string());
    }
    if let Some(map) = body.as_object() {
        if map.len() == 1 {
            if let Some(id) = map.values().next().and_then(|v| v.as_str()) {
                return Ok(id.to_string());
            }
        }
    }
    Err(ConvertError::UnexpectedResponse {
        context: "submitting a conversion".into(),
        detail: format!("no task identifier in response: {body}"),
    })
}

#[async_trait]
impl ConversionService for HttpConversionService {
    async fn project_defaults(&self, proj_key: &str) -> Result<ProjectContext, ConvertError> {
        let url = self.endpoint(&format!("/projects/{proj_key}/defaults"));
        let err = |detail: String| ConvertError::ProjectResolution {
            proj_key: proj_key.to_string(),
            detail,
        };

        let resp = self.control.get(&url).send().await.map_err(|e| err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(err(format!("HTTP {}", resp.status())));
        }
        let wire: ProjectDefaultsWire = resp.json().await.map_err(|e| err(e.to_string()))?;
        Ok(ProjectContext {
            ccs_proj_key: wire.ccs_project.proj_key,
            collection_name: wire.ccs_project.collection_name,
        })
    }

    async fn create_scratch_file(
        &self,
        proj_key: &str,
        filename: &str,
    ) -> Result<UploadSlot, ConvertError> {
        let url = self.endpoint(&format!("/projects/{proj_key}/scratch_files"));
        let err = |detail: String| ConvertError::Upload {
            path: Path::new(filename).to_path_buf(),
            detail,
        };

        let resp = self
            .control
            .post(&url)
            .json(&serde_json::json!({ "filename": filename }))
            .send()
            .await
            .map_err(|e| err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(err(format!("HTTP {}", resp.status())));
        }
        let wire: ScratchFileWire = resp.json().await.map_err(|e| err(e.to_string()))?;
        Ok(UploadSlot {
            upload: wire.upload,
            download_url: wire.download_private.url,
        })
    }

    async fn upload_scratch_file(
        &self,
        target: &UploadTarget,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<(), ConvertError> {
        let err = |detail: String| ConvertError::Upload {
            path: Path::new(filename).to_path_buf(),
            detail,
        };

        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &target.fields {
            form = form.text(name.clone(), value.clone());
        }
        form = form.part(
            "file",
            reqwest::multipart::Part::bytes(content).file_name(filename.to_string()),
        );

        let resp = self
            .transfer
            .post(&target.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(err(format!("HTTP {}", resp.status())));
        }
        debug!("Uploaded '{}' to scratch storage", filename);
        Ok(())
    }

    async fn submit_conversion(
        &self,
        ctx: &ProjectContext,
        payload: &ConversionPayload,
    ) -> Result<String, ConvertError> {
        let url = self.endpoint(&format!("/projects/{}/conversions", ctx.ccs_proj_key));
        let err = |detail: String| ConvertError::Submission {
            url: payload.source.download_url.clone(),
            detail,
        };

        let resp = self
            .control
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(err(format!("HTTP {}", resp.status())));
        }
        let body: serde_json::Value = resp.json().await.map_err(|e| err(e.to_string()))?;
        extract_task_id(&body)
    }

    async fn task_status(
        &self,
        ctx: &ProjectContext,
        task_id: &str,
    ) -> Result<TaskStatus, ConvertError> {
        let url = self.endpoint(&format!(
            "/projects/{}/conversions/{task_id}",
            ctx.ccs_proj_key
        ));
        let err = |detail: String| ConvertError::StatusQuery {
            task_id: task_id.to_string(),
            detail,
        };

        let resp = self.control.get(&url).send().await.map_err(|e| err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(err(format!("HTTP {}", resp.status())));
        }
        resp.json().await.map_err(|e| err(e.to_string()))
    }

    async fn task_result(
        &self,
        ctx: &ProjectContext,
        task_id: &str,
    ) -> Result<PackageList, ConvertError> {
        let url = self.endpoint(&format!(
            "/projects/{}/conversions/{task_id}/result",
            ctx.ccs_proj_key
        ));
        let err = |detail: String| ConvertError::ResultRetrieval {
            task_id: task_id.to_string(),
            detail,
        };

        let resp = self.control.get(&url).send().await.map_err(|e| err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(err(format!("HTTP {}", resp.status())));
        }
        resp.json().await.map_err(|e| err(e.to_string()))
    }

    async fn fetch_package(&self, url: &str) -> Result<Vec<u8>, ConvertError> {
        let err = |detail: String| ConvertError::Download {
            url: url.to_string(),
            detail,
        };

        let resp = self.transfer.get(url).send().await.map_err(|e| err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(err(format!("HTTP {}", resp.status())));
        }
        let bytes = resp.bytes().await.map_err(|e| err(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_task_id_prefers_named_field() {
        let body = json!({ "task_id": "abc-123" });
        assert_eq!(extract_task_id(&body).unwrap(), "abc-123");
    }

    #[test]
    fn extract_task_id_single_entry_fallback() {
        // Older builds key the id under an arbitrary name.
        let body = json!({ "conversion_task": "xyz-789" });
        assert_eq!(extract_task_id(&body).unwrap(), "xyz-789");
    }

    #[test]
    fn extract_task_id_rejects_ambiguous_map() {
        let body = json!({ "a": "1", "b": "2" });
        assert!(matches!(
            extract_task_id(&body),
            Err(ConvertError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn extract_task_id_rejects_non_string_value() {
        let body = json!({ "count": 7 });
        assert!(extract_task_id(&body).is_err());
    }

    #[test]
    fn package_list_tolerates_missing_field() {
        let list: PackageList = serde_json::from_str("{}").unwrap();
        assert!(list.packages.is_empty());
    }

    #[test]
    fn task_status_state_defaults_empty() {
        let st: TaskStatus = serde_json::from_str(r#"{"done": false}"#).unwrap();
        assert!(!st.done);
        assert_eq!(st.state, "");
    }

    #[test]
    fn base_url_trailing_slash_is_normalised() {
        let svc = HttpConversionService::new("https://api.example.com/", None).unwrap();
        assert_eq!(
            svc.endpoint("/projects/p1/defaults"),
            "https://api.example.com/projects/p1/defaults"
        );
    }
}
