//! Submission stage: build the conversion request and submit one URL.
//!
//! The payload shape is fixed by the service contract: the source is always
//! a URL (local files are uploaded first and submitted by their private
//! retrieval URL), the target is always a zip of JSON documents with cell
//! data included, and the source document is never kept in the collection
//! afterwards.

use crate::api::{ConversionService, ProjectContext};
use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Conversion request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionPayload {
    pub source: PayloadSource,
    pub context: PayloadContext,
    pub target: PayloadTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub download_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadContext {
    pub collection_name: String,
    pub keep_documents: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadTarget {
    #[serde(rename = "type")]
    pub kind: String,
    pub content_type: String,
    pub add_cells: bool,
}

/// Build the request body for converting `download_url` into the given
/// collection.
pub fn make_payload(download_url: &str, collection_name: &str) -> ConversionPayload {
    ConversionPayload {
        source: PayloadSource {
            kind: "url".into(),
            download_url: download_url.into(),
        },
        context: PayloadContext {
            collection_name: collection_name.into(),
            keep_documents: false,
        },
        target: PayloadTarget {
            kind: "zip".into(),
            content_type: "json".into(),
            add_cells: true,
        },
    }
}

/// Submit one retrieval URL for conversion; returns the task identifier.
///
/// The project context is resolved once per batch by the orchestrator and
/// reused here — submission never re-resolves it. Failures are logged with
/// the submitted URL before propagating.
pub async fn submit_url(
    service: &Arc<dyn ConversionService>,
    ctx: &ProjectContext,
    url: &str,
) -> Result<String, ConvertError> {
    let payload = make_payload(url, &ctx.collection_name);
    match service.submit_conversion(ctx, &payload).await {
        Ok(task_id) => Ok(task_id),
        Err(e) => {
            error!("Submission of '{}' failed: {}", url, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_target_shape_is_fixed() {
        let p = make_payload("https://example.com/doc.pdf", "_default");
        assert_eq!(p.target.kind, "zip");
        assert_eq!(p.target.content_type, "json");
        assert!(p.target.add_cells);
        assert!(!p.context.keep_documents);
    }

    #[test]
    fn payload_carries_source_and_collection() {
        let p = make_payload("https://example.com/doc.pdf", "papers");
        assert_eq!(p.source.kind, "url");
        assert_eq!(p.source.download_url, "https://example.com/doc.pdf");
        assert_eq!(p.context.collection_name, "papers");
    }

    #[test]
    fn payload_serialises_with_type_keys() {
        let p = make_payload("https://example.com/doc.pdf", "_default");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["source"]["type"], "url");
        assert_eq!(json["target"]["type"], "zip");
        // Booleans stay booleans on the wire.
        assert_eq!(json["context"]["keep_documents"], serde_json::json!(false));
        assert_eq!(json["target"]["add_cells"], serde_json::json!(true));
    }
}
