//! Result types returned by the orchestrators.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a batch was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchSource {
    /// A local `.zip` file or a directory of them.
    File(PathBuf),
    /// Remote document URLs submitted as-is.
    Urls(Vec<String>),
}

/// The outcome of one orchestrator call.
///
/// `task_ids` and `statuses` are index-aligned: `statuses[i]` is the
/// terminal state the service reported for `task_ids[i]`. A status of
/// `"SUCCESS"` or `"FAILURE"` (or any other service-defined label) means the
/// task finished polling — it does not by itself mean the conversion
/// produced output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// The caller-facing project key the batch ran under.
    pub proj_key: String,
    /// Task identifiers in submission order.
    pub task_ids: Vec<String>,
    /// Terminal states, aligned with `task_ids`.
    pub statuses: Vec<String>,
    /// The inputs this batch was built from.
    pub source: BatchSource,
    /// Local paths of downloaded artifacts. Empty unless the orchestrator
    /// ran with `download_results` set.
    pub artifacts: Vec<PathBuf>,
}

impl ConversionResult {
    /// Iterate `(task_id, status)` pairs in submission order.
    pub fn records(&self) -> impl Iterator<Item = (&str, &str)> {
        self.task_ids
            .iter()
            .map(String::as_str)
            .zip(self.statuses.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_zip_in_order() {
        let result = ConversionResult {
            proj_key: "p1".into(),
            task_ids: vec!["t1".into(), "t2".into()],
            statuses: vec!["SUCCESS".into(), "FAILURE".into()],
            source: BatchSource::Urls(vec!["https://example.com/a.pdf".into()]),
            artifacts: vec![],
        };
        let pairs: Vec<_> = result.records().collect();
        assert_eq!(pairs, vec![("t1", "SUCCESS"), ("t2", "FAILURE")]);
    }

    #[test]
    fn serialises_to_json() {
        let result = ConversionResult {
            proj_key: "p1".into(),
            task_ids: vec!["t1".into()],
            statuses: vec!["SUCCESS".into()],
            source: BatchSource::File(PathBuf::from("docs.zip")),
            artifacts: vec![PathBuf::from("results/json_000001.zip")],
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: ConversionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.task_ids, result.task_ids);
        assert_eq!(back.statuses, result.statuses);
    }
}
