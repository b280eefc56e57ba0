//! Result stage: collect the output package URLs of completed tasks.
//!
//! A task may yield zero or more packages — the service can split large
//! outputs, and a failed conversion yields none. An empty package list is a
//! tolerated condition (logged, batch continues), unlike an HTTP failure of
//! the result query itself, which aborts the batch.

use crate::api::{ConversionService, ProjectContext};
use crate::error::ConvertError;
use std::sync::Arc;
use tracing::warn;

/// Gather package URLs for every task, in task order.
///
/// The returned list is flat: a task contributing two packages occupies two
/// consecutive slots, a task contributing none occupies none.
pub async fn locate_results(
    service: &Arc<dyn ConversionService>,
    ctx: &ProjectContext,
    task_ids: &[String],
) -> Result<Vec<String>, ConvertError> {
    let mut urls = Vec::new();
    for task_id in task_ids {
        let list = service.task_result(ctx, task_id).await?;
        if list.packages.is_empty() {
            warn!(
                "Task '{}' returned an empty package list; no output to download",
                task_id
            );
            continue;
        }
        urls.extend(list.packages.into_iter().map(|p| p.url));
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PackageList, ResultPackage, TaskStatus, UploadSlot, UploadTarget};
    use crate::pipeline::submit::ConversionPayload;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct ScriptedResults {
        packages: HashMap<String, Vec<String>>,
    }

    impl ScriptedResults {
        fn new(entries: &[(&str, &[&str])]) -> Arc<dyn ConversionService> {
            Arc::new(Self {
                packages: entries
                    .iter()
                    .map(|(id, urls)| {
                        (id.to_string(), urls.iter().map(|u| u.to_string()).collect())
                    })
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl ConversionService for ScriptedResults {
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
            task_id: &str,
        ) -> Result<PackageList, ConvertError> {
            match self.packages.get(task_id) {
                Some(urls) => Ok(PackageList {
                    packages: urls.iter().map(|u| ResultPackage { url: u.clone() }).collect(),
                }),
                None => Err(ConvertError::ResultRetrieval {
                    task_id: task_id.to_string(),
                    detail: "HTTP 404 Not Found".into(),
                }),
            }
        }
        async fn fetch_package(&self, _: &str) -> Result<Vec<u8>, ConvertError> {
            unimplemented!()
        }
    }

    fn ctx() -> ProjectContext {
        ProjectContext {
            ccs_proj_key: "ccs-1".into(),
            collection_name: "_default".into(),
        }
    }

    #[tokio::test]
    async fn empty_package_list_contributes_zero_urls() {
        let service = ScriptedResults::new(&[("t1", &[])]);
        let urls = locate_results(&service, &ctx(), &["t1".to_string()])
            .await
            .unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn packages_flatten_in_task_order() {
        let service = ScriptedResults::new(&[
            ("t1", &["https://s/1a.zip", "https://s/1b.zip"]),
            ("t2", &[]),
            ("t3", &["https://s/3.zip"]),
        ]);
        let ids: Vec<String> = ["t1", "t2", "t3"].iter().map(|s| s.to_string()).collect();
        let urls = locate_results(&service, &ctx(), &ids).await.unwrap();
        assert_eq!(urls, vec!["https://s/1a.zip", "https://s/1b.zip", "https://s/3.zip"]);
    }

    #[tokio::test]
    async fn query_failure_aborts_the_batch() {
        let service = ScriptedResults::new(&[("t1", &["https://s/1.zip"])]);
        let ids: Vec<String> = ["t1", "missing"].iter().map(|s| s.to_string()).collect();
        let err = locate_results(&service, &ctx(), &ids).await;
        assert!(matches!(err, Err(ConvertError::ResultRetrieval { .. })));
    }
}
