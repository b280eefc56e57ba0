//! Status stage: poll each task until the service reports completion.
//!
//! Tasks are polled strictly sequentially — task *i+1* is not queried until
//! task *i* is done — so total wall-clock time is the sum of the individual
//! completion latencies. That serialisation is inherited behaviour this
//! client preserves; what it does not preserve is the original cadence of
//! re-querying with zero delay, which is replaced by the injected
//! [`PollPolicy`] (see [`crate::config`]). A task that is already done
//! terminates after exactly one status query.

use crate::api::{ConversionService, ProjectContext, TaskStatus};
use crate::config::PollPolicy;
use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::sync::Arc;
use tracing::{debug, trace};

/// Poll every task to completion, in order, returning the terminal state
/// labels aligned with `task_ids`.
pub async fn poll_tasks(
    service: &Arc<dyn ConversionService>,
    ctx: &ProjectContext,
    task_ids: &[String],
    policy: &PollPolicy,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<String>, ConvertError> {
    let total = task_ids.len();
    if let Some(cb) = progress {
        cb.on_convert_start(total);
    }

    let mut statuses = Vec::with_capacity(total);
    for (i, task_id) in task_ids.iter().enumerate() {
        let status = poll_single(service, ctx, task_id, policy).await?;
        debug!("Task '{}' done: {}", task_id, status.state);
        if let Some(cb) = progress {
            cb.on_task_done(i + 1, total, task_id, &status.state);
        }
        statuses.push(status.state);
    }

    debug_assert_eq!(statuses.len(), task_ids.len());
    Ok(statuses)
}

/// Poll one task until its `done` flag is true.
async fn poll_single(
    service: &Arc<dyn ConversionService>,
    ctx: &ProjectContext,
    task_id: &str,
    policy: &PollPolicy,
) -> Result<TaskStatus, ConvertError> {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let status = service.task_status(ctx, task_id).await?;
        if status.done {
            return Ok(status);
        }
        trace!("Task '{}' still pending (query {})", task_id, attempt);

        if let Some(max) = policy.max_attempts {
            if attempt >= max {
                return Err(ConvertError::PollTimeout {
                    task_id: task_id.to_string(),
                    attempts: attempt,
                });
            }
        }

        let delay = policy.delay_after(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
