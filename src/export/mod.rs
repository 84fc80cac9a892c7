//! Data repository export: copy the shared filesystem back to S3 and wait for it
//!
//! The export is an asynchronous FSx task. The handler creates it, remembers the
//! task id the service hands back, and polls that specific task until it reaches a
//! terminal state.

mod fsx;

pub use fsx::FsxExportService;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{HandlerError, Result};

/// Default wait between two status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default poll budget, sized to fit inside the 180 s handler timeout
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 34;

/// Lifecycle of a data repository task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskLifecycle {
    Pending,
    Executing,
    Canceling,
    Canceled,
    Failed,
    Succeeded,
    /// Value the service reported that this crate does not know about
    Other(String),
}

impl TaskLifecycle {
    /// Parse the service's upper-case lifecycle string
    pub fn parse(value: &str) -> Self {
        match value {
            "PENDING" => TaskLifecycle::Pending,
            "EXECUTING" => TaskLifecycle::Executing,
            "CANCELING" => TaskLifecycle::Canceling,
            "CANCELED" => TaskLifecycle::Canceled,
            "FAILED" => TaskLifecycle::Failed,
            "SUCCEEDED" => TaskLifecycle::Succeeded,
            other => TaskLifecycle::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskLifecycle::Pending => "PENDING",
            TaskLifecycle::Executing => "EXECUTING",
            TaskLifecycle::Canceling => "CANCELING",
            TaskLifecycle::Canceled => "CANCELED",
            TaskLifecycle::Failed => "FAILED",
            TaskLifecycle::Succeeded => "SUCCEEDED",
            TaskLifecycle::Other(value) => value,
        }
    }

    /// Terminal states that mean the export will never succeed
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskLifecycle::Failed | TaskLifecycle::Canceled)
    }
}

impl fmt::Display for TaskLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of an export task as reported by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTask {
    pub task_id: String,
    pub lifecycle: TaskLifecycle,
    pub failure_message: Option<String>,
}

/// Access to the filesystem's data repository task API
#[async_trait]
pub trait ExportService: Send + Sync {
    /// Start an export of `paths` on the given filesystem to its linked bucket
    async fn create_export_task(&self, file_system_id: &str, paths: &[String]) -> Result<ExportTask>;

    /// Look up one task by id; `None` when the service does not return it
    async fn describe_task(&self, file_system_id: &str, task_id: &str) -> Result<Option<ExportTask>>;
}

/// How long and how often to wait for an export
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits forever on non-terminal states
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }

    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::bounded(DEFAULT_POLL_INTERVAL, DEFAULT_MAX_POLL_ATTEMPTS)
    }
}

/// Trigger an export of `path` and return the created task
pub async fn trigger_export<E>(service: &E, file_system_id: &str, path: &str) -> Result<ExportTask>
where
    E: ExportService + ?Sized,
{
    let task = service
        .create_export_task(file_system_id, &[path.to_string()])
        .await?;
    info!(
        "Started export task {} for {} on {} ({})",
        task.task_id, path, file_system_id, task.lifecycle
    );
    Ok(task)
}

/// Poll `task_id` until it succeeds, fails, or the attempt budget runs out
pub async fn wait_for_export<E>(
    service: &E,
    file_system_id: &str,
    task_id: &str,
    policy: PollPolicy,
) -> Result<ExportTask>
where
    E: ExportService + ?Sized,
{
    let mut attempts: u32 = 0;
    loop {
        let task = service
            .describe_task(file_system_id, task_id)
            .await?
            .ok_or_else(|| HandlerError::ExportTaskMissing {
                task_id: task_id.to_string(),
                file_system_id: file_system_id.to_string(),
            })?;
        attempts += 1;

        if task.lifecycle == TaskLifecycle::Succeeded {
            info!("Export task {} succeeded after {} polls", task_id, attempts);
            return Ok(task);
        }

        if task.lifecycle.is_failure() {
            return Err(HandlerError::ExportFailed {
                task_id: task.task_id,
                lifecycle: task.lifecycle,
                failure_message: task.failure_message,
            });
        }

        if let Some(max_attempts) = policy.max_attempts {
            if attempts >= max_attempts {
                return Err(HandlerError::ExportTimedOut {
                    task_id: task.task_id,
                    attempts,
                    lifecycle: task.lifecycle,
                });
            }
        }

        debug!(
            "Export task {} is {} (poll {}), sleeping {:?}",
            task_id, task.lifecycle, attempts, policy.interval
        );
        tokio::time::sleep(policy.interval).await;
    }
}
