//! FSx for Lustre implementation of [`ExportService`]

use async_trait::async_trait;
use aws_sdk_fsx::error::DisplayErrorContext;
use aws_sdk_fsx::types::{
    CompletionReport, DataRepositoryTask, DataRepositoryTaskFilter, DataRepositoryTaskFilterName,
    DataRepositoryTaskType,
};

use super::{ExportService, ExportTask, TaskLifecycle};
use crate::error::{HandlerError, Result};

const CREATE_TASK: &str = "fsx:CreateDataRepositoryTask";
const DESCRIBE_TASKS: &str = "fsx:DescribeDataRepositoryTasks";

/// Export service backed by the FSx data repository task API
#[derive(Debug, Clone)]
pub struct FsxExportService {
    client: aws_sdk_fsx::Client,
}

impl FsxExportService {
    pub fn new(client: aws_sdk_fsx::Client) -> Self {
        Self { client }
    }
}

fn to_export_task(task: &DataRepositoryTask) -> ExportTask {
    ExportTask {
        task_id: task.task_id().to_string(),
        lifecycle: TaskLifecycle::parse(task.lifecycle().as_str()),
        failure_message: task
            .failure_details()
            .and_then(|details| details.message())
            .map(str::to_string),
    }
}

#[async_trait]
impl ExportService for FsxExportService {
    async fn create_export_task(&self, file_system_id: &str, paths: &[String]) -> Result<ExportTask> {
        // completion reports go to the bucket; we only need the lifecycle
        let report = CompletionReport::builder()
            .enabled(false)
            .build();

        let output = self
            .client
            .create_data_repository_task()
            .r#type(DataRepositoryTaskType::Export)
            .file_system_id(file_system_id)
            .set_paths(Some(paths.to_vec()))
            .report(report)
            .send()
            .await
            .map_err(|error| {
                HandlerError::external(CREATE_TASK, DisplayErrorContext(&error).to_string())
            })?;

        output
            .data_repository_task()
            .map(to_export_task)
            .ok_or_else(|| HandlerError::external(CREATE_TASK, "response did not include a task"))
    }

    async fn describe_task(&self, file_system_id: &str, task_id: &str) -> Result<Option<ExportTask>> {
        let filter = DataRepositoryTaskFilter::builder()
            .name(DataRepositoryTaskFilterName::FileSystemId)
            .values(file_system_id)
            .build();

        let output = self
            .client
            .describe_data_repository_tasks()
            .task_ids(task_id)
            .filters(filter)
            .send()
            .await
            .map_err(|error| {
                HandlerError::external(DESCRIBE_TASKS, DisplayErrorContext(&error).to_string())
            })?;

        Ok(output
            .data_repository_tasks()
            .iter()
            .find(|task| task.task_id() == Some(task_id))
            .map(to_export_task))
    }
}
