//! Error types for the completion handler and the batch worker

use thiserror::Error;

use crate::export::TaskLifecycle;

/// Failures raised while handling a batch completion event
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Required setting missing or malformed at startup
    #[error("configuration error: {0}")]
    Config(String),

    /// A managed service rejected or failed a request
    #[error("{operation} failed: {message}")]
    ExternalService {
        operation: &'static str,
        message: String,
    },

    /// Export task reached a terminal state other than SUCCEEDED
    #[error("export task {task_id} ended in {lifecycle}{}", failure_suffix(.failure_message))]
    ExportFailed {
        task_id: String,
        lifecycle: TaskLifecycle,
        failure_message: Option<String>,
    },

    /// Export task still not finished after the configured number of polls
    #[error("export task {task_id} not finished after {attempts} polls (last state {lifecycle})")]
    ExportTimedOut {
        task_id: String,
        attempts: u32,
        lifecycle: TaskLifecycle,
    },

    /// Describe call did not return the task we created
    #[error("export task {task_id} not found on file system {file_system_id}")]
    ExportTaskMissing {
        task_id: String,
        file_system_id: String,
    },

    /// Result object body could not be read as a number
    #[error("result object {key} is not a valid number: {reason}")]
    InvalidResult { key: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HandlerError {
    pub fn external(operation: &'static str, message: impl Into<String>) -> Self {
        HandlerError::ExternalService {
            operation,
            message: message.into(),
        }
    }
}

fn failure_suffix(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(": {}", message),
        None => String::new(),
    }
}

/// Failures raised by the reserve simulation worker
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("failed to read policies: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("policy {policy_id}: {reason}")]
    InvalidPolicy { policy_id: String, reason: String },
}

pub type Result<T, E = HandlerError> = std::result::Result<T, E>;
