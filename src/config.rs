//! Completion handler settings read from the Lambda environment

use std::time::Duration;

use crate::error::{HandlerError, Result};
use crate::export::{PollPolicy, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use crate::results::{ParseMode, RESULT_SUFFIX};

pub const ENV_FSX_SYSTEM_ID: &str = "FSX_SYSTEM_ID";
pub const ENV_FSX_PATH: &str = "FSX_PATH";
pub const ENV_S3_BUCKET_NAME: &str = "S3_BUCKET_NAME";
pub const ENV_POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";
pub const ENV_POLL_MAX_ATTEMPTS: &str = "POLL_MAX_ATTEMPTS";
pub const ENV_RESULT_SUFFIX: &str = "RESULT_SUFFIX";
pub const ENV_RESULT_PARSE_MODE: &str = "RESULT_PARSE_MODE";
pub const ENV_JOB_QUEUE: &str = "JOB_QUEUE";

/// Everything the completion handler needs besides its service clients
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerConfig {
    /// FSx file system to export from
    pub file_system_id: String,
    /// Filesystem path to export; also the S3 prefix results land under
    pub export_path: String,
    /// Bucket linked to the filesystem
    pub bucket: String,
    pub poll: PollPolicy,
    pub result_suffix: String,
    pub parse_mode: ParseMode,
    /// Only react to completions from this queue (name or ARN)
    pub job_queue: Option<String>,
}

impl HandlerConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`; unset and blank values are treated the same
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &str| {
            get(name).ok_or_else(|| HandlerError::Config(format!("{} must be set", name)))
        };

        let file_system_id = required(ENV_FSX_SYSTEM_ID)?;
        let export_path = required(ENV_FSX_PATH)?;
        let bucket = required(ENV_S3_BUCKET_NAME)?;

        let interval = match get(ENV_POLL_INTERVAL_SECS) {
            Some(value) => match parse_number(ENV_POLL_INTERVAL_SECS, &value)? {
                0 => {
                    return Err(HandlerError::Config(format!(
                        "{} must be at least 1, got {:?}",
                        ENV_POLL_INTERVAL_SECS, value
                    )))
                }
                secs => Duration::from_secs(secs),
            },
            None => DEFAULT_POLL_INTERVAL,
        };
        let poll = match get(ENV_POLL_MAX_ATTEMPTS) {
            Some(value) => match parse_number(ENV_POLL_MAX_ATTEMPTS, &value)? {
                0 => PollPolicy::unbounded(interval),
                attempts => PollPolicy::bounded(interval, attempts as u32),
            },
            None => PollPolicy::bounded(interval, DEFAULT_MAX_POLL_ATTEMPTS),
        };

        let parse_mode = match get(ENV_RESULT_PARSE_MODE) {
            Some(value) => value.parse::<ParseMode>().map_err(HandlerError::Config)?,
            None => ParseMode::default(),
        };

        Ok(Self {
            file_system_id,
            export_path,
            bucket,
            poll,
            result_suffix: get(ENV_RESULT_SUFFIX).unwrap_or_else(|| RESULT_SUFFIX.to_string()),
            parse_mode,
            job_queue: get(ENV_JOB_QUEUE),
        })
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .ok()
        .filter(|n| *n <= u32::MAX as u64)
        .ok_or_else(|| HandlerError::Config(format!("{} must be a non-negative integer, got {:?}", name, value)))
}
