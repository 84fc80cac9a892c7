//! EventBridge events that trigger the completion handler

use aws_lambda_events::event::cloudwatch_events::CloudWatchEvent;
use serde::{Deserialize, Serialize};

use crate::deployment::COMPLETION_RULE;

/// `detail` of a "Batch Job State Change" event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJobDetail {
    #[serde(default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub job_queue: Option<String>,
    #[serde(default)]
    pub job_definition: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_reason: Option<String>,
}

pub type BatchJobEvent = CloudWatchEvent<BatchJobDetail>;

/// Outcome of matching an event against the completion rule
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger<'a> {
    Run(&'a BatchJobDetail),
    Ignore(String),
}

/// Match `event` against the completion rule and, when set, the expected job queue
pub fn classify<'a>(event: &'a BatchJobEvent, job_queue: Option<&str>) -> Trigger<'a> {
    let source = event.source.as_deref().unwrap_or_default();
    if source != COMPLETION_RULE.source {
        return Trigger::Ignore(format!("unexpected source {:?}", source));
    }

    let detail_type = event.detail_type.as_deref().unwrap_or_default();
    if detail_type != COMPLETION_RULE.detail_type {
        return Trigger::Ignore(format!("unexpected detail-type {:?}", detail_type));
    }

    let Some(detail) = event.detail.as_ref() else {
        return Trigger::Ignore("event has no detail".to_string());
    };

    let status = detail.status.as_deref().unwrap_or_default();
    if status != COMPLETION_RULE.status {
        return Trigger::Ignore(format!("job status is {:?}", status));
    }

    if let Some(expected) = job_queue {
        let actual = detail.job_queue.as_deref().unwrap_or_default();
        if !queue_matches(actual, expected) {
            return Trigger::Ignore(format!("job queue {:?} is not {:?}", actual, expected));
        }
    }

    Trigger::Run(detail)
}

/// Batch reports queues by ARN; configuration may hold either the ARN or the bare name
fn queue_matches(actual: &str, expected: &str) -> bool {
    actual == expected || actual.rsplit('/').next() == Some(expected)
}
