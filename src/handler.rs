//! Completion handler: export the shared filesystem, wait, and sum the results
//!
//! Invoked once per "job succeeded" event. Service access is injected so the
//! same flow runs against FSx/S3 in Lambda and against in-memory fakes in tests.

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::config::HandlerConfig;
use crate::error::Result;
use crate::events::{classify, BatchJobEvent, Trigger};
use crate::export::{trigger_export, wait_for_export, ExportService};
use crate::results::{aggregate_results, ResultStore, SkippedResult};

/// What one invocation produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompletionReport {
    Completed {
        total_reserves: f64,
        included: usize,
        skipped: Vec<SkippedResult>,
        export_task_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        job_id: Option<String>,
        completed_at: DateTime<Utc>,
    },
    Skipped {
        reason: String,
    },
}

impl CompletionReport {
    pub fn total_reserves(&self) -> Option<f64> {
        match self {
            CompletionReport::Completed { total_reserves, .. } => Some(*total_reserves),
            CompletionReport::Skipped { .. } => None,
        }
    }
}

/// Export-then-aggregate flow with its collaborators
pub struct CompletionHandler<E, S> {
    export: E,
    store: S,
    config: HandlerConfig,
}

impl<E, S> CompletionHandler<E, S>
where
    E: ExportService,
    S: ResultStore,
{
    pub fn new(export: E, store: S, config: HandlerConfig) -> Self {
        Self {
            export,
            store,
            config,
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Handle one EventBridge event; events that do not match the rule are skipped
    pub async fn handle(&self, event: &BatchJobEvent) -> Result<CompletionReport> {
        let detail = match classify(event, self.config.job_queue.as_deref()) {
            Trigger::Run(detail) => detail,
            Trigger::Ignore(reason) => {
                info!("Ignoring event: {}", reason);
                return Ok(CompletionReport::Skipped { reason });
            }
        };

        info!(
            "Batch job {} succeeded on {}",
            detail.job_name.as_deref().unwrap_or("<unnamed>"),
            detail.job_queue.as_deref().unwrap_or("<unknown queue>")
        );
        self.run(detail.job_id.clone()).await
    }

    /// Export, wait for the export, aggregate, report
    pub async fn run(&self, job_id: Option<String>) -> Result<CompletionReport> {
        let config = &self.config;

        let task = trigger_export(&self.export, &config.file_system_id, &config.export_path).await?;
        let task = wait_for_export(&self.export, &config.file_system_id, &task.task_id, config.poll).await?;

        let summary = aggregate_results(
            &self.store,
            &config.export_path,
            &config.result_suffix,
            config.parse_mode,
        )
        .await?;

        info!("The total reserves value is: {}", summary.total);

        Ok(CompletionReport::Completed {
            total_reserves: summary.total,
            included: summary.included,
            skipped: summary.skipped,
            export_task_id: task.task_id,
            job_id,
            completed_at: Utc::now(),
        })
    }
}
