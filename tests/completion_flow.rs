//! End-to-end flow: workers write reserve files, the completion handler exports
//! and sums them.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use actuarial_batch::config::{
    HandlerConfig, ENV_FSX_PATH, ENV_FSX_SYSTEM_ID, ENV_POLL_INTERVAL_SECS, ENV_S3_BUCKET_NAME,
};
use actuarial_batch::error::{HandlerError, Result};
use actuarial_batch::events::BatchJobEvent;
use actuarial_batch::export::{ExportService, ExportTask, TaskLifecycle};
use actuarial_batch::policy::load_policies;
use actuarial_batch::results::LocalResultStore;
use actuarial_batch::simulation::{result_path, write_reserve, ClaimsSimulator, SimulationConfig};
use actuarial_batch::{CompletionHandler, CompletionReport};
use approx::assert_relative_eq;
use async_trait::async_trait;

/// Export that finishes on the third status query
struct SlowExport {
    polls: Mutex<u32>,
}

#[async_trait]
impl ExportService for SlowExport {
    async fn create_export_task(
        &self,
        _file_system_id: &str,
        paths: &[String],
    ) -> Result<ExportTask> {
        assert_eq!(paths, ["output/".to_string()]);
        Ok(ExportTask {
            task_id: "task-00000001".to_string(),
            lifecycle: TaskLifecycle::Pending,
            failure_message: None,
        })
    }

    async fn describe_task(
        &self,
        _file_system_id: &str,
        task_id: &str,
    ) -> Result<Option<ExportTask>> {
        let mut polls = self.polls.lock().unwrap();
        *polls += 1;
        let lifecycle = if *polls >= 3 {
            TaskLifecycle::Succeeded
        } else {
            TaskLifecycle::Executing
        };
        Ok(Some(ExportTask {
            task_id: task_id.to_string(),
            lifecycle,
            failure_message: None,
        }))
    }
}

fn handler_config() -> HandlerConfig {
    let vars: HashMap<&str, &str> = [
        (ENV_FSX_SYSTEM_ID, "fs-0123456789abcdef0"),
        (ENV_FSX_PATH, "output/"),
        (ENV_S3_BUCKET_NAME, "actuary-calculating-bucket"),
        (ENV_POLL_INTERVAL_SECS, "1"),
    ]
    .into_iter()
    .collect();
    HandlerConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap()
}

fn succeeded_event() -> BatchJobEvent {
    serde_json::from_str(
        r#"{
            "version": "0",
            "id": "5f0b4f61-0c3c-4a1b-9a1e-0d7f0d0f7a10",
            "detail-type": "Batch Job State Change",
            "source": "aws.batch",
            "account": "123456789012",
            "time": "2024-03-01T12:00:00Z",
            "region": "us-east-1",
            "resources": [],
            "detail": {
                "jobName": "reserves",
                "jobId": "job-1",
                "jobQueue": "arn:aws:batch:us-east-1:123456789012:job-queue/actuary-computing-job-queue",
                "status": "SUCCEEDED"
            }
        }"#,
    )
    .unwrap()
}

fn write_shard(dir: &Path, name: &str, rows: &[&str]) {
    let mut body = String::from(
        "id,age,gender,smoking_status,occupation,policy_type,effective_date,term,premium\n",
    );
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    fs::write(dir.join(name), body).unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_workers_then_handler_sum_matches() {
    let fsx = tempfile::tempdir().unwrap();
    let input_dir = fsx.path().join("input");
    let output_dir = fsx.path().join("output");
    fs::create_dir_all(&input_dir).unwrap();

    write_shard(
        &input_dir,
        "shard-0.csv",
        &[
            "P-1,40,Male,Non-Smoker,Clerk,Term Life,2021-01-01,3650,800",
            "P-2,55,Female,Smoker,Pilot,Term Life,2021-02-01,1825,1500",
        ],
    );
    write_shard(
        &input_dir,
        "shard-1.csv",
        &["P-3,33,Female,No,Nurse,Whole Life,2020-05-20,7300,950"],
    );

    let mut expected = 0.0;
    for (seed, shard) in ["shard-0.csv", "shard-1.csv"].iter().enumerate() {
        let input = input_dir.join(shard);
        let policies = load_policies(&input).unwrap();
        let config = SimulationConfig {
            num_simulations: 200,
            seed: seed as u64,
            ..Default::default()
        };
        let estimate = ClaimsSimulator::new(&policies, config).unwrap().run();
        write_reserve(&result_path(&output_dir, &input), estimate.average_reserve).unwrap();
        expected += estimate.average_reserve;
    }
    // noise the aggregator must ignore
    fs::write(output_dir.join("summary.csv"), "12345").unwrap();
    fs::write(output_dir.join("partial.txt"), "").unwrap();

    let export = SlowExport { polls: Mutex::new(0) };
    let handler =
        CompletionHandler::new(export, LocalResultStore::new(fsx.path()), handler_config());

    let report = handler.handle(&succeeded_event()).await.unwrap();

    match report {
        CompletionReport::Completed { total_reserves, included, export_task_id, .. } => {
            // the written decimal is the shortest exact representation of each f64
            assert_relative_eq!(total_reserves, expected, max_relative = 1e-12);
            assert_eq!(included, 2);
            assert_eq!(export_task_id, "task-00000001");
        }
        other => panic!("unexpected report: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_malformed_result_fails_invocation() {
    let fsx = tempfile::tempdir().unwrap();
    let output_dir = fsx.path().join("output");
    fs::create_dir_all(&output_dir).unwrap();
    fs::write(output_dir.join("a.txt"), "120.5").unwrap();
    fs::write(output_dir.join("b.txt"), "79.5 reserves").unwrap();

    let export = SlowExport { polls: Mutex::new(0) };
    let handler =
        CompletionHandler::new(export, LocalResultStore::new(fsx.path()), handler_config());

    let err = handler.handle(&succeeded_event()).await.unwrap_err();
    assert!(matches!(err, HandlerError::InvalidResult { ref key, .. } if key == "output/b.txt"));
}
