//! AWS Lambda handler invoked when the batch job queue reports success
//!
//! Exports the FSx output path back to S3, waits for the export task, sums the
//! per-worker reserve files and returns the total.

use actuarial_batch::{
    config::HandlerConfig,
    events::BatchJobEvent,
    export::FsxExportService,
    handler::{CompletionHandler, CompletionReport},
    results::S3ResultStore,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

type Handler = CompletionHandler<FsxExportService, S3ResultStore>;

async fn function_handler(
    handler: &Handler,
    event: LambdaEvent<BatchJobEvent>,
) -> Result<CompletionReport, Error> {
    log::debug!("Invocation {}", event.context.request_id);
    let report = handler.handle(&event.payload).await?;
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    // missing settings fail the cold start rather than every invocation
    let config = HandlerConfig::from_env()?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let export = FsxExportService::new(aws_sdk_fsx::Client::new(&aws_config));
    let store = S3ResultStore::new(aws_sdk_s3::Client::new(&aws_config), config.bucket.clone());

    log::info!(
        "Completion handler ready for {} ({}) -> s3://{}",
        config.file_system_id,
        config.export_path,
        config.bucket
    );

    let handler = CompletionHandler::new(export, store, config);
    let handler = &handler;
    run(service_fn(move |event| async move {
        function_handler(handler, event).await
    }))
    .await
}
