use std::sync::Arc;

use anyhow::Context;
use postpix_core::WorkerConfig;
use postpix_db::PgPostStore;
use postpix_processing::{ImageTransformer, MetadataSynthesizer};
use postpix_storage::create_storage;
use postpix_worker::{init_telemetry, Orchestrator, PipelineConfig, SqsWorkSource};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = WorkerConfig::from_env()?;

    init_telemetry(config.log_json)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        queue_url = %config.queue_url,
        max_messages = config.max_messages_per_run,
        "Starting postpix worker"
    );

    let storage = create_storage(&config.storage)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(storage_backend = %storage.backend_type(), "Storage backend ready");
    let source = SqsWorkSource::from_config(&config).await;
    let posts = PgPostStore::new(config.database.clone());

    let orchestrator = Orchestrator::new(
        Arc::new(source),
        storage,
        Arc::new(posts),
        ImageTransformer::default(),
        MetadataSynthesizer::default(),
        PipelineConfig::from(&config),
    );

    let report = orchestrator.run().await.context("Worker run aborted")?;
    if report.received == 0 {
        tracing::info!("Queue was empty; nothing to do");
    }

    Ok(())
}
