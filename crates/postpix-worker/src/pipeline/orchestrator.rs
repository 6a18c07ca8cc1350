//! Pipeline orchestrator
//!
//! Drives one work item at a time through parse, fetch, transform, store, synthesize,
//! persist and acknowledge. A failure in any stage fails only the current item, which is
//! left unacknowledged so the work source redelivers it after its lease expires. The one
//! exception is a schema provisioning failure, which aborts the run.
//!
//! The message is acknowledged only after its post row has been inserted.

use std::sync::Arc;
use std::time::Instant;

use postpix_core::{LogLevel, PersistedPost, PipelineError, PipelineResult, WorkItem, WorkerConfig};
use postpix_db::PostStore;
use postpix_processing::{ImageTransformer, MetadataSynthesizer};
use postpix_storage::Storage;

use super::state::Stage;
use crate::source::{parse_notification, SourceMessage, WorkSource};

/// Run-level settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Bucket derivatives are written to. `None` writes next to the source object.
    pub output_bucket: Option<String>,
    /// Upper bound on messages received in one run.
    pub max_items_per_run: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_bucket: None,
            max_items_per_run: 1,
        }
    }
}

impl From<&WorkerConfig> for PipelineConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            output_bucket: config.output_bucket.clone(),
            max_items_per_run: config.max_messages_per_run,
        }
    }
}

/// Outcome counts of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub received: usize,
    pub processed: usize,
    pub failed: usize,
}

struct ItemFailure {
    stage: Stage,
    item: Option<WorkItem>,
    error: PipelineError,
}

pub struct Orchestrator {
    source: Arc<dyn WorkSource>,
    storage: Arc<dyn Storage>,
    posts: Arc<dyn PostStore>,
    transformer: ImageTransformer,
    synthesizer: MetadataSynthesizer,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn WorkSource>,
        storage: Arc<dyn Storage>,
        posts: Arc<dyn PostStore>,
        transformer: ImageTransformer,
        synthesizer: MetadataSynthesizer,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            storage,
            posts,
            transformer,
            synthesizer,
            config,
        }
    }

    /// Process up to `max_items_per_run` messages, stopping early when the source is empty.
    ///
    /// Item failures are logged and counted. Only [`PipelineError::Fatal`] is returned as
    /// an error. The post store connection is closed on every exit path.
    #[tracing::instrument(skip(self), fields(run_id = %uuid::Uuid::new_v4()))]
    pub async fn run(&self) -> PipelineResult<RunReport> {
        let result = self.run_items().await;
        self.posts.close().await;

        match &result {
            Ok(report) => tracing::info!(
                received = report.received,
                processed = report.processed,
                failed = report.failed,
                "Run finished"
            ),
            Err(e) => tracing::error!(error = %e, error_code = e.error_code(), "Run aborted"),
        }
        result
    }

    async fn run_items(&self) -> PipelineResult<RunReport> {
        let mut report = RunReport::default();
        let mut schema_ready = false;

        while report.received < self.config.max_items_per_run {
            let message = match self.source.receive().await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    tracing::info!("No messages available");
                    break;
                }
                Err(e) => {
                    // Nothing was leased, so there is nothing to leave unacknowledged.
                    let error = PipelineError::from(e);
                    tracing::error!(
                        stage = %Stage::Idle,
                        error = %error,
                        error_code = error.error_code(),
                        "Failed to receive work"
                    );
                    break;
                }
            };
            report.received += 1;

            match self.process_message(&message, &mut schema_ready).await {
                Ok(post) => {
                    report.processed += 1;
                    tracing::debug!(post_id = post.id, "Item complete");
                }
                Err(failure) => {
                    log_failure(&message, &failure);
                    if failure.error.is_fatal() {
                        return Err(failure.error);
                    }
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    #[tracing::instrument(
        skip(self, message, schema_ready),
        fields(message_id = %message.message_id, receive_count = ?message.receive_count)
    )]
    async fn process_message(
        &self,
        message: &SourceMessage,
        schema_ready: &mut bool,
    ) -> Result<PersistedPost, ItemFailure> {
        let started = Instant::now();

        let item = parse_notification(message).map_err(|error| ItemFailure {
            stage: Stage::Delivered,
            item: None,
            error,
        })?;

        let mut stage = Stage::WorkReceived;
        match self.process_item(&item, schema_ready, &mut stage).await {
            Ok(post) => {
                tracing::info!(
                    bucket = %item.source_bucket,
                    key = %item.source_key,
                    post_id = post.id,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Image processed and post created"
                );
                Ok(post)
            }
            Err(error) => Err(ItemFailure {
                stage,
                item: Some(item),
                error,
            }),
        }
    }

    /// Run the item from fetch to acknowledge. `stage` tracks the last state reached so
    /// the caller can report where a failure happened.
    async fn process_item(
        &self,
        item: &WorkItem,
        schema_ready: &mut bool,
        stage: &mut Stage,
    ) -> PipelineResult<PersistedPost> {
        let fetched = self
            .storage
            .fetch(&item.source_bucket, &item.source_key)
            .await?;
        tracing::debug!(
            size_bytes = fetched.data.len(),
            content_type = ?fetched.content_type,
            "Source object fetched"
        );
        *stage = stage.next();

        // Decoding and resampling are CPU-bound; keep them off the async workers.
        let transformer = self.transformer;
        let data = fetched.data;
        let derivative = tokio::task::spawn_blocking(move || transformer.transform(&data))
            .await
            .map_err(|e| PipelineError::Transient(format!("transform task failed: {}", e)))??;
        *stage = stage.next();

        let output_bucket = self
            .config
            .output_bucket
            .as_deref()
            .unwrap_or(&item.source_bucket);
        let derivative_key = item.derivative_key();
        let url = self
            .storage
            .store(
                output_bucket,
                &derivative_key,
                derivative,
                self.transformer.spec().content_type(),
            )
            .await?;
        tracing::debug!(bucket = %output_bucket, key = %derivative_key, url = %url, "Derivative stored");
        *stage = stage.next();

        let record = self.synthesizer.synthesize(&url);
        *stage = stage.next();

        if !*schema_ready {
            self.posts.ensure_schema().await?;
            *schema_ready = true;
        }
        let post = self.posts.insert(&record).await?;
        *stage = stage.next();

        self.source.acknowledge(&item.ack_token).await?;
        *stage = stage.next();

        Ok(post)
    }
}

fn log_failure(message: &SourceMessage, failure: &ItemFailure) {
    let bucket = failure.item.as_ref().map(|i| i.source_bucket.as_str());
    let key = failure.item.as_ref().map(|i| i.source_key.as_str());
    let error = &failure.error;

    match error.log_level() {
        LogLevel::Warn => tracing::warn!(
            stage = %failure.stage,
            message_id = %message.message_id,
            bucket = ?bucket,
            key = ?key,
            receive_count = ?message.receive_count,
            error = %error,
            error_code = error.error_code(),
            "Work item failed; leaving it for redelivery"
        ),
        LogLevel::Error => tracing::error!(
            stage = %failure.stage,
            message_id = %message.message_id,
            bucket = ?bucket,
            key = ?key,
            receive_count = ?message.receive_count,
            error = %error,
            error_code = error.error_code(),
            "Work item failed; leaving it for redelivery"
        ),
    }
}
