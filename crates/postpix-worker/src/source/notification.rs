//! Object-created notification parsing
//!
//! Message bodies are EventBridge S3 events. Only `detail.bucket.name` and
//! `detail.object.key` are read; every other field is ignored.

use postpix_core::{PipelineError, PipelineResult, WorkItem};
use serde::Deserialize;

use super::traits::SourceMessage;

#[derive(Debug, Deserialize)]
struct ObjectCreatedEvent {
    detail: EventDetail,
}

#[derive(Debug, Deserialize)]
struct EventDetail {
    bucket: BucketRef,
    object: ObjectRef,
}

#[derive(Debug, Deserialize)]
struct BucketRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObjectRef {
    key: String,
}

/// Turn a raw delivery into a work item.
///
/// Fails with [`PipelineError::MalformedNotification`] when the body is not JSON, lacks
/// either field, or names something that is not a file.
pub fn parse_notification(message: &SourceMessage) -> PipelineResult<WorkItem> {
    let event: ObjectCreatedEvent = serde_json::from_str(&message.body)
        .map_err(|e| PipelineError::MalformedNotification(e.to_string()))?;

    WorkItem::new(
        message.message_id.clone(),
        event.detail.bucket.name,
        event.detail.object.key,
        message.ack_token.clone(),
        message.receive_count,
    )
}
