//! Work source abstraction
//!
//! # Lease contract
//!
//! Delivery is at-least-once. A message handed out by [`WorkSource::receive`] is leased
//! to this worker for the queue's visibility timeout. If it is not acknowledged before
//! the lease runs out it becomes visible again and is delivered to some receiver a
//! second time, with a higher `receive_count`. Callers must therefore tolerate seeing
//! the same notification more than once.
//!
//! [`WorkSource::acknowledge`] permanently removes the message. It is only called once
//! the item's post has been persisted.

use async_trait::async_trait;
use postpix_core::{AckToken, PipelineError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Acknowledge failed: {0}")]
    Acknowledge(String),
}

impl From<SourceError> for PipelineError {
    fn from(err: SourceError) -> Self {
        PipelineError::Transient(err.to_string())
    }
}

/// One raw delivery, before its body has been parsed.
#[derive(Debug, Clone)]
pub struct SourceMessage {
    pub message_id: String,
    pub body: String,
    pub ack_token: AckToken,
    pub receive_count: Option<u32>,
}

#[async_trait]
pub trait WorkSource: Send + Sync {
    /// Receive at most one message. `Ok(None)` means the source is currently empty.
    async fn receive(&self) -> Result<Option<SourceMessage>, SourceError>;

    /// Remove a received message from the source.
    async fn acknowledge(&self, token: &AckToken) -> Result<(), SourceError>;
}
