use std::fmt;

use serde::{Deserialize, Serialize};

use super::derivative::derivative_key;
use crate::error::{PipelineError, PipelineResult};

/// Opaque handle the work source needs to acknowledge a delivery.
///
/// For SQS this is the receipt handle of one particular receive, not the message id.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckToken(String);

impl AckToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AckToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Receipt handles are long and unhelpful in logs.
        let prefix: String = self.0.chars().take(12).collect();
        write!(f, "AckToken({}..)", prefix)
    }
}

/// One uploaded image to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub message_id: String,
    pub source_bucket: String,
    pub source_key: String,
    pub ack_token: AckToken,
    /// How many times the work source has handed this message out, if it reports it.
    pub receive_count: Option<u32>,
}

impl WorkItem {
    /// Build a work item, rejecting keys that do not name a file.
    pub fn new(
        message_id: impl Into<String>,
        source_bucket: impl Into<String>,
        source_key: impl Into<String>,
        ack_token: AckToken,
        receive_count: Option<u32>,
    ) -> PipelineResult<Self> {
        let source_bucket = source_bucket.into();
        let source_key = source_key.into();

        if source_bucket.trim().is_empty() {
            return Err(PipelineError::MalformedNotification(
                "bucket name is empty".to_string(),
            ));
        }
        if source_key.is_empty() || source_key.ends_with('/') {
            return Err(PipelineError::MalformedNotification(format!(
                "object key '{}' does not name a file",
                source_key
            )));
        }

        Ok(Self {
            message_id: message_id.into(),
            source_bucket,
            source_key,
            ack_token,
            receive_count,
        })
    }

    pub fn derivative_key(&self) -> String {
        derivative_key(&self.source_key)
    }
}
