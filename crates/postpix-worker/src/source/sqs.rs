//! Amazon SQS work source

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::{Message, MessageSystemAttributeName};
use aws_sdk_sqs::Client as SqsClient;
use postpix_core::{AckToken, WorkerConfig};

use super::traits::{SourceError, SourceMessage, WorkSource};

/// Long-polling SQS consumer that receives one message per call.
pub struct SqsWorkSource {
    client: SqsClient,
    queue_url: String,
    wait_time_secs: i32,
    visibility_timeout_secs: Option<i32>,
}

impl SqsWorkSource {
    pub fn new(
        client: SqsClient,
        queue_url: String,
        wait_time_secs: i32,
        visibility_timeout_secs: Option<i32>,
    ) -> Self {
        Self {
            client,
            queue_url,
            wait_time_secs,
            visibility_timeout_secs,
        }
    }

    /// Build the SQS client from the worker configuration.
    ///
    /// Credentials come from the default AWS provider chain. `AWS_ENDPOINT_URL` points the
    /// client at LocalStack or another SQS-compatible endpoint.
    pub async fn from_config(config: &WorkerConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.aws_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        Self::new(
            SqsClient::new(&sdk_config),
            config.queue_url.clone(),
            config.receive_wait_secs,
            config.visibility_timeout_secs,
        )
    }
}

#[async_trait]
impl WorkSource for SqsWorkSource {
    async fn receive(&self) -> Result<Option<SourceMessage>, SourceError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(self.wait_time_secs)
            .set_visibility_timeout(self.visibility_timeout_secs)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await
            .map_err(|e| SourceError::Receive(DisplayErrorContext(&e).to_string()))?;

        match output.messages().first() {
            Some(message) => to_source_message(message).map(Some),
            None => Ok(None),
        }
    }

    async fn acknowledge(&self, token: &AckToken) -> Result<(), SourceError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(token.as_str())
            .send()
            .await
            .map_err(|e| SourceError::Acknowledge(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!("Message deleted from queue");
        Ok(())
    }
}

fn to_source_message(message: &Message) -> Result<SourceMessage, SourceError> {
    // Without a receipt handle the message could never be deleted.
    let receipt_handle = message
        .receipt_handle()
        .ok_or_else(|| SourceError::Receive("message has no receipt handle".to_string()))?;

    let receive_count = message
        .attributes()
        .and_then(|attrs| attrs.get(&MessageSystemAttributeName::ApproximateReceiveCount))
        .and_then(|count| count.parse::<u32>().ok());

    Ok(SourceMessage {
        message_id: message.message_id().unwrap_or_default().to_string(),
        body: message.body().unwrap_or_default().to_string(),
        ack_token: AckToken::new(receipt_handle),
        receive_count,
    })
}
