use async_trait::async_trait;

use super::redpanda::RedpandaClient;
use crate::gateways::{CollaboratorError, NotificationSender, OrderSummary};

/// Publishes order confirmations for the mailer to pick up, keyed by human
/// code so redeliveries land on one partition.
pub struct RedpandaNotificationSender {
    client: RedpandaClient,
    topic: String,
}

impl RedpandaNotificationSender {
    pub fn new(client: RedpandaClient, topic: impl Into<String>) -> Self {
        Self {
            client,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl NotificationSender for RedpandaNotificationSender {
    async fn send_order_confirmation(&self, summary: &OrderSummary) -> Result<(), CollaboratorError> {
        let payload = serde_json::to_string(summary).map_err(|e| CollaboratorError::Unavailable {
            service: "notifications",
            reason: e.to_string(),
        })?;

        self.client
            .publish(&self.topic, &summary.human_code, &payload)
            .await
            .map_err(|e| CollaboratorError::Unavailable {
                service: "notifications",
                reason: e.to_string(),
            })
    }
}
