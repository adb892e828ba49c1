//! NATS subscription for incoming service requests

use crate::config::NatsConfig;
use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use tracing::info;

/// Receives request envelopes, optionally as a member of a queue group so
/// that several service instances share one request subject
pub struct RequestConsumer {
    client: Client,
    subject: String,
    queue_group: Option<String>,
}

impl RequestConsumer {
    pub fn new(client: Client, config: &NatsConfig) -> Self {
        Self {
            client,
            subject: config.request_subject.clone(),
            queue_group: config.queue_group.clone().filter(|g| !g.is_empty()),
        }
    }

    /// Subscribe to the request subject.
    ///
    /// Within a queue group each request is delivered to exactly one member.
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = match &self.queue_group {
            Some(group) => self
                .client
                .queue_subscribe(self.subject.clone(), group.clone())
                .await
                .with_context(|| format!("Failed to join queue group {} on {}", group, self.subject))?,
            None => self
                .client
                .subscribe(self.subject.clone())
                .await
                .with_context(|| format!("Failed to subscribe to {}", self.subject))?,
        };

        info!(
            subject = %self.subject,
            queue_group = self.queue_group.as_deref().unwrap_or("-"),
            "Listening for service requests"
        );
        Ok(subscriber)
    }
}
