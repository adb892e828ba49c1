//! NATS publishers for service replies and prediction history

use crate::types::record::PredictionRecord;
use crate::types::request::ServiceResponse;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Sends replies to requesters
#[derive(Clone)]
pub struct ReplyProducer {
    client: Client,
}

impl ReplyProducer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Publish a response on the requester's reply subject
    pub async fn reply(&self, reply_to: Subject, response: &ServiceResponse) -> Result<()> {
        let payload = serde_json::to_vec(response)?;
        self.client.publish(reply_to, payload.into()).await?;
        Ok(())
    }
}

/// Hands completed predictions to the external history store
#[derive(Clone)]
pub struct HistoryProducer {
    client: Client,
    subject: String,
}

impl HistoryProducer {
    /// Create a new history producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a prediction record
    pub async fn publish(&self, record: &PredictionRecord) -> Result<()> {
        let payload = serde_json::to_vec(record)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            record_id = %record.record_id,
            model = %record.model_name,
            prediction = %record.prediction,
            "Published prediction record"
        );

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
