//! NATS publishing for scoring replies and fraud alerts

use crate::types::{FraudAlert, Reply};
use anyhow::{Context, Result};
use async_nats::{Client, Subject};
use tracing::debug;

#[derive(Clone)]
pub struct VerdictPublisher {
    client: Client,
    alert_subject: String,
}

impl VerdictPublisher {
    pub fn new(client: Client, alert_subject: &str) -> Self {
        Self {
            client,
            alert_subject: alert_subject.to_string(),
        }
    }

    /// Answer a request on its reply subject
    pub async fn reply(&self, subject: Subject, reply: &Reply) -> Result<()> {
        let payload = serde_json::to_vec(reply).context("Failed to encode reply")?;
        self.client
            .publish(subject, payload.into())
            .await
            .context("Failed to publish reply")?;
        Ok(())
    }

    pub async fn publish_alert(&self, alert: &FraudAlert) -> Result<()> {
        let payload = serde_json::to_vec(alert).context("Failed to encode alert")?;
        self.client
            .publish(self.alert_subject.clone(), payload.into())
            .await
            .context("Failed to publish alert")?;

        debug!(
            alert_id = %alert.alert_id,
            message_id = ?alert.message_id,
            fraud_probability = alert.fraud_probability,
            "Published fraud alert"
        );
        Ok(())
    }

    pub fn alert_subject(&self) -> &str {
        &self.alert_subject
    }
}
