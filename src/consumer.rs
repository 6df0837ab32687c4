//! NATS subscription for incoming scoring requests

use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use tracing::info;

/// Receives scoring requests, optionally load-balanced through a queue group
pub struct RequestConsumer {
    client: Client,
    subject: String,
    queue_group: Option<String>,
}

impl RequestConsumer {
    pub fn new(client: Client, subject: &str, queue_group: Option<&str>) -> Self {
        Self {
            client,
            subject: subject.to_string(),
            queue_group: queue_group.map(str::to_string),
        }
    }

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
            queue_group = ?self.queue_group,
            "Subscribed to scoring requests"
        );
        Ok(subscriber)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
