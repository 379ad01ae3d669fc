use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::channels::NtfySettings;
use crate::services::notifier::{
    AlertMessage, AlertNotifier, ChannelReport, NotifyError, RecipientOutcome,
};
use crate::services::retry::RetryPolicy;

/// Publishes alerts to a single ntfy topic
pub struct NtfyNotifier {
    client: Client,
    topic_url: String,
    topic_id: String,
    priority: String,
    retry: RetryPolicy,
}

impl NtfyNotifier {
    pub fn new(settings: &NtfySettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            topic_url: settings.subscribe_url(),
            topic_id: settings.topic_id.clone(),
            priority: settings.priority.clone(),
            retry: settings.retry,
        }
    }

    pub fn topic_url(&self) -> &str {
        &self.topic_url
    }

    async fn send(&self, message: &AlertMessage) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.topic_url)
            .header("Title", &message.title)
            .header("Priority", &self.priority)
            .body(message.body.clone().into_bytes())
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 200 {
            Ok(())
        } else {
            Err(NotifyError::Status(status))
        }
    }
}

#[async_trait]
impl AlertNotifier for NtfyNotifier {
    fn name(&self) -> &str {
        "ntfy"
    }

    async fn deliver(&self, message: &AlertMessage) -> ChannelReport {
        let result = self
            .retry
            .run("ntfy.sh notification", move |attempt| async move {
                self.send(message).await.map(|_| attempt + 1)
            })
            .await;

        match &result {
            Ok(_) => tracing::info!(
                "ntfy.sh notification sent successfully to topic {}",
                self.topic_id
            ),
            Err(e) => tracing::error!(
                "Failed to send ntfy.sh notification after {} retries: {}",
                self.retry.retry_count,
                e.last_error
            ),
        }

        ChannelReport::new(
            self.name(),
            vec![RecipientOutcome::from_retry(self.topic_id.clone(), result)],
        )
    }
}
