use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::channels::PushoverSettings;
use crate::services::notifier::{
    AlertMessage, AlertNotifier, ChannelReport, NotifyError, RecipientOutcome,
};
use crate::services::retry::RetryPolicy;

/// Pushes alerts to each configured Pushover user, one request per key
pub struct PushoverNotifier {
    client: Client,
    api_url: String,
    app_token: String,
    user_keys: Vec<String>,
    priority: i8,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct PushoverResponse {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    errors: Vec<String>,
}

impl PushoverNotifier {
    pub fn new(settings: &PushoverSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_url: settings.api_url.clone(),
            app_token: settings.app_token.clone(),
            user_keys: settings.user_keys.clone(),
            priority: settings.priority,
            retry: settings.retry,
        }
    }

    async fn send(&self, user_key: &str, message: &AlertMessage) -> Result<(), NotifyError> {
        let priority = self.priority.to_string();
        let params = [
            ("token", self.app_token.as_str()),
            ("user", user_key),
            ("title", message.title.as_str()),
            ("message", message.body.as_str()),
            ("priority", priority.as_str()),
        ];

        let response = self
            .client
            .post(&self.api_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        match serde_json::from_str::<PushoverResponse>(&body) {
            Ok(parsed) if status == 200 && parsed.status == 1 => Ok(()),
            Ok(parsed) => Err(NotifyError::Rejected(
                parsed
                    .errors
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            )),
            Err(_) if status != 200 => Err(NotifyError::Status(status)),
            Err(e) => Err(NotifyError::Parse(e.to_string())),
        }
    }
}

#[async_trait]
impl AlertNotifier for PushoverNotifier {
    fn name(&self) -> &str {
        "pushover"
    }

    async fn deliver(&self, message: &AlertMessage) -> ChannelReport {
        let mut outcomes = Vec::with_capacity(self.user_keys.len());

        // Each key gets its own budget; a dead key never skips the next one
        for user_key in &self.user_keys {
            let masked = mask_key(user_key);
            let result = self
                .retry
                .run("Pushover message", move |attempt| async move {
                    self.send(user_key, message).await.map(|_| attempt + 1)
                })
                .await;

            match &result {
                Ok(_) => tracing::info!("Pushover notification sent to user {}", masked),
                Err(e) => tracing::error!(
                    "Failed to send Pushover message to user {} after {} retries: {}",
                    masked,
                    self.retry.retry_count,
                    e.last_error
                ),
            }

            outcomes.push(RecipientOutcome::from_retry(masked, result));
        }

        ChannelReport::new(self.name(), outcomes)
    }
}

/// Keep only a short prefix of a user key for logs and reports
pub fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(5).collect();
    format!("{}...", prefix)
}
