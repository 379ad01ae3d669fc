use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

use crate::config::channels::UptimeKumaSettings;
use crate::services::notifier::{
    ChannelReport, HealthReport, HealthReporter, NotifyError, RecipientOutcome,
};
use crate::services::retry::RetryPolicy;

/// Reports liveness to an Uptime Kuma push monitor
pub struct UptimeKumaNotifier {
    client: Client,
    push_url: Url,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    #[serde(default)]
    ok: bool,
    msg: Option<String>,
}

impl UptimeKumaNotifier {
    /// Build from settings; any query string copied along with the push URL
    /// is dropped since status, msg and ping are set per report.
    pub fn new(settings: &UptimeKumaSettings) -> Result<Self, NotifyError> {
        let mut push_url = Url::parse(&settings.push_url)
            .map_err(|e| NotifyError::Parse(format!("Invalid push URL: {}", e)))?;
        push_url.set_query(None);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Ok(Self {
            client,
            push_url,
            retry: settings.retry,
        })
    }

    pub fn push_url(&self) -> &Url {
        &self.push_url
    }

    async fn send(&self, report: &HealthReport) -> Result<(), NotifyError> {
        let response = self
            .client
            .get(self.push_url.clone())
            .query(&[
                ("status", report.status.as_str()),
                ("msg", report.message.as_str()),
                ("ping", report.ping.as_str()),
            ])
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(NotifyError::Status(status));
        }

        let body: PushResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Parse(e.to_string()))?;

        if body.ok {
            Ok(())
        } else {
            Err(NotifyError::Rejected(
                body.msg.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }
}

#[async_trait]
impl HealthReporter for UptimeKumaNotifier {
    fn name(&self) -> &str {
        "uptime_kuma"
    }

    async fn report(&self, report: &HealthReport) -> ChannelReport {
        let result = self
            .retry
            .run("Uptime Kuma ping", move |attempt| async move {
                self.send(report).await.map(|_| attempt + 1)
            })
            .await;

        match &result {
            Ok(_) => tracing::info!("Successfully sent ping to Uptime Kuma: {}", report.status),
            Err(e) => tracing::error!(
                "Failed to send Uptime Kuma ping after {} retries: {}",
                self.retry.retry_count,
                e.last_error
            ),
        }

        ChannelReport::new(
            self.name(),
            vec![RecipientOutcome::from_retry(self.push_url.path(), result)],
        )
    }
}
