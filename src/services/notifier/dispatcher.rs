use futures::future::join_all;
use std::sync::Arc;

use crate::config::Config;
use crate::services::notifier::{
    AlertMessage, AlertNotifier, ChannelReport, HealthReport, HealthReporter, NotifyError,
    NtfyNotifier, PushoverNotifier, UptimeKumaNotifier,
};

/// Fans notifications out to every enabled channel.
///
/// Each channel runs in its own task, so an error or panic inside one
/// channel cannot stop delivery on another.
#[derive(Default)]
pub struct NotificationDispatcher {
    alert_channels: Vec<Arc<dyn AlertNotifier>>,
    health_reporter: Option<Arc<dyn HealthReporter>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the enabled channels from configuration
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let mut dispatcher = Self::new();

        if config.ntfy.enabled {
            dispatcher = dispatcher.with_alert_channel(Arc::new(NtfyNotifier::new(&config.ntfy)));
        }

        if config.pushover.enabled {
            dispatcher =
                dispatcher.with_alert_channel(Arc::new(PushoverNotifier::new(&config.pushover)));
        }

        if config.uptime_kuma.enabled {
            dispatcher = dispatcher
                .with_health_reporter(Arc::new(UptimeKumaNotifier::new(&config.uptime_kuma)?));
        }

        Ok(dispatcher)
    }

    pub fn with_alert_channel(mut self, channel: Arc<dyn AlertNotifier>) -> Self {
        self.alert_channels.push(channel);
        self
    }

    pub fn with_health_reporter(mut self, reporter: Arc<dyn HealthReporter>) -> Self {
        self.health_reporter = Some(reporter);
        self
    }

    pub fn alert_channel_names(&self) -> Vec<&str> {
        self.alert_channels.iter().map(|c| c.name()).collect()
    }

    pub fn has_health_reporter(&self) -> bool {
        self.health_reporter.is_some()
    }

    /// Deliver a change alert on every alert channel concurrently
    pub async fn broadcast_alert(&self, message: &AlertMessage) -> Vec<ChannelReport> {
        let mut names = Vec::with_capacity(self.alert_channels.len());
        let mut tasks = Vec::with_capacity(self.alert_channels.len());

        for channel in &self.alert_channels {
            let channel = Arc::clone(channel);
            let message = message.clone();
            names.push(channel.name().to_string());
            tasks.push(tokio::spawn(async move { channel.deliver(&message).await }));
        }

        names
            .into_iter()
            .zip(join_all(tasks).await)
            .map(|(name, joined)| match joined {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(channel = %name, "Notification channel task failed: {}", e);
                    ChannelReport::aborted(name, e.to_string())
                }
            })
            .collect()
    }

    /// Send the per-cycle health ping, if a reporter is configured
    pub async fn report_health(&self, report: &HealthReport) -> Option<ChannelReport> {
        let reporter = Arc::clone(self.health_reporter.as_ref()?);
        let name = reporter.name().to_string();
        let report = report.clone();

        match tokio::spawn(async move { reporter.report(&report).await }).await {
            Ok(channel_report) => Some(channel_report),
            Err(e) => {
                tracing::error!(channel = %name, "Health reporter task failed: {}", e);
                Some(ChannelReport::aborted(name, e.to_string()))
            }
        }
    }
}
