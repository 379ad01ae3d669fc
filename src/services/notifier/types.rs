use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::services::retry::RetryError;

/// Render a token amount, keeping at least one decimal place
pub fn format_amount(amount: Decimal) -> String {
    if amount.scale() == 0 {
        format!("{}.0", amount)
    } else {
        amount.to_string()
    }
}

/// Human-readable alert sent to every alert channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub title: String,
    pub body: String,
}

impl AlertMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Liveness status reported to the health aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Up,
    Down,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One health ping: status, short message and numeric ping value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub message: String,
    pub ping: String,
}

impl HealthReport {
    pub fn up(balance: Decimal) -> Self {
        Self {
            status: HealthStatus::Up,
            message: "Balance check successful".to_string(),
            ping: format_amount(balance),
        }
    }

    pub fn down(error: &str) -> Self {
        Self {
            status: HealthStatus::Down,
            message: format!("Balance check failed: {}", error),
            ping: "0".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Status code: {0}")]
    Status(u16),
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Delivery result for a single recipient of a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientOutcome {
    pub recipient: String,
    pub attempts: u32,
    pub error: Option<String>,
}

impl RecipientOutcome {
    pub fn delivered(recipient: impl Into<String>, attempts: u32) -> Self {
        Self {
            recipient: recipient.into(),
            attempts,
            error: None,
        }
    }

    pub fn failed(recipient: impl Into<String>, attempts: u32, error: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            attempts,
            error: Some(error.into()),
        }
    }

    /// Build from a retry run whose success value is the attempt count
    pub fn from_retry(
        recipient: impl Into<String>,
        result: Result<u32, RetryError<NotifyError>>,
    ) -> Self {
        match result {
            Ok(attempts) => Self::delivered(recipient, attempts),
            Err(e) => Self::failed(recipient, e.attempts, e.last_error.to_string()),
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-channel summary of one delivery round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: String,
    pub recipients: Vec<RecipientOutcome>,
}

impl ChannelReport {
    pub fn new(channel: impl Into<String>, recipients: Vec<RecipientOutcome>) -> Self {
        Self {
            channel: channel.into(),
            recipients,
        }
    }

    /// Report for a channel whose delivery task died before finishing
    pub fn aborted(channel: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(channel, vec![RecipientOutcome::failed("*", 0, error)])
    }

    pub fn is_success(&self) -> bool {
        !self.recipients.is_empty() && self.recipients.iter().all(RecipientOutcome::is_delivered)
    }

    pub fn delivered_count(&self) -> usize {
        self.recipients.iter().filter(|r| r.is_delivered()).count()
    }
}

/// A change-alert delivery path.
///
/// `deliver` is best-effort: failures end up in the report, never as a
/// panic or error escaping to the caller.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    fn name(&self) -> &str;
    async fn deliver(&self, message: &AlertMessage) -> ChannelReport;
}

/// The per-cycle liveness ping
#[async_trait]
pub trait HealthReporter: Send + Sync {
    fn name(&self) -> &str;
    async fn report(&self, report: &HealthReport) -> ChannelReport;
}
