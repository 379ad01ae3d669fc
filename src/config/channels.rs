use std::time::Duration;

use crate::services::retry::RetryPolicy;

pub const DEFAULT_NTFY_SERVER: &str = "https://ntfy.sh";
pub const DEFAULT_PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// ntfy.sh topic broadcaster
#[derive(Debug, Clone, PartialEq)]
pub struct NtfySettings {
    pub enabled: bool,
    pub server: String,
    pub topic_id: String,
    /// Set when no topic was configured and one was generated at startup
    pub topic_generated: bool,
    pub priority: String,
    pub retry: RetryPolicy,
}

impl Default for NtfySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            server: DEFAULT_NTFY_SERVER.to_string(),
            topic_id: String::new(),
            topic_generated: false,
            priority: "default".to_string(),
            retry: RetryPolicy::new(3, Duration::from_secs(60)),
        }
    }
}

impl NtfySettings {
    /// URL operators subscribe to
    pub fn subscribe_url(&self) -> String {
        format!("{}/{}", self.server.trim_end_matches('/'), self.topic_id)
    }
}

/// Pushover per-user pusher
#[derive(Debug, Clone, PartialEq)]
pub struct PushoverSettings {
    pub enabled: bool,
    pub api_url: String,
    pub app_token: String,
    pub user_keys: Vec<String>,
    /// -2 (lowest) to 2 (emergency)
    pub priority: i8,
    pub retry: RetryPolicy,
}

impl Default for PushoverSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: DEFAULT_PUSHOVER_URL.to_string(),
            app_token: String::new(),
            user_keys: Vec::new(),
            priority: 0,
            retry: RetryPolicy::new(3, Duration::from_secs(60)),
        }
    }
}

/// Uptime Kuma push monitor
#[derive(Debug, Clone, PartialEq)]
pub struct UptimeKumaSettings {
    pub enabled: bool,
    pub push_url: String,
    pub retry: RetryPolicy,
}

impl Default for UptimeKumaSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            push_url: String::new(),
            retry: RetryPolicy::new(3, Duration::from_secs(30)),
        }
    }
}

/// Split a comma-separated key list, dropping blanks
pub fn parse_user_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}
