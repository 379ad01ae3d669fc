use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::channels::{
    parse_user_keys, NtfySettings, PushoverSettings, UptimeKumaSettings,
};
use crate::services::balance::{WatchTarget, DEFAULT_ETHERSCAN_URL};
use crate::services::retry::RetryPolicy;

/// USDT on Ethereum mainnet
pub const DEFAULT_TOKEN_CONTRACT: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Environment configuration
/// Loads and validates environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub wallet_address: String,
    pub token_contract: String,
    pub token_symbol: String,
    pub token_decimals: u32,
    pub etherscan_url: String,

    pub check_interval: Duration,
    pub retry_interval: Duration,
    pub max_retries: u32,
    pub state_file: PathBuf,
    pub log_file: Option<PathBuf>,

    pub ntfy: NtfySettings,
    pub pushover: PushoverSettings,
    pub uptime_kuma: UptimeKumaSettings,
}

impl Config {
    /// Read the process environment; `main` loads `.env` beforehand
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let api_key = env.required("ETHERSCAN_API_KEY")?;
        let wallet_address = env.required("WALLET_ADDRESS")?;

        let mut ntfy = NtfySettings {
            enabled: env.parse_bool("NTFY_ENABLED", true)?,
            server: env.get("NTFY_SERVER").unwrap_or_else(|| NtfySettings::default().server),
            topic_id: env.get("NTFY_TOPIC_ID").unwrap_or_default(),
            topic_generated: false,
            priority: env.get("NTFY_PRIORITY").unwrap_or_else(|| "default".to_string()),
            retry: RetryPolicy::new(
                env.parse("NTFY_MESSAGE_RETRY_COUNT", 3)?,
                Duration::from_secs(env.parse("NTFY_MESSAGE_RETRY_DELAY_SECS", 60)?),
            ),
        };

        // Resolved once here; the rest of the process only sees a valid topic
        if ntfy.enabled && ntfy.topic_id.is_empty() {
            ntfy.topic_id = uuid::Uuid::new_v4().to_string();
            ntfy.topic_generated = true;
        }

        let pushover = PushoverSettings {
            enabled: env.parse_bool("PUSHOVER_ENABLED", true)?,
            api_url: env
                .get("PUSHOVER_API_URL")
                .unwrap_or_else(|| PushoverSettings::default().api_url),
            app_token: env.get("PUSHOVER_APP_TOKEN").unwrap_or_default(),
            user_keys: env
                .get("PUSHOVER_USER_KEYS")
                .map(|raw| parse_user_keys(&raw))
                .unwrap_or_default(),
            priority: env.parse("PUSHOVER_PRIORITY", 0)?,
            retry: RetryPolicy::new(
                env.parse("PUSHOVER_MESSAGE_RETRY_COUNT", 3)?,
                Duration::from_secs(env.parse("PUSHOVER_MESSAGE_RETRY_DELAY_SECS", 60)?),
            ),
        };

        let uptime_kuma = UptimeKumaSettings {
            enabled: env.parse_bool("UPTIME_KUMA_ENABLED", true)?,
            push_url: env.get("UPTIME_KUMA_PUSH_URL").unwrap_or_default(),
            retry: RetryPolicy::new(
                env.parse("UPTIME_KUMA_MESSAGE_RETRY_COUNT", 3)?,
                Duration::from_secs(env.parse("UPTIME_KUMA_MESSAGE_RETRY_DELAY_SECS", 30)?),
            ),
        };

        let config = Self {
            api_key,
            wallet_address,
            token_contract: env
                .get("TOKEN_CONTRACT")
                .unwrap_or_else(|| DEFAULT_TOKEN_CONTRACT.to_string()),
            token_symbol: env.get("TOKEN_SYMBOL").unwrap_or_else(|| "USDT".to_string()),
            token_decimals: env.parse("TOKEN_DECIMALS", 6)?,
            etherscan_url: env
                .get("ETHERSCAN_API_URL")
                .unwrap_or_else(|| DEFAULT_ETHERSCAN_URL.to_string()),

            check_interval: Duration::from_secs(env.parse("CHECK_INTERVAL_SECS", 3600)?),
            retry_interval: Duration::from_secs(env.parse("RETRY_INTERVAL_SECS", 300)?),
            max_retries: env.parse("MAX_RETRIES", 3)?,
            state_file: env
                .get("STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("wallet_state.json")),
            log_file: env.get("LOG_FILE").map(PathBuf::from),

            ntfy,
            pushover,
            uptime_kuma,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field requirements of enabled channels
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_decimals > 28 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_DECIMALS",
                reason: "must be at most 28".to_string(),
            });
        }

        if self.pushover.enabled {
            if self.pushover.app_token.is_empty() {
                return Err(ConfigError::Missing("PUSHOVER_APP_TOKEN"));
            }
            if self.pushover.user_keys.is_empty() {
                return Err(ConfigError::Missing("PUSHOVER_USER_KEYS"));
            }
            if !(-2..=2).contains(&self.pushover.priority) {
                return Err(ConfigError::Invalid {
                    key: "PUSHOVER_PRIORITY",
                    reason: format!("{} is outside -2..=2", self.pushover.priority),
                });
            }
        }

        if self.uptime_kuma.enabled {
            if self.uptime_kuma.push_url.is_empty() {
                return Err(ConfigError::Missing("UPTIME_KUMA_PUSH_URL"));
            }
            reqwest::Url::parse(&self.uptime_kuma.push_url).map_err(|e| ConfigError::Invalid {
                key: "UPTIME_KUMA_PUSH_URL",
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    pub fn watch_target(&self) -> WatchTarget {
        WatchTarget {
            address: self.wallet_address.clone(),
            contract: self.token_contract.clone(),
            api_key: self.api_key.clone(),
        }
    }

    /// Log which channels are active
    pub fn log_summary(&self) {
        if !(self.ntfy.enabled || self.pushover.enabled) {
            tracing::warn!(
                "No notification methods are enabled. You will not receive alerts for balance changes."
            );
        }

        if self.ntfy.enabled {
            if self.ntfy.topic_generated {
                tracing::info!("Generated new ntfy.sh topic ID: {}", self.ntfy.topic_id);
            }
            tracing::info!("ntfy.sh notifications are enabled. Topic ID: {}", self.ntfy.topic_id);
            tracing::info!("Subscribe to notifications at: {}", self.ntfy.subscribe_url());
        }

        if self.pushover.enabled {
            tracing::info!(
                "Pushover notifications are enabled for {} user(s)",
                self.pushover.user_keys.len()
            );
        }

        if self.uptime_kuma.enabled {
            tracing::info!("Uptime Kuma integration is enabled");
        }
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value; blanks and `YOUR_...` placeholders count as unset
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty() && !v.starts_with("YOUR_"))
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    fn parse_bool(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                key,
                reason: format!("'{}' is not a boolean", raw),
            }),
            None => Ok(default),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
