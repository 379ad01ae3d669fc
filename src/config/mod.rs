pub mod channels;
pub mod environment;

pub use channels::{NtfySettings, PushoverSettings, UptimeKumaSettings};
pub use environment::{Config, ConfigError, DEFAULT_TOKEN_CONTRACT};
