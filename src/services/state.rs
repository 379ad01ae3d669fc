use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Wall-clock format used for `last_check` on disk and in alerts
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Persisted record of the last successful balance check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorState {
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub previous_balance: Option<Decimal>,
    #[serde(default, rename = "last_check", with = "check_time")]
    pub last_check_time: Option<NaiveDateTime>,
}

impl MonitorState {
    /// Record a successful fetch
    pub fn record(&mut self, balance: Decimal, at: NaiveDateTime) {
        self.previous_balance = Some(balance);
        self.last_check_time = Some(at);
    }
}

mod check_time {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(at) => serializer.serialize_some(&at.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Single-writer JSON store for [`MonitorState`].
///
/// Each save is one `fs::write` of the whole document, so a crash mid-write
/// can leave a truncated file; the next `load` then falls back to an empty
/// state. Only one process may point at a given state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state, never failing.
    ///
    /// A missing or unreadable file yields an empty state, which is written
    /// back on a best-effort basis.
    pub fn load(&self) -> MonitorState {
        if !self.path.exists() {
            tracing::info!("State file not found. Creating new state.");
            let state = MonitorState::default();
            match self.try_save(&state) {
                Ok(()) => tracing::info!("Empty state file created at {}", self.path.display()),
                Err(e) => tracing::error!("Error creating initial state file: {}", e),
            }
            return state;
        }

        match self.try_load() {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("Error loading state file {}: {}", self.path.display(), e);
                let state = MonitorState::default();
                if let Err(e) = self.try_save(&state) {
                    tracing::error!("Error resetting state file: {}", e);
                }
                state
            }
        }
    }

    /// Persist state; failures are logged and the caller keeps its copy
    pub fn save(&self, state: &MonitorState) {
        match self.try_save(state) {
            Ok(()) => tracing::debug!("State saved successfully"),
            Err(e) => tracing::error!("Error saving state to {}: {}", self.path.display(), e),
        }
    }

    pub fn try_load(&self) -> Result<MonitorState, StateError> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn try_save(&self, state: &MonitorState) -> Result<(), StateError> {
        let raw = serde_json::to_string(state)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
