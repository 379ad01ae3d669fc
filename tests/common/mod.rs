use async_trait::async_trait;
use axum::Router;
use balance_sentinel::services::balance::{BalanceSource, FetchError, WatchTarget};
use balance_sentinel::services::notifier::{
    AlertMessage, AlertNotifier, ChannelReport, HealthReport, HealthReporter, RecipientOutcome,
};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

// Allow dead_code for utilities used by other test files
#[allow(dead_code)]
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[allow(dead_code)]
pub fn test_target() -> WatchTarget {
    WatchTarget {
        address: "0x742d35Cc6634C0532925a3b844Bc454e4438f44e".to_string(),
        contract: "0xdac17f958d2ee523a2206206994597c13d831ec7".to_string(),
        api_key: "test-api-key".to_string(),
    }
}

/// Unique path under the system temp dir; the file is not created
#[allow(dead_code)]
pub fn temp_state_path() -> PathBuf {
    std::env::temp_dir().join(format!("balance-sentinel-{}.json", uuid::Uuid::new_v4()))
}

/// Serve `router` on an ephemeral local port and return its base URL
#[allow(dead_code)]
pub async fn spawn_mock_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Balance source that replays a script, then repeats the fallback
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Decimal, String>>>,
    fallback: Result<Decimal, String>,
    calls: AtomicU32,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn always(balance: Decimal) -> Self {
        Self::new(vec![], Ok(balance))
    }

    pub fn always_failing(message: &str) -> Self {
        Self::new(vec![], Err(message.to_string()))
    }

    pub fn new(script: Vec<Result<Decimal, String>>, fallback: Result<Decimal, String>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceSource for ScriptedSource {
    async fn get_balance(&self, _: &str, _: &str, _: &str) -> Result<Decimal, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        next.map_err(FetchError::Api)
    }
}

/// Alert channel double that records every message it is handed
pub struct RecordingNotifier {
    name: &'static str,
    succeed: bool,
    pub messages: Mutex<Vec<AlertMessage>>,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn new(name: &'static str, succeed: bool) -> Self {
        Self {
            name,
            succeed,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<AlertMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertNotifier for RecordingNotifier {
    fn name(&self) -> &str {
        self.name
    }

    async fn deliver(&self, message: &AlertMessage) -> ChannelReport {
        self.messages.lock().unwrap().push(message.clone());
        let outcome = if self.succeed {
            RecipientOutcome::delivered("recipient", 1)
        } else {
            RecipientOutcome::failed("recipient", 1, "Status code: 500")
        };
        ChannelReport::new(self.name, vec![outcome])
    }
}

/// Alert channel that panics mid-delivery
pub struct PanickingNotifier;

#[async_trait]
impl AlertNotifier for PanickingNotifier {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn deliver(&self, _message: &AlertMessage) -> ChannelReport {
        panic!("channel blew up");
    }
}

/// Health reporter double
#[derive(Default)]
pub struct RecordingHealth {
    pub reports: Mutex<Vec<HealthReport>>,
}

#[allow(dead_code)]
impl RecordingHealth {
    pub fn received(&self) -> Vec<HealthReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl HealthReporter for RecordingHealth {
    fn name(&self) -> &str {
        "recording_health"
    }

    async fn report(&self, report: &HealthReport) -> ChannelReport {
        self.reports.lock().unwrap().push(report.clone());
        ChannelReport::new("recording_health", vec![RecipientOutcome::delivered("push", 1)])
    }
}
