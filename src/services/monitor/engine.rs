use chrono::{Local, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use std::time::Duration;

use crate::services::balance::BalanceFetcher;
use crate::services::monitor::{detect, BalanceChange, ShutdownSignal};
use crate::services::notifier::{HealthReport, NotificationDispatcher};
use crate::services::state::{MonitorState, StateStore};

/// Lifecycle of the scheduler loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopping,
    Stopped,
}

/// Outcome of one fetch/compare/notify cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleResult {
    pub balance: Option<Decimal>,
    pub error: Option<String>,
    pub timestamp: NaiveDateTime,
    pub change: Option<BalanceChange>,
}

impl CycleResult {
    pub fn is_success(&self) -> bool {
        self.balance.is_some()
    }

    pub fn is_change(&self) -> bool {
        self.change.map(|c| c.changed).unwrap_or(false)
    }
}

/// Runs balance checks on a fixed interval until shutdown.
///
/// Cycles never overlap, so the in-memory state and the state file have a
/// single writer.
pub struct MonitorEngine {
    fetcher: BalanceFetcher,
    store: StateStore,
    state: MonitorState,
    dispatcher: NotificationDispatcher,
    check_interval: Duration,
    token_symbol: String,
    scheduler_state: SchedulerState,
}

impl MonitorEngine {
    /// Create the engine and load persisted state from `store`
    pub fn new(
        fetcher: BalanceFetcher,
        store: StateStore,
        dispatcher: NotificationDispatcher,
        check_interval: Duration,
        token_symbol: impl Into<String>,
    ) -> Self {
        let state = store.load();

        match state.previous_balance {
            Some(balance) => tracing::info!("Loaded previous balance: {}", balance),
            None => tracing::info!("No previous balance found in state file."),
        }

        Self {
            fetcher,
            store,
            state,
            dispatcher,
            check_interval,
            token_symbol: token_symbol.into(),
            scheduler_state: SchedulerState::Stopped,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler_state
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Run a single cycle.
    ///
    /// The health reporter is pinged whatever the outcome. State is only
    /// touched after a successful fetch, so a failed cycle leaves the last
    /// known balance in place for the next comparison.
    pub async fn run_cycle(&mut self) -> CycleResult {
        // Whole seconds, matching what the state file can hold
        let now = Local::now().naive_local();
        let timestamp = now.with_nanosecond(0).unwrap_or(now);

        let (balance, error) = match self.fetcher.fetch_with_retry().await {
            Ok(balance) => (Some(balance), None),
            Err(e) => (None, Some(e.last_error.to_string())),
        };

        let health = match (balance, error.as_deref()) {
            (Some(balance), _) => HealthReport::up(balance),
            (None, error) => HealthReport::down(error.unwrap_or("Unknown error")),
        };
        self.dispatcher.report_health(&health).await;

        let change = match balance {
            Some(current) => Some(self.apply_balance(current, timestamp).await),
            None => {
                tracing::error!(
                    "Failed to get balance after {} retries: {}",
                    self.fetcher.max_retries(),
                    error.as_deref().unwrap_or("Unknown error")
                );
                None
            }
        };

        CycleResult {
            balance,
            error,
            timestamp,
            change,
        }
    }

    async fn apply_balance(&mut self, current: Decimal, timestamp: NaiveDateTime) -> BalanceChange {
        let change = detect(self.state.previous_balance, current);

        // Saved even when unchanged so last_check stays fresh
        self.state.record(current, timestamp);
        self.store.save(&self.state);

        if let Some(alert) = change.alert_message(&self.token_symbol, timestamp) {
            tracing::info!(
                "{} balance changed: {} -> {} ({})",
                self.token_symbol,
                change.previous.unwrap_or_default(),
                change.current,
                change.delta
            );

            for report in self.dispatcher.broadcast_alert(&alert).await {
                if !report.is_success() {
                    tracing::warn!(
                        channel = %report.channel,
                        delivered = report.delivered_count(),
                        recipients = report.recipients.len(),
                        "Change alert not fully delivered"
                    );
                }
            }
        }

        change
    }

    /// Loop until `shutdown` is triggered, checking it at least once a second
    pub async fn run(&mut self, shutdown: &ShutdownSignal) {
        self.scheduler_state = SchedulerState::Running;
        tracing::info!(
            "Monitoring {} on {} every {:?}",
            self.token_symbol,
            self.fetcher.target().address,
            self.check_interval
        );

        while !shutdown.is_triggered() {
            self.run_cycle().await;

            if shutdown.is_triggered() {
                break;
            }

            let next_check = chrono::Duration::from_std(self.check_interval)
                .ok()
                .and_then(|delta| Local::now().checked_add_signed(delta));
            if let Some(next_check) = next_check {
                tracing::info!("Next check at {}", next_check.format("%H:%M:%S"));
            }

            if !shutdown.sleep(self.check_interval).await {
                break;
            }
        }

        self.scheduler_state = SchedulerState::Stopping;
        tracing::info!("Shutdown requested, stopping balance monitor");

        self.scheduler_state = SchedulerState::Stopped;
        tracing::info!("👋 Clean exit.");
    }
}
