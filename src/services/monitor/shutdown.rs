use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Longest uninterrupted sleep between shutdown checks
pub const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Cooperative "stop running" token.
///
/// Set once by the signal listener, observed by the scheduler between
/// cycles and at every sleep slice.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Sleep for `total` in slices of at most one second.
    ///
    /// Returns `false` if shutdown was requested before the full duration
    /// elapsed.
    pub async fn sleep(&self, total: Duration) -> bool {
        let mut remaining = total;

        while !remaining.is_zero() {
            if self.is_triggered() {
                return false;
            }
            let slice = remaining.min(SHUTDOWN_POLL_INTERVAL);
            tokio::time::sleep(slice).await;
            remaining -= slice;
        }

        !self.is_triggered()
    }

    /// Trigger on SIGINT, or SIGTERM on unix
    pub fn listen_for_os_signals(&self) -> JoinHandle<()> {
        let signal = self.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut stream) => {
                        stream.recv().await;
                    }
                    Err(e) => {
                        tracing::error!("Failed to listen for SIGTERM: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::info!("🛑 Received stop signal (SIGINT)"),
                _ = terminate => tracing::info!("🛑 Received stop signal (SIGTERM)"),
            }

            signal.trigger();
        })
    }
}
