use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use crate::services::balance::{BalanceSource, FetchError, WatchTarget};
use crate::services::retry::{RetryError, RetryPolicy};

/// Wraps a [`BalanceSource`] with a bounded, fixed-delay retry loop
pub struct BalanceFetcher {
    source: Arc<dyn BalanceSource>,
    target: WatchTarget,
    policy: RetryPolicy,
}

impl BalanceFetcher {
    pub fn new(
        source: Arc<dyn BalanceSource>,
        target: WatchTarget,
        max_retries: u32,
        retry_interval: Duration,
    ) -> Self {
        Self {
            source,
            target,
            policy: RetryPolicy::new(max_retries, retry_interval),
        }
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    pub fn max_retries(&self) -> u32 {
        self.policy.retry_count
    }

    /// Fetch the balance, making at most `max_retries + 1` calls.
    ///
    /// On exhaustion only the last attempt's error is reported.
    pub async fn fetch_with_retry(&self) -> Result<Decimal, RetryError<FetchError>> {
        let source = &self.source;
        let target = &self.target;

        let result = self
            .policy
            .run("balance fetch", move |_| async move {
                source
                    .get_balance(&target.address, &target.contract, &target.api_key)
                    .await
            })
            .await;

        match &result {
            Ok(balance) => tracing::info!("Current balance: {}", balance),
            Err(e) => tracing::error!(
                "Balance fetch failed after {} attempts: {}",
                e.attempts,
                e.last_error
            ),
        }

        result
    }
}
