pub mod config;
pub mod services;

use std::sync::Arc;

use config::Config;
use services::balance::{BalanceFetcher, EtherscanClient};
use services::monitor::MonitorEngine;
use services::notifier::{NotificationDispatcher, NotifyError};
use services::state::StateStore;

/// Wire the Etherscan source, state file and enabled channels into an engine
pub fn create_engine(config: &Config) -> Result<MonitorEngine, NotifyError> {
    let source = Arc::new(EtherscanClient::new(
        config.etherscan_url.clone(),
        config.token_decimals,
    ));

    let fetcher = BalanceFetcher::new(
        source,
        config.watch_target(),
        config.max_retries,
        config.retry_interval,
    );

    let dispatcher = NotificationDispatcher::from_config(config)?;

    Ok(MonitorEngine::new(
        fetcher,
        StateStore::new(config.state_file.clone()),
        dispatcher,
        config.check_interval,
        config.token_symbol.clone(),
    ))
}
