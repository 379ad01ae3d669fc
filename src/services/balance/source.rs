use async_trait::async_trait;
use rust_decimal::Decimal;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A ledger endpoint that can report the token balance of an address.
///
/// Implementations own their network timeout; callers only see success or a
/// failure message.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn get_balance(
        &self,
        address: &str,
        contract: &str,
        api_key: &str,
    ) -> Result<Decimal, FetchError>;
}

/// The single address/token pair watched by one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub address: String,
    pub contract: String,
    pub api_key: String,
}
