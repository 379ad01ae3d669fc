use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use crate::services::balance::{BalanceSource, FetchError};

pub const DEFAULT_ETHERSCAN_URL: &str = "https://api.etherscan.io/api";

/// Etherscan `tokenbalance` client
pub struct EtherscanClient {
    client: Client,
    base_url: String,
    decimals: u32,
}

#[derive(Debug, Deserialize)]
struct TokenBalanceResponse {
    status: String,
    message: Option<String>,
    result: Option<String>,
}

impl EtherscanClient {
    pub fn new(base_url: impl Into<String>, decimals: u32) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into(),
            decimals,
        }
    }
}

impl Default for EtherscanClient {
    fn default() -> Self {
        // USDT uses 6 decimal places
        Self::new(DEFAULT_ETHERSCAN_URL, 6)
    }
}

#[async_trait]
impl BalanceSource for EtherscanClient {
    async fn get_balance(
        &self,
        address: &str,
        contract: &str,
        api_key: &str,
    ) -> Result<Decimal, FetchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("module", "account"),
                ("action", "tokenbalance"),
                ("contractaddress", contract),
                ("address", address),
                ("tag", "latest"),
                ("apikey", api_key),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let body: TokenBalanceResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        if body.status != "1" {
            let detail = match (body.message, body.result) {
                (Some(message), Some(result)) if !result.is_empty() => {
                    format!("{}: {}", message, result)
                }
                (Some(message), _) => message,
                (None, Some(result)) => result,
                (None, None) => "Unknown API error".to_string(),
            };
            tracing::error!("Etherscan API error: {}", detail);
            return Err(FetchError::Api(detail));
        }

        let raw = body
            .result
            .ok_or_else(|| FetchError::Parse("Missing result".to_string()))?;

        from_base_units(&raw, self.decimals)
    }
}

/// Convert an integer amount in base units into a decimal token amount
pub fn from_base_units(raw: &str, decimals: u32) -> Result<Decimal, FetchError> {
    let units: i128 = raw
        .trim()
        .parse()
        .map_err(|e| FetchError::Parse(format!("Invalid balance '{}': {}", raw, e)))?;

    Decimal::try_from_i128_with_scale(units, decimals)
        .map(|d| d.normalize())
        .map_err(|e| FetchError::Parse(format!("Balance out of range '{}': {}", raw, e)))
}
