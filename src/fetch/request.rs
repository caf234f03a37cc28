use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::{AppError, Context};

use super::auth::TokenCache;
use super::FetchResult;

pub const QUOTES_PATH: &str = "/marketdata/v1/quotes";
pub const PRICE_HISTORY_PATH: &str = "/marketdata/v1/pricehistory";
/// Trading days of daily candles requested per symbol.
pub const HISTORY_PERIOD_DAYS: u32 = 30;

/// Read access to the market-data API.
///
/// `quotes` and `price_history` are expressed in terms of `get`, so an
/// implementation only has to provide the raw request.
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> FetchResult<Value>;

    async fn quotes(&self, symbol: &str) -> FetchResult<Value> {
        self.get(QUOTES_PATH, &[("symbols", symbol.to_string())])
            .await
    }

    async fn price_history(&self, symbol: &str) -> FetchResult<Value> {
        self.get(
            PRICE_HISTORY_PATH,
            &[
                ("symbol", symbol.to_string()),
                ("periodType", "day".to_string()),
                ("period", HISTORY_PERIOD_DAYS.to_string()),
                ("frequencyType", "daily".to_string()),
                ("frequency", "1".to_string()),
                ("needExtendedHoursData", "false".to_string()),
            ],
        )
        .await
    }
}

/// Authenticated GET client for the Schwab market-data endpoints.
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    tokens: Arc<TokenCache>,
}

impl UpstreamClient {
    pub fn new(client: Client, base_url: &str, tokens: Arc<TokenCache>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }
}

#[async_trait]
impl MarketDataApi for UpstreamClient {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> FetchResult<Value> {
        let token = self.tokens.token().await?;
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("{} returned status {}", path, status);
            return Err(AppError::UpstreamRequest {
                status: status.as_u16(),
                path: path.to_string(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", path))?;

        let value: Value = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse JSON from {}", path))?;
        Ok(value)
    }
}

/// Build the shared HTTP client with the request timeout applied.
pub fn build_http_client(timeout: std::time::Duration) -> FetchResult<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to construct HTTP client")?)
}
