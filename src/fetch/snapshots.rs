use serde_json::Value;

use super::decode::{extract_quote, QuoteSnapshot};
use super::request::MarketDataApi;
use super::FetchResult;

/// Raw quotes payload alongside the snapshot normalized from it.
#[derive(Debug, Clone)]
pub struct QuoteFetch {
    pub raw: Value,
    pub snapshot: QuoteSnapshot,
}

pub async fn fetch_quote(api: &dyn MarketDataApi, symbol: &str) -> FetchResult<QuoteFetch> {
    let raw = api.quotes(symbol).await?;
    let snapshot = extract_quote(&raw, symbol);
    if snapshot.last_price.is_none() {
        log::debug!("Quote payload for {} carried no price field", symbol);
    }
    Ok(QuoteFetch { raw, snapshot })
}
