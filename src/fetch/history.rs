use serde_json::Value;

use super::decode::extract_candles;
use super::request::MarketDataApi;
use super::FetchResult;

/// One trading day of price history. Only the fields the metrics use are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub close: f64,
    pub volume: u64,
    /// Epoch milliseconds, used only for ordering.
    pub datetime: Option<i64>,
}

impl Candle {
    pub fn new(close: f64, volume: u64) -> Self {
        Self {
            close,
            volume,
            datetime: None,
        }
    }

    pub fn at(self, datetime: i64) -> Self {
        Self {
            datetime: Some(datetime),
            ..self
        }
    }
}

/// Raw history payload alongside the candles decoded from it.
#[derive(Debug, Clone)]
pub struct HistoryFetch {
    pub raw: Value,
    pub candles: Vec<Candle>,
}

pub async fn fetch_daily_history(
    api: &dyn MarketDataApi,
    symbol: &str,
) -> FetchResult<HistoryFetch> {
    let raw = api.price_history(symbol).await?;
    let candles = extract_candles(&raw);
    log::debug!("Decoded {} daily candles for {}", candles.len(), symbol);
    Ok(HistoryFetch { raw, candles })
}
