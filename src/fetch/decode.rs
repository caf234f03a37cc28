use serde_json::{Map, Value};

use super::history::Candle;

const PRICE_FIELDS: &[&str] = &["lastPrice", "mark", "regularMarketLastPrice", "close"];
const VOLUME_FIELDS: &[&str] = &["totalVolume", "volume"];

/// Today's price and volume as reported by the quotes endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSnapshot {
    pub last_price: Option<f64>,
    pub total_volume: Option<u64>,
}

impl QuoteSnapshot {
    /// Both fields present and positive.
    pub fn complete(&self) -> Option<(f64, u64)> {
        match (self.last_price, self.total_volume) {
            (Some(price), Some(volume)) if price > 0.0 && volume > 0 => Some((price, volume)),
            _ => None,
        }
    }
}

type QuoteLocator = for<'a> fn(&'a Value, &str) -> Option<&'a Map<String, Value>>;

/// Shapes the quotes endpoint has been seen to return, most specific first.
const QUOTE_LOCATORS: &[QuoteLocator] = &[keyed_by_symbol, first_in_quotes_array, flat_object];

fn non_empty(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object().filter(|map| !map.is_empty())
}

fn keyed_by_symbol<'a>(root: &'a Value, symbol: &str) -> Option<&'a Map<String, Value>> {
    root.get(symbol).and_then(non_empty)
}

fn first_in_quotes_array<'a>(root: &'a Value, _symbol: &str) -> Option<&'a Map<String, Value>> {
    root.get("quotes")
        .and_then(Value::as_array)
        .and_then(|quotes| quotes.first())
        .and_then(non_empty)
}

fn flat_object<'a>(root: &'a Value, _symbol: &str) -> Option<&'a Map<String, Value>> {
    non_empty(root)
}

/// Locate the quote entry for `symbol` and pull out price and volume.
///
/// Schwab nests the figures under a `quote` object; flat entries are read
/// directly.
pub fn extract_quote(root: &Value, symbol: &str) -> QuoteSnapshot {
    let Some(entry) = QUOTE_LOCATORS
        .iter()
        .find_map(|locate| locate(root, symbol))
    else {
        return QuoteSnapshot {
            last_price: None,
            total_volume: None,
        };
    };

    let nested = entry.get("quote").and_then(Value::as_object);
    let scopes: Vec<&Map<String, Value>> = nested.into_iter().chain(Some(entry)).collect();

    let first_number = |fields: &[&str]| -> Option<f64> {
        scopes.iter().find_map(|scope| {
            fields
                .iter()
                .find_map(|field| scope.get(*field).and_then(parse_number))
        })
    };

    QuoteSnapshot {
        last_price: first_number(PRICE_FIELDS),
        total_volume: first_number(VOLUME_FIELDS)
            .filter(|volume| *volume >= 0.0)
            .map(|volume| volume.round() as u64),
    }
}

/// Daily candles from a price-history payload, oldest first.
///
/// Rows without a usable close are skipped; a missing volume counts as zero.
pub fn extract_candles(root: &Value) -> Vec<Candle> {
    let rows = root
        .get("candles")
        .and_then(Value::as_array)
        .or_else(|| {
            root.get("data")
                .and_then(|data| data.get("candles"))
                .and_then(Value::as_array)
        });

    let Some(rows) = rows else {
        return Vec::new();
    };

    let mut candles: Vec<Candle> = rows
        .iter()
        .filter_map(|row| {
            let close = row
                .get("close")
                .or_else(|| row.get("closePrice"))
                .and_then(parse_number)?;
            let volume = row
                .get("volume")
                .and_then(parse_number)
                .filter(|v| *v >= 0.0)
                .map(|v| v.round() as u64)
                .unwrap_or(0);
            let candle = Candle::new(close, volume);
            Some(match row.get("datetime").and_then(Value::as_i64) {
                Some(datetime) => candle.at(datetime),
                None => candle,
            })
        })
        .collect();

    if candles.iter().all(|candle| candle.datetime.is_some()) {
        candles.sort_by_key(|candle| candle.datetime);
    }

    candles
}

pub fn parse_number(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|n| n.is_finite())
}
