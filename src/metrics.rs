use serde::{Serialize, Serializer};

use crate::error::{AppError, Result};
use crate::fetch::Candle;

/// Trailing windows reported for every symbol, in days.
pub const WINDOWS: [usize; 3] = [10, 20, 30];

/// Averages over one trailing window and today's value relative to them.
///
/// Values are kept at full precision; rounding is applied on serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowMetric {
    pub window: usize,
    #[serde(serialize_with = "round_4dp")]
    pub avg_close: f64,
    #[serde(serialize_with = "round_whole")]
    pub avg_volume: f64,
    #[serde(serialize_with = "round_4dp")]
    pub price_ratio: f64,
    #[serde(serialize_with = "round_4dp")]
    pub volume_ratio: f64,
}

/// Mean close and volume over the last `window` candles, or all of them when
/// fewer are available.
pub fn trailing_averages(candles: &[Candle], window: usize) -> Result<(f64, f64)> {
    if candles.is_empty() {
        return Err(AppError::EmptyHistory);
    }

    let start = candles.len().saturating_sub(window);
    let recent = &candles[start..];
    let count = recent.len() as f64;

    let close_sum: f64 = recent.iter().map(|c| c.close).sum();
    let volume_sum: f64 = recent.iter().map(|c| c.volume as f64).sum();

    Ok((close_sum / count, volume_sum / count))
}

pub fn compute_metrics(
    candles: &[Candle],
    today_price: f64,
    today_volume: u64,
) -> Result<Vec<WindowMetric>> {
    WINDOWS
        .iter()
        .map(|&window| {
            let (avg_close, avg_volume) = trailing_averages(candles, window)?;
            if avg_close == 0.0 {
                return Err(AppError::DegenerateAverage {
                    window,
                    field: "close",
                });
            }
            if avg_volume == 0.0 {
                return Err(AppError::DegenerateAverage {
                    window,
                    field: "volume",
                });
            }

            Ok(WindowMetric {
                window,
                avg_close,
                avg_volume,
                price_ratio: today_price / avg_close,
                volume_ratio: today_volume as f64 / avg_volume,
            })
        })
        .collect()
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn round_4dp<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 4))
}

fn round_whole<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_i64(value.round() as i64)
}
