use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::fetch::{fetch_daily_history, fetch_quote};
use crate::metrics::{compute_metrics, WindowMetric};
use crate::utils::{current_utc_timestamp, normalize_symbol};

use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    symbol: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub symbol: String,
    pub today_price: f64,
    pub today_volume: u64,
    pub metrics: Vec<WindowMetric>,
    pub last_updated: String,
}

pub async fn api_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn api_metrics(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<MetricsQuery>, QueryRejection>,
) -> Result<Json<MetricsResponse>> {
    let Query(q) = query.map_err(|rejection| {
        log::warn!("Rejected metrics query: {}", rejection.body_text());
        AppError::Validation(format!("invalid query string: {}", rejection.body_text()))
    })?;

    let symbol = match q.symbol.as_deref().and_then(normalize_symbol) {
        Some(symbol) => symbol,
        None => {
            log::warn!("Rejected metrics request without a symbol");
            return Err(AppError::Validation("symbol is required".to_string()));
        }
    };

    match build_metrics(&state, &symbol).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            log::error!("Metrics request for {} failed: {:?}", symbol, err);
            Err(err)
        }
    }
}

async fn build_metrics(state: &AppState, symbol: &str) -> Result<MetricsResponse> {
    let quote = fetch_quote(state.api.as_ref(), symbol).await?;
    let history = fetch_daily_history(state.api.as_ref(), symbol).await?;

    let incomplete = |quote_raw: Value, history_raw: Value| AppError::IncompleteData {
        raw: json!({ "quotes": quote_raw, "history": history_raw }),
    };

    let (today_price, today_volume) = match quote.snapshot.complete() {
        Some(pair) if !history.candles.is_empty() => pair,
        _ => return Err(incomplete(quote.raw, history.raw)),
    };

    let metrics = match compute_metrics(&history.candles, today_price, today_volume) {
        Ok(metrics) => metrics,
        Err(err @ AppError::DegenerateAverage { .. }) => {
            log::warn!("{} for {}", err, symbol);
            return Err(incomplete(quote.raw, history.raw));
        }
        Err(err) => return Err(err),
    };

    log::info!(
        "Computed {} windows for {} from {} candles",
        metrics.len(),
        symbol,
        history.candles.len()
    );

    Ok(MetricsResponse {
        symbol: symbol.to_string(),
        today_price,
        today_volume,
        metrics,
        last_updated: current_utc_timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::request::tests::FakeApi;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn history_with_closes(closes: &[f64]) -> Value {
        let candles: Vec<Value> = closes
            .iter()
            .enumerate()
            .map(|(i, close)| {
                json!({
                    "open": close,
                    "high": close,
                    "low": close,
                    "close": close,
                    "volume": 500_000,
                    "datetime": 1_700_000_000_000_i64 + i as i64 * 86_400_000,
                })
            })
            .collect();
        json!({ "symbol": "AAPL", "empty": false, "candles": candles })
    }

    async fn call(api: Arc<FakeApi>, symbol: Option<&str>) -> (StatusCode, Value) {
        let state = AppState::new(api);
        let query = MetricsQuery {
            symbol: symbol.map(str::to_string),
        };
        let response = api_metrics(State(state), Ok(Query(query))).await.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn computes_windows_from_quote_and_history() {
        let mut closes = vec![100.0; 29];
        closes.push(200.0);
        let api = Arc::new(FakeApi::new(
            json!({"AAPL": {"lastPrice": 150, "totalVolume": 1_000_000}}),
            history_with_closes(&closes),
        ));

        let (status, body) = call(Arc::clone(&api), Some("aapl")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "AAPL");
        assert_eq!(body["todayPrice"], 150.0);
        assert_eq!(body["todayVolume"], 1_000_000);
        assert!(body["lastUpdated"].as_str().unwrap().ends_with('Z'));

        let metrics = body["metrics"].as_array().unwrap();
        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[0]["window"], 10);
        assert_eq!(metrics[0]["avgClose"], 110.0);
        assert_eq!(metrics[0]["avgVolume"], 500_000);
        assert_eq!(metrics[0]["priceRatio"], 1.3636);
        assert_eq!(metrics[0]["volumeRatio"], 2.0);
        assert_eq!(metrics[2]["window"], 30);
        assert_eq!(metrics[2]["avgClose"], 103.3333);
        assert_eq!(api.request_count(), 2);
    }

    #[tokio::test]
    async fn missing_symbol_is_rejected_without_upstream_calls() {
        let api = Arc::new(FakeApi::new(json!({}), json!({})));

        let (status, body) = call(Arc::clone(&api), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "symbol is required"}));

        let (status, _) = call(Arc::clone(&api), Some("  ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(api.request_count(), 0);
    }

    #[tokio::test]
    async fn incomplete_upstream_data_returns_raw_payloads() {
        let history = json!({"candles": [], "symbol": "AAPL", "empty": true});
        let api = Arc::new(FakeApi::new(json!({}), history.clone()));

        let (status, body) = call(api, Some("AAPL")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Incomplete market data");
        assert_eq!(body["raw"]["quotes"], json!({}));
        assert_eq!(body["raw"]["history"], history);
    }

    #[tokio::test]
    async fn zero_average_close_is_incomplete() {
        let api = Arc::new(FakeApi::new(
            json!({"AAPL": {"lastPrice": 10, "totalVolume": 5}}),
            history_with_closes(&[0.0, 0.0]),
        ));

        let (status, body) = call(api, Some("AAPL")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.get("raw").is_some());
    }

    #[tokio::test]
    async fn token_rejection_surfaces_as_internal_error() {
        let mut api = FakeApi::new(json!({}), json!({}));
        api.quotes = Err(AppError::UpstreamAuth {
            status: 401,
            body: "invalid_client".to_string(),
        });

        let (status, body) = call(Arc::new(api), Some("AAPL")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("401"), "unexpected message: {message}");
        assert!(body.get("raw").is_none());
    }
}
