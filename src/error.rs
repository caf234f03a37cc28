use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("Token refresh failed: {status} {body}")]
    UpstreamAuth { status: u16, body: String },
    #[error("{path} failed: {status} {body}")]
    UpstreamRequest {
        status: u16,
        path: String,
        body: String,
    },
    #[error("Incomplete market data")]
    IncompleteData { raw: Value },
    #[error("{field} average over {window} days is zero")]
    DegenerateAverage { window: usize, field: &'static str },
    #[error("no candles to average")]
    EmptyHistory,
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::IncompleteData { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            AppError::IncompleteData { raw } => json!({
                "error": "Incomplete market data",
                "raw": raw,
            }),
            other => json!({ "error": other.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
