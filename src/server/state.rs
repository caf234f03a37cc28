use std::sync::Arc;

use crate::fetch::MarketDataApi;

/// Shared application state, handed to route handlers via `axum::extract::State`.
pub struct AppState {
    pub api: Arc<dyn MarketDataApi>,
}

impl AppState {
    pub fn new(api: Arc<dyn MarketDataApi>) -> Arc<Self> {
        Arc::new(Self { api })
    }
}
