use crate::error::Result;

pub mod auth;
pub mod decode;
pub mod history;
pub mod request;
pub mod snapshots;

pub use auth::{OAuthRefresher, Token, TokenCache, TokenRefresher};
pub use decode::QuoteSnapshot;
pub use history::{fetch_daily_history, Candle, HistoryFetch};
pub use request::{build_http_client, MarketDataApi, UpstreamClient};
pub use snapshots::{fetch_quote, QuoteFetch};

pub type FetchResult<T> = Result<T>;
