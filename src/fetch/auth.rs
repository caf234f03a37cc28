use std::fmt::Debug;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::Credentials;
use crate::error::{AppError, Context, Result};

const TOKEN_PATH: &str = "/v1/oauth/token";
/// Tokens are treated as stale this long before their reported expiry.
pub const TOKEN_MARGIN: Duration = Duration::from_secs(15);
const DEFAULT_EXPIRES_IN_SECS: u64 = 1700;

/// A short-lived bearer token and the instant it stops being valid.
#[derive(Clone)]
pub struct Token {
    pub value: String,
    pub expires_at: Instant,
}

impl Token {
    pub fn new<T: Into<String>>(value: T, lifetime: Duration) -> Self {
        Self {
            value: value.into(),
            expires_at: Instant::now() + lifetime,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        match self.expires_at.checked_sub(TOKEN_MARGIN) {
            Some(stale_at) => now < stale_at,
            None => false,
        }
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Exchanges a long-lived credential for a new access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self) -> Result<Token>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Refresh-token grant against the Schwab OAuth endpoint.
pub struct OAuthRefresher {
    client: Client,
    token_url: String,
    credentials: Credentials,
}

impl OAuthRefresher {
    pub fn new(client: Client, api_base: &str, credentials: Credentials) -> Self {
        Self {
            client,
            token_url: format!("{}{}", api_base.trim_end_matches('/'), TOKEN_PATH),
            credentials,
        }
    }
}

#[async_trait]
impl TokenRefresher for OAuthRefresher {
    async fn refresh(&self) -> Result<Token> {
        let creds = &self.credentials;
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", creds.refresh_token.as_str()),
                ("client_id", creds.client_id.as_str()),
                ("redirect_uri", creds.redirect_uri.as_str()),
            ])
            .send()
            .await
            .context("Failed to request Schwab token refresh")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamAuth {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Schwab token response")?;

        let lifetime = Duration::from_secs(parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));
        Ok(Token::new(parsed.access_token, lifetime))
    }
}

/// Holds the single cached access token for the process.
///
/// The lock is held for the duration of a refresh, so callers that arrive
/// while one is in flight wait for it and reuse its result instead of issuing
/// their own upstream call.
pub struct TokenCache {
    refresher: Box<dyn TokenRefresher>,
    state: Mutex<Option<Token>>,
}

impl TokenCache {
    pub fn new(refresher: Box<dyn TokenRefresher>) -> Self {
        Self {
            refresher,
            state: Mutex::new(None),
        }
    }

    pub fn with_token(refresher: Box<dyn TokenRefresher>, token: Token) -> Self {
        Self {
            refresher,
            state: Mutex::new(Some(token)),
        }
    }

    pub async fn token(&self) -> Result<String> {
        let mut guard = self.state.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.is_fresh(Instant::now()) {
                log::debug!("Reusing cached access token");
                return Ok(token.value.clone());
            }
        }

        log::info!("Refreshing Schwab access token");
        let token = match self.refresher.refresh().await {
            Ok(token) => token,
            Err(err) => {
                log::warn!("Failed to refresh Schwab access token: {}", err);
                *guard = None;
                return Err(err);
            }
        };

        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }
}
