use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.schwabapi.com";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_STATIC_DIR: &str = "web/dist";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// OAuth client registration used to mint access tokens.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Process configuration, sourced from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub api_base: String,
    pub bind: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub upstream_timeout: Duration,
}

impl Config {
    /// Load variables from a `.env` file in the working directory (or a parent)
    /// into the process environment. Variables already set are left alone.
    pub fn load_dotenv() -> Option<PathBuf> {
        dotenvy::dotenv().ok()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Every missing required variable is reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| -> Option<String> {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut missing = Vec::new();
        let mut required = |name: &'static str| -> String {
            read(name).unwrap_or_else(|| {
                missing.push(name);
                String::new()
            })
        };

        let credentials = Credentials {
            client_id: required("SCHWAB_CLIENT_ID"),
            client_secret: required("SCHWAB_CLIENT_SECRET"),
            redirect_uri: required("SCHWAB_REDIRECT_URI"),
            refresh_token: required("SCHWAB_REFRESH_TOKEN"),
        };

        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "missing Schwab OAuth environment variables: {} (see .env.example)",
                missing.join(", ")
            )));
        }

        let port = match read("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::Config(format!("PORT must be a port number, got `{raw}`")))?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match read("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                AppError::Config(format!(
                    "UPSTREAM_TIMEOUT_SECS must be a whole number of seconds, got `{raw}`"
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            credentials,
            api_base: read("SCHWAB_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            bind: read("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port,
            static_dir: PathBuf::from(
                read("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            ),
            upstream_timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
