use std::process::ExitCode;
use std::sync::Arc;

use stock_momentum::config::Config;
use stock_momentum::fetch::{build_http_client, OAuthRefresher, TokenCache, UpstreamClient};
use stock_momentum::server::{self, AppState};
use stock_momentum::Result;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    match Config::load_dotenv() {
        Some(path) => log::info!("Loaded environment from {}", path.display()),
        None => log::debug!("No .env file found; using process environment"),
    }
    let config = Config::from_env()?;
    log::info!(
        "Using Schwab API at {} with client {}",
        config.api_base,
        config.credentials.client_id
    );

    let http = build_http_client(config.upstream_timeout)?;
    let refresher = OAuthRefresher::new(http.clone(), &config.api_base, config.credentials.clone());
    let tokens = Arc::new(TokenCache::new(Box::new(refresher)));
    let api = Arc::new(UpstreamClient::new(http, &config.api_base, tokens));

    if !config.static_dir.join("index.html").exists() {
        log::warn!(
            "No built frontend found in {}; only the API will respond",
            config.static_dir.display()
        );
    }

    let app = server::app(AppState::new(api), &config.static_dir);
    server::serve(&config.listen_addr(), app).await
}
