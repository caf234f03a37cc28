pub mod handlers;
pub mod state;

use std::path::Path;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::{Context, Result};

pub use state::AppState;

/// API routes, registered ahead of the static fallback.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(handlers::api_health))
        .route("/api/metrics", get(handlers::api_metrics))
}

/// Full application: API routes first, then a catch-all that serves the built
/// single-page app and answers unknown paths with its `index.html`.
pub fn app(state: Arc<AppState>, static_dir: &Path) -> Router {
    let spa = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .merge(api_router())
        .fallback_service(spa)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(addr: &str, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install Ctrl+C handler: {}", err);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received, stopping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::request::tests::FakeApi;
    use serde_json::{json, Value};
    use std::path::PathBuf;

    fn static_fixture(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "stock-momentum-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(dir.join("assets")).unwrap();
        std::fs::write(dir.join("index.html"), "<div id=\"root\"></div>").unwrap();
        std::fs::write(dir.join("assets/app.js"), "console.log('ok');").unwrap();
        dir
    }

    async fn spawn_app(static_dir: &Path) -> String {
        let api = Arc::new(FakeApi::new(json!({}), json!({})));
        let router = app(AppState::new(api), static_dir);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn api_routes_take_precedence_over_spa_fallback() {
        let dir = static_fixture("routes");
        let base = spawn_app(&dir).await;
        let client = reqwest::Client::new();

        let response = client
            .get(format!("{base}/api/metrics"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "symbol is required");

        let health: Value = client
            .get(format!("{base}/api/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
    }

    #[tokio::test]
    async fn malformed_metrics_query_gets_json_error() {
        let dir = static_fixture("query");
        let base = spawn_app(&dir).await;

        let response = reqwest::Client::new()
            .get(format!("{base}/api/metrics?symbol=a&symbol=b"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400);
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(
            content_type.starts_with("application/json"),
            "unexpected content type: {content_type}"
        );
        let body: Value = response.json().await.unwrap();
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("symbol"), "unexpected message: {message}");
    }

    #[tokio::test]
    async fn unknown_paths_serve_the_entry_document() {
        let dir = static_fixture("spa");
        let base = spawn_app(&dir).await;
        let client = reqwest::Client::new();

        let asset = client
            .get(format!("{base}/assets/app.js"))
            .send()
            .await
            .unwrap();
        assert_eq!(asset.status().as_u16(), 200);
        assert_eq!(asset.text().await.unwrap(), "console.log('ok');");

        let deep_link = client
            .get(format!("{base}/symbols/AAPL"))
            .send()
            .await
            .unwrap();
        assert_eq!(deep_link.status().as_u16(), 200);
        assert!(deep_link.text().await.unwrap().contains("id=\"root\""));
    }
}
