use std::time::Duration;

use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use vox_portal::config;
use vox_portal::proxy::{self, ProxyState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up API_BASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!(
        "Starting Vox portal proxy in {:?} mode against {}",
        config.environment,
        config.proxy.upstream_base_url
    );

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("VOX_PROXY_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(4000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("Vox portal proxy listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(proxy::router(ProxyState::from_config()))
        .layer(TraceLayer::new_for_http())
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Vox Portal Proxy",
            "version": version,
            "description": "Reverse proxy between the admin portal and the Vox backend API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "proxy": "ALL /api/proxy/*path -> upstream (method, query, JSON body and Authorization preserved)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();
    let config = config::config();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.proxy.health_timeout_secs))
        .build()
        .unwrap_or_default();
    let url = format!("{}/health", config.proxy.upstream_base_url);

    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "upstream": "ok"
                }
            })),
        ),
        _ => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "upstream unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "upstream": url
                }
            })),
        ),
    }
}
