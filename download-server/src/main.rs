mod config;
mod handlers;
mod images;
mod proxy;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::info;

use media_resolver::{request::BROWSER_USER_AGENT, MediaResolver};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub resolver: Arc<MediaResolver>,
    pub http_client: reqwest::Client,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "download_server=debug,media_resolver=debug,tower_http=info".to_string()),
        )
        .init();

    info!("Starting download server");

    let config = Arc::new(AppConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?);

    let http_client = reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()?;

    let state = AppState {
        config: config.clone(),
        resolver: Arc::new(MediaResolver::new()),
        http_client,
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Download server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::RANGE]);

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(state.config.body_limit_bytes))
        .layer(cors);

    Router::new()
        .route("/health", get(health))
        .route("/api/download", post(handlers::download))
        .route("/api/video", get(proxy::video))
        .route("/api/audio", get(proxy::audio))
        .route("/api/images", post(images::bundle))
        .layer(middleware_stack)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
