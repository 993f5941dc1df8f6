//! HTTP server for neond

use crate::auth::TokenIssuer;
use crate::middleware::{self, RateLimiter, MAX_BODY_SIZE, RATE_LIMIT_SUSTAINED_WINDOW};
use crate::routes;
use crate::store::AccountStore;
use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use neon_common::NeonConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    pub config: NeonConfig,
    /// Single writer: every account mutation is serialized through this lock
    pub store: Mutex<AccountStore>,
    pub tokens: TokenIssuer,
    pub rate_limiter: RateLimiter,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: NeonConfig, store: AccountStore, tokens: TokenIssuer) -> Self {
        Self {
            config,
            store: Mutex::new(store),
            tokens,
            rate_limiter: RateLimiter::new(),
            start_time: Instant::now(),
        }
    }
}

/// Build the full router
pub fn router(state: Arc<AppState>) -> Router {
    let credential_routes = routes::auth_routes().route_layer(
        axum::middleware::from_fn_with_state(state.clone(), middleware::rate_limit),
    );

    Router::new()
        .merge(credential_routes)
        .merge(routes::progress_routes())
        .merge(routes::health_routes())
        .fallback(routes::not_found)
        .layer(axum::middleware::from_fn(middleware::body_size_limit))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until Ctrl-C
pub async fn run(state: AppState) -> Result<()> {
    let state = Arc::new(state);
    let addr = state.config.server.bind_addr();
    let app = router(state.clone());

    let limiter = state.rate_limiter.clone();
    let cleanup = tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_SUSTAINED_WINDOW);
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("  Listening on http://{}/api", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cleanup.abort();
    info!("Shutting down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
