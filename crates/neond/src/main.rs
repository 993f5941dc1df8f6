//! Neon Learn Daemon - progress tracking API
//!
//! Serves registration, login, lesson completion and progress over HTTP.

use anyhow::{Context, Result};
use neon_common::NeonConfig;
use neond::auth::{self, TokenIssuer};
use neond::server::{self, AppState};
use neond::store::AccountStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NeonConfig::load();

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Neon Learn Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let secret = match &config.auth.token_secret {
        Some(secret) => secret.clone(),
        None => {
            warn!("No token secret configured; tokens will not survive a restart");
            auth::generate_secret()
        }
    };
    let tokens = TokenIssuer::from_secret(&secret, config.auth.effective_token_ttl_days());

    let db_path = config.storage.db_path.clone();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let store = AccountStore::open_at(&db_path)
        .with_context(|| format!("opening account store {}", db_path.display()))?;
    info!("  Account store: {} ({} accounts)", db_path.display(), store.count()?);

    server::run(AppState::new(config, store, tokens)).await
}
