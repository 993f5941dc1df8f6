//! Request middleware for body limits and rate limiting
//!
//! The credential endpoints (register, login) are rate limited per peer to
//! slow down password guessing. Everything else only gets the body limit.

use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Maximum body size: 64 KiB
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Burst: 20 requests in 10 seconds
pub const RATE_LIMIT_BURST_REQUESTS: usize = 20;
pub const RATE_LIMIT_BURST_WINDOW: Duration = Duration::from_secs(10);

/// Sustained: 100 requests per minute
pub const RATE_LIMIT_SUSTAINED_REQUESTS: usize = 100;
pub const RATE_LIMIT_SUSTAINED_WINDOW: Duration = Duration::from_secs(60);

/// Per-peer sliding-window rate limiter
#[derive(Clone, Default)]
pub struct RateLimiter {
    peer_requests: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request from `peer` and report whether it is allowed.
    ///
    /// Both tiers must pass:
    /// - Burst: 20 requests in 10 seconds
    /// - Sustained: 100 requests in 60 seconds
    pub async fn check_peer(&self, peer: &str) -> bool {
        let mut requests = self.peer_requests.write().await;
        let peer_reqs = requests.entry(peer.to_string()).or_default();
        let now = Instant::now();

        let burst_count = peer_reqs
            .iter()
            .filter(|&&ts| now.duration_since(ts) < RATE_LIMIT_BURST_WINDOW)
            .count();
        if burst_count >= RATE_LIMIT_BURST_REQUESTS {
            warn!(
                "Peer burst rate limit exceeded for: {} ({}/{})",
                peer, burst_count, RATE_LIMIT_BURST_REQUESTS
            );
            return false;
        }

        let sustained_count = peer_reqs
            .iter()
            .filter(|&&ts| now.duration_since(ts) < RATE_LIMIT_SUSTAINED_WINDOW)
            .count();
        if sustained_count >= RATE_LIMIT_SUSTAINED_REQUESTS {
            warn!(
                "Peer sustained rate limit exceeded for: {} ({}/{})",
                peer, sustained_count, RATE_LIMIT_SUSTAINED_REQUESTS
            );
            return false;
        }

        peer_reqs.retain(|&ts| now.duration_since(ts) < RATE_LIMIT_SUSTAINED_WINDOW);
        peer_reqs.push(now);
        true
    }

    /// Requests currently tracked for `peer`
    pub async fn peer_request_count(&self, peer: &str) -> usize {
        let requests = self.peer_requests.read().await;
        requests.get(peer).map(|v| v.len()).unwrap_or(0)
    }

    /// Drop peers with no requests inside the sustained window
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut requests = self.peer_requests.write().await;
        requests.retain(|_, timestamps| {
            timestamps.retain(|&ts| now.duration_since(ts) < RATE_LIMIT_SUSTAINED_WINDOW);
            !timestamps.is_empty()
        });
        debug!("Rate limiter cleanup: {} active peers", requests.len());
    }
}

/// Reject requests whose Content-Length exceeds MAX_BODY_SIZE
pub async fn body_size_limit(request: Request, next: Next) -> Result<Response, ApiError> {
    let declared = request
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Some(length) = declared {
        if length > MAX_BODY_SIZE {
            warn!("Request body too large: {} bytes (max: {})", length, MAX_BODY_SIZE);
            return Err(ApiError::PayloadTooLarge);
        }
    }

    Ok(next.run(request).await)
}

/// Per-peer rate limit for the credential endpoints
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = peer_addr(&request, state.config.server.trust_forwarded_for);

    if !state.rate_limiter.check_peer(&peer).await {
        return Err(ApiError::RateLimited);
    }

    Ok(next.run(request).await)
}

/// Peer address: the socket address, or the first X-Forwarded-For hop when
/// the deployment sits behind a trusted proxy
fn peer_addr(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn test_peer_burst_limit() {
        let limiter = RateLimiter::new();

        for i in 1..=RATE_LIMIT_BURST_REQUESTS {
            assert!(
                limiter.check_peer("127.0.0.1").await,
                "Request {} should succeed within burst limit",
                i
            );
        }

        assert!(!limiter.check_peer("127.0.0.1").await);

        // Different peer should succeed
        assert!(limiter.check_peer("127.0.0.2").await);
    }

    #[tokio::test]
    async fn test_rejected_requests_not_recorded() {
        let limiter = RateLimiter::new();
        for _ in 0..RATE_LIMIT_BURST_REQUESTS + 5 {
            limiter.check_peer("10.0.0.1").await;
        }
        assert_eq!(
            limiter.peer_request_count("10.0.0.1").await,
            RATE_LIMIT_BURST_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent() {
        let limiter = RateLimiter::new();
        for i in 0..5 {
            limiter.check_peer(&format!("127.0.0.{}", i)).await;
        }

        limiter.cleanup().await;

        let requests = limiter.peer_requests.read().await;
        assert_eq!(requests.len(), 5);
    }

    fn forwarded_request(addr: [u8; 4]) -> Request {
        axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .extension(ConnectInfo(SocketAddr::from((addr, 40000))))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_peer_addr_ignores_forwarded_for_by_default() {
        let request = forwarded_request([192, 168, 1, 9]);
        assert_eq!(peer_addr(&request, false), "192.168.1.9");
    }

    #[test]
    fn test_peer_addr_trusted_forwarded_for() {
        let request = forwarded_request([127, 0, 0, 1]);
        assert_eq!(peer_addr(&request, true), "203.0.113.7");

        let blank = axum::http::Request::builder()
            .header("x-forwarded-for", " ")
            .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
            .body(Body::empty())
            .unwrap();
        assert_eq!(peer_addr(&blank, true), "127.0.0.1");
    }

    #[test]
    fn test_peer_addr_without_connect_info() {
        let request = axum::http::Request::builder().body(Body::empty()).unwrap();
        assert_eq!(peer_addr(&request, false), "unknown");
    }
}
