//! API routes for neond
//!
//! - `POST /api/register`, `POST /api/login`: credentials in, token out
//! - `GET /api/progress`, `POST /api/lesson/complete`: bearer token required
//! - `GET /api/health`: liveness probe

use crate::auth::{self, AuthUser};
use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use neon_common::{
    AuthResponse, CompleteLessonRequest, CompleteLessonResponse, CredentialsRequest, ErrorResponse,
    HealthResponse, ProgressResponse, UserSummary,
};
use std::sync::Arc;
use tracing::info;

type AppStateArc = Arc<AppState>;

// ============================================================================
// Auth Routes
// ============================================================================

pub fn auth_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
}

/// Username and password from a request, both required
fn require_credentials(req: CredentialsRequest) -> Result<(String, String), ApiError> {
    let username = req
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    let password = req.password.filter(|p| !p.is_empty());

    match (username, password) {
        (Some(username), Some(password)) => Ok((username, password)),
        _ => Err(ApiError::validation("Username and password are required")),
    }
}

async fn register(
    State(state): State<AppStateArc>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(req) = payload?;
    let (username, password) = require_credentials(req)?;

    let min_len = state.config.auth.min_password_len;
    if password.chars().count() < min_len {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            min_len
        )));
    }

    if state.store.lock().await.find_by_username(&username)?.is_some() {
        return Err(ApiError::DuplicateUsername);
    }

    // keep bcrypt off the async workers
    let cost = state.config.auth.effective_bcrypt_cost();
    let hash = tokio::task::spawn_blocking(move || auth::hash_password(&password, cost)).await??;

    let account = state.store.lock().await.create_account(&username, &hash)?;
    info!("[R]  Registered {}", account.username);

    let token = state.tokens.issue(&account.id, &account.username);
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            token,
            user: UserSummary::new(&account.id, &account.username, &account.progress),
        }),
    ))
}

async fn login(
    State(state): State<AppStateArc>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;
    let (username, password) = require_credentials(req)?;

    let account = state
        .store
        .lock()
        .await
        .find_by_username(&username)?
        .ok_or(ApiError::InvalidCredentials)?;

    let hash = account.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash)).await??;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    info!("[L]  Login {}", account.username);
    let token = state.tokens.issue(&account.id, &account.username);
    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: UserSummary::new(&account.id, &account.username, &account.progress),
    }))
}

// ============================================================================
// Progress Routes
// ============================================================================

pub fn progress_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/progress", get(get_progress))
        .route("/api/lesson/complete", post(complete_lesson))
}

async fn get_progress(
    State(state): State<AppStateArc>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ProgressResponse>, ApiError> {
    let account = state
        .store
        .lock()
        .await
        .find_by_id(&claims.sub)?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(ProgressResponse::from(&account.progress)))
}

async fn complete_lesson(
    State(state): State<AppStateArc>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<CompleteLessonRequest>, JsonRejection>,
) -> Result<Json<CompleteLessonResponse>, ApiError> {
    let Json(req) = payload?;
    let lesson_id = req
        .lesson_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Lesson ID required"))?;

    let outcome = state
        .store
        .lock()
        .await
        .complete_lesson(&claims.sub, &lesson_id)?;

    if outcome.leveled_up {
        info!(
            "[S]  +{}XP  {} reached level {}",
            outcome.xp_earned, claims.username, outcome.progress.level
        );
    } else {
        info!(
            "[S]  +{}XP  {} completed {}",
            outcome.xp_earned, claims.username, lesson_id
        );
    }

    Ok(Json(CompleteLessonResponse {
        message: "Lesson completed successfully".to_string(),
        progress: ProgressResponse::from(&outcome.progress),
        xp_earned: outcome.xp_earned,
        leveled_up: outcome.leveled_up,
        new_level: outcome.new_level,
    }))
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/api/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Neon Learn backend is running".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Unknown routes get the same JSON error shape as everything else
pub async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "Route not found".to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_credentials() {
        let ok = require_credentials(CredentialsRequest::new(" ana ", "secret1")).unwrap();
        assert_eq!(ok, ("ana".to_string(), "secret1".to_string()));

        for req in [
            CredentialsRequest::default(),
            CredentialsRequest::new("", "secret1"),
            CredentialsRequest::new("ana", ""),
            CredentialsRequest {
                username: Some("ana".into()),
                password: None,
            },
        ] {
            assert!(matches!(require_credentials(req), Err(ApiError::Validation(_))));
        }
    }
}
