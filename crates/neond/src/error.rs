//! Request-boundary errors for neond.
//!
//! Every handler returns `ApiError`; each variant maps to one status code
//! and a client-facing message. Internal details are logged, never sent.

use crate::auth::AuthError;
use crate::store::StoreError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use neon_common::{ErrorResponse, LessonCompletionError};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("User already exists")]
    DuplicateUsername,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access token required")]
    Unauthenticated,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    NotFound,

    #[error("Lesson already completed")]
    AlreadyCompleted,

    #[error("Too many requests")]
    RateLimited,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateUsername => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::AlreadyCompleted => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn validation(message: &str) -> Self {
        ApiError::Validation(message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!("Request failed: {}", detail);
        } else {
            debug!("Request rejected: {}", self);
        }
        let body = ErrorResponse {
            message: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(_) => ApiError::DuplicateUsername,
            StoreError::NotFound(_) => ApiError::NotFound,
            StoreError::Lesson(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<LessonCompletionError> for ApiError {
    fn from(err: LessonCompletionError) -> Self {
        match err {
            LessonCompletionError::AlreadyCompleted(_) => ApiError::AlreadyCompleted,
            LessonCompletionError::EmptyLessonId => ApiError::validation("Lesson ID required"),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Malformed | AuthError::BadSignature | AuthError::Expired => {
                ApiError::InvalidToken
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Bodies without Content-Length only hit the limit while buffering
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge;
        }
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("background task failed: {}", err))
    }
}
