//! Auth Gate - password hashing and bearer tokens
//!
//! Passwords are stored as bcrypt hashes.
//!
//! Token format: `<hex(claims json)>.<hex(ed25519 signature)>`. The signature
//! covers the hex-encoded claims exactly as they appear in the token. The
//! signing key is SHA-256 of the configured secret, so every neond sharing a
//! secret accepts the same tokens.

use crate::error::ApiError;
use crate::server::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Malformed token")]
    Malformed,

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Hash a password with bcrypt at the given cost
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Check a password against a stored bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    Ok(bcrypt::verify(password, hash)?)
}

/// Generate a random secret for a process without a configured one
pub fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Signed token contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub username: String,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expires at, unix seconds
    pub exp: i64,
}

/// Issues and verifies bearer tokens
pub struct TokenIssuer {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Derive the signing key from a shared secret
    pub fn from_secret(secret: &str, ttl_days: i64) -> Self {
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&Sha256::digest(secret.as_bytes()));
        let signing_key = SigningKey::from_bytes(&seed);
        Self {
            verifying_key: signing_key.verifying_key(),
            signing_key,
            ttl: Duration::days(ttl_days),
        }
    }

    pub fn issue(&self, account_id: &str, username: &str) -> String {
        self.issue_at(account_id, username, Utc::now())
    }

    pub fn issue_at(&self, account_id: &str, username: &str, now: DateTime<Utc>) -> String {
        let claims = Claims {
            sub: account_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        // Serializing a struct of strings and integers cannot fail
        let payload = hex::encode(serde_json::to_vec(&claims).unwrap_or_default());
        let signature = self.signing_key.sign(payload.as_bytes());
        format!("{}.{}", payload, hex::encode(signature.to_bytes()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let (payload, signature_hex) = token.split_once('.').ok_or(AuthError::Malformed)?;

        let signature_bytes: [u8; 64] = hex::decode(signature_hex)
            .map_err(|_| AuthError::Malformed)?
            .try_into()
            .map_err(|_| AuthError::Malformed)?;
        let signature = Signature::from_bytes(&signature_bytes);

        self.verifying_key
            .verify(payload.as_bytes(), &signature)
            .map_err(|_| AuthError::BadSignature)?;

        let claims_json = hex::decode(payload).map_err(|_| AuthError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&claims_json).map_err(|_| AuthError::Malformed)?;

        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Claims of a request carrying a valid bearer token
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthenticated)?;
        let claims = state.tokens.verify(token).map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            ApiError::from(e)
        })?;
        Ok(AuthUser(claims))
    }
}
