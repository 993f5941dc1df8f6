//! HTTP client for the neond API.

use anyhow::{anyhow, Context, Result};
use neon_common::{
    AuthResponse, CompleteLessonRequest, CompleteLessonResponse, CredentialsRequest, ErrorResponse,
    HealthResponse, ProgressResponse,
};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// Client for one neond server
pub struct NeonClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl NeonClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path such as `/api/health`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let request = self
            .http
            .post(self.url("/api/register"))
            .json(&CredentialsRequest::new(username, password));
        self.send(request).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let request = self
            .http
            .post(self.url("/api/login"))
            .json(&CredentialsRequest::new(username, password));
        self.send(request).await
    }

    pub async fn progress(&self) -> Result<ProgressResponse> {
        let request = self.authorized(self.http.get(self.url("/api/progress")))?;
        self.send(request).await
    }

    pub async fn complete_lesson(&self, lesson_id: &str) -> Result<CompleteLessonResponse> {
        let body = CompleteLessonRequest {
            lesson_id: Some(lesson_id.to_string()),
        };
        let request = self.authorized(self.http.post(self.url("/api/lesson/complete")).json(&body))?;
        self.send(request).await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.send(self.http.get(self.url("/api/health"))).await
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("Not logged in. Run `neonctl login <username>` first."))?;
        Ok(request.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Cannot reach Neon Learn server at {}", self.base_url))?;
        decode(response).await
    }
}

/// Decode a success body, or turn an error body into its message
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.context("Invalid response from server");
    }

    let text = response.text().await.unwrap_or_default();
    Err(anyhow!("{}", error_message(status.as_u16(), &text)))
}

/// Server message from an error body, falling back to the status code
pub fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => err.message,
        Err(_) => format!("Server returned HTTP {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = NeonClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.url("/api/health"), "http://localhost:5000/api/health");
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(400, r#"{"message":"Lesson already completed"}"#),
            "Lesson already completed"
        );
        assert_eq!(error_message(502, "<html>bad gateway</html>"), "Server returned HTTP 502");
    }

    #[tokio::test]
    async fn test_progress_requires_session() {
        let client = NeonClient::new("http://127.0.0.1:9");
        let err = client.progress().await.unwrap_err();
        assert!(err.to_string().contains("Not logged in"));
    }
}
