//! HTTP API schemas shared by neond and neonctl.
//!
//! All bodies use camelCase field names.

use crate::progression::UserProgress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/register` and `POST /api/login`.
///
/// Fields are optional so a missing field is reported as a validation
/// error rather than a malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialsRequest {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }
}

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub xp: u64,
    pub level: u64,
    pub badges: Vec<String>,
    pub lessons_completed: Vec<String>,
}

impl UserSummary {
    pub fn new(id: &str, username: &str, progress: &UserProgress) -> Self {
        Self {
            id: id.to_string(),
            username: username.to_string(),
            xp: progress.xp,
            level: progress.level,
            badges: progress.badges.clone(),
            lessons_completed: progress.lessons_completed.clone(),
        }
    }
}

/// Response to a successful register or login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

/// Response of `GET /api/progress`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub xp: u64,
    pub level: u64,
    pub badges: Vec<String>,
    pub lessons_completed: Vec<String>,
    /// Percent of the current level completed
    pub progress_to_next_level: f64,
    pub xp_to_next_level: u64,
}

impl From<&UserProgress> for ProgressResponse {
    fn from(progress: &UserProgress) -> Self {
        let next = progress.progress_to_next_level();
        Self {
            xp: progress.xp,
            level: progress.level,
            badges: progress.badges.clone(),
            lessons_completed: progress.lessons_completed.clone(),
            progress_to_next_level: next.percent,
            xp_to_next_level: next.xp_remaining,
        }
    }
}

/// Body of `POST /api/lesson/complete`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonRequest {
    #[serde(default)]
    pub lesson_id: Option<String>,
}

/// Response of `POST /api/lesson/complete`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonResponse {
    pub message: String,
    #[serde(flatten)]
    pub progress: ProgressResponse,
    pub xp_earned: u64,
    pub leveled_up: bool,
    pub new_level: Option<u64>,
}

/// Response of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Error body for every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_response_is_flat() {
        let response = CompleteLessonResponse {
            message: "ok".to_string(),
            progress: ProgressResponse::from(&UserProgress::new()),
            xp_earned: 20,
            leveled_up: false,
            new_level: None,
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["xp"], 0);
        assert_eq!(json["xpToNextLevel"], 100);
        assert_eq!(json["xpEarned"], 20);
        assert!(json["newLevel"].is_null());
        assert!(json.get("progress").is_none());
    }

    #[test]
    fn test_credentials_missing_fields() {
        let req: CredentialsRequest = serde_json::from_str(r#"{"username":"ana"}"#).unwrap();
        assert_eq!(req.username.as_deref(), Some("ana"));
        assert!(req.password.is_none());
    }

    #[test]
    fn test_lesson_request_field_name() {
        let req: CompleteLessonRequest = serde_json::from_str(r#"{"lessonId":"rust-101"}"#).unwrap();
        assert_eq!(req.lesson_id.as_deref(), Some("rust-101"));
    }
}
