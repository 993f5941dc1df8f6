//! Account Store - SQLite-backed account records
//!
//! One row per account. Progress lists (badges, completed lessons) are
//! stored as JSON arrays, matching the document shape the API returns.
//!
//! Schema:
//! - accounts: id, username (unique), password hash, xp, level, badges,
//!   lessons_completed, version, created_at
//!
//! Every progress write is conditional on `version`, and lesson completion
//! runs its read-modify-write inside an IMMEDIATE transaction, so a lesson
//! can award XP at most once even if two requests race.

use chrono::{DateTime, Utc};
use neon_common::{LessonCompletionError, LessonOutcome, UserProgress};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Concurrent update to account {0}")]
    Conflict(String),

    #[error(transparent)]
    Lesson(#[from] LessonCompletionError),

    #[error("Corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A persisted account
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub progress: UserProgress,
    /// Bumped on every progress write
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

const ACCOUNT_COLUMNS: &str =
    "id, username, password_hash, xp, level, badges, lessons_completed, version, created_at";

/// SQLite-backed account store
pub struct AccountStore {
    conn: Connection,
}

impl AccountStore {
    /// Open or create the store at a path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        Self::init(conn)
    }

    /// Volatile store, for tests and dry runs
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                xp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                badges TEXT NOT NULL DEFAULT '[]',
                lessons_completed TEXT NOT NULL DEFAULT '[]',
                version INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Create an account with fresh progress
    pub fn create_account(&self, username: &str, password_hash: &str) -> Result<Account, StoreError> {
        if self.find_by_username(username)?.is_some() {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }

        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            progress: UserProgress::new(),
            version: 0,
            created_at: Utc::now(),
        };

        let result = self.conn.execute(
            "INSERT INTO accounts (id, username, password_hash, xp, level, badges, lessons_completed, version, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &account.id,
                &account.username,
                &account.password_hash,
                account.progress.xp,
                account.progress.level,
                serde_json::to_string(&account.progress.badges)?,
                serde_json::to_string(&account.progress.lessons_completed)?,
                account.version,
                account.created_at,
            ],
        );

        match result {
            Ok(_) => {
                debug!("Created account {} ({})", account.username, account.id);
                Ok(account)
            }
            // Lost a race with another registration for the same name
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateUsername(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        Self::query_account(
            &self.conn,
            &format!("SELECT {} FROM accounts WHERE username = ?1", ACCOUNT_COLUMNS),
            username,
        )
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Self::query_account(
            &self.conn,
            &format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLUMNS),
            id,
        )
    }

    /// Write progress if the stored version still equals `expected_version`.
    ///
    /// Returns the new version.
    pub fn update_progress(
        &self,
        id: &str,
        expected_version: i64,
        progress: &UserProgress,
    ) -> Result<i64, StoreError> {
        Self::write_progress(&self.conn, id, expected_version, progress)
    }

    /// Complete a lesson for an account as one atomic read-modify-write
    pub fn complete_lesson(&mut self, id: &str, lesson_id: &str) -> Result<LessonOutcome, StoreError> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let account = Self::query_account(
            &tx,
            &format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLUMNS),
            id,
        )?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        // A rejection drops the transaction, which rolls back (nothing written)
        let outcome = account.progress.complete_lesson(lesson_id)?;
        Self::write_progress(&tx, id, account.version, &outcome.progress)?;

        tx.commit()?;
        Ok(outcome)
    }

    /// Number of registered accounts
    pub fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn write_progress(
        conn: &Connection,
        id: &str,
        expected_version: i64,
        progress: &UserProgress,
    ) -> Result<i64, StoreError> {
        let changed = conn.execute(
            "UPDATE accounts
             SET xp = ?1, level = ?2, badges = ?3, lessons_completed = ?4, version = version + 1
             WHERE id = ?5 AND version = ?6",
            params![
                progress.xp,
                progress.level,
                serde_json::to_string(&progress.badges)?,
                serde_json::to_string(&progress.lessons_completed)?,
                id,
                expected_version,
            ],
        )?;

        if changed == 0 {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )?;
            return Err(if exists {
                StoreError::Conflict(id.to_string())
            } else {
                StoreError::NotFound(id.to_string())
            });
        }
        Ok(expected_version + 1)
    }

    fn query_account(conn: &Connection, sql: &str, key: &str) -> Result<Option<Account>, StoreError> {
        let raw = conn.query_row(sql, params![key], RawAccount::from_row).optional()?;
        raw.map(RawAccount::decode).transpose()
    }
}

/// Row as stored, before the JSON columns are decoded
struct RawAccount {
    id: String,
    username: String,
    password_hash: String,
    xp: i64,
    level: i64,
    badges: String,
    lessons_completed: String,
    version: i64,
    created_at: DateTime<Utc>,
}

impl RawAccount {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            xp: row.get(3)?,
            level: row.get(4)?,
            badges: row.get(5)?,
            lessons_completed: row.get(6)?,
            version: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn decode(self) -> Result<Account, StoreError> {
        let progress = UserProgress {
            xp: self.xp.max(0) as u64,
            level: self.level.max(1) as u64,
            badges: serde_json::from_str(&self.badges)?,
            lessons_completed: serde_json::from_str(&self.lessons_completed)?,
        };

        for issue in progress.inconsistencies() {
            warn!("Account {} has inconsistent progress: {}", self.username, issue);
        }

        Ok(Account {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            progress,
            version: self.version,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_store() -> AccountStore {
        AccountStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_find() {
        let store = test_store();
        let created = store.create_account("ana", "hash").unwrap();

        assert_eq!(created.progress, UserProgress::new());
        assert_eq!(created.version, 0);

        let by_name = store.find_by_username("ana").unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_name.password_hash, "hash");

        let by_id = store.find_by_id(&created.id).unwrap().unwrap();
        assert_eq!(by_id.username, "ana");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_missing_account() {
        let store = test_store();
        assert!(store.find_by_username("nobody").unwrap().is_none());
        assert!(store.find_by_id("no-such-id").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username() {
        let store = test_store();
        store.create_account("ana", "hash").unwrap();

        let err = store.create_account("ana", "other").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername(name) if name == "ana"));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_complete_lesson_persists() {
        let mut store = test_store();
        let account = store.create_account("ana", "hash").unwrap();

        let outcome = store.complete_lesson(&account.id, "lesson-1").unwrap();
        assert_eq!(outcome.progress.xp, 20);

        let stored = store.find_by_id(&account.id).unwrap().unwrap();
        assert_eq!(stored.progress, outcome.progress);
        assert_eq!(stored.version, 1);
    }

    #[test]
    fn test_repeat_lesson_leaves_record_untouched() {
        let mut store = test_store();
        let account = store.create_account("ana", "hash").unwrap();
        store.complete_lesson(&account.id, "lesson-1").unwrap();

        let err = store.complete_lesson(&account.id, "lesson-1").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Lesson(LessonCompletionError::AlreadyCompleted(_))
        ));

        let stored = store.find_by_id(&account.id).unwrap().unwrap();
        assert_eq!(stored.progress.xp, 20);
        assert_eq!(stored.version, 1);
    }

    #[test]
    fn test_complete_lesson_unknown_account() {
        let mut store = test_store();
        let err = store.complete_lesson("ghost", "lesson-1").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_level_up_persisted() {
        let mut store = test_store();
        let account = store.create_account("ana", "hash").unwrap();
        for i in 1..=5 {
            store.complete_lesson(&account.id, &format!("lesson-{}", i)).unwrap();
        }

        let stored = store.find_by_id(&account.id).unwrap().unwrap();
        assert_eq!(stored.progress.xp, 100);
        assert_eq!(stored.progress.level, 2);
        assert_eq!(stored.progress.badges, vec!["First Level Up"]);
        assert_eq!(stored.version, 5);
    }

    #[test]
    fn test_stale_version_conflicts() {
        let store = test_store();
        let account = store.create_account("ana", "hash").unwrap();

        let first = account.progress.complete_lesson("a").unwrap().progress;
        assert_eq!(store.update_progress(&account.id, 0, &first).unwrap(), 1);

        // Second writer still holds version 0
        let second = account.progress.complete_lesson("a").unwrap().progress;
        let err = store.update_progress(&account.id, 0, &second).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let err = store.update_progress("ghost", 0, &second).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_reopen_file_store() {
        let tmp = NamedTempFile::new().unwrap();
        let id = {
            let mut store = AccountStore::open_at(tmp.path()).unwrap();
            let account = store.create_account("ana", "hash").unwrap();
            store.complete_lesson(&account.id, "lesson-1").unwrap();
            account.id
        };

        let store = AccountStore::open_at(tmp.path()).unwrap();
        let stored = store.find_by_id(&id).unwrap().unwrap();
        assert_eq!(stored.progress.lessons_completed, vec!["lesson-1"]);
    }
}
