//! Neon Learn Configuration
//!
//! Configuration lives in /etc/neonlearn/config.toml, or wherever
//! `$NEON_CONFIG` points. Every field has a default, so a missing file is
//! not an error. Deployment environment variables are applied on top:
//!
//! - `PORT`: listen port
//! - `NEON_DB_PATH`: SQLite database file
//! - `TOKEN_SECRET`: token signing secret
//! - `NEON_LOG`: log level

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// System configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/neonlearn";
const CONFIG_FILE: &str = "config.toml";

/// Neon Learn data directory
pub const DATA_DIR: &str = "/var/lib/neonlearn";

/// Environment variable naming an alternate config file
pub const CONFIG_PATH_ENV: &str = "NEON_CONFIG";

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Key rate limits on the first `X-Forwarded-For` hop instead of the
    /// socket address. Only enable behind a proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            trust_forwarded_for: false,
        }
    }
}

/// Account store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DATA_DIR).join("accounts.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Credential and token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret the token signing key is derived from.
    /// When unset, neond generates one per process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,

    /// Token lifetime in days (valid: 1-365)
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,

    /// bcrypt work factor (valid: 4-31)
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
}

fn default_token_ttl_days() -> i64 {
    7
}

fn default_bcrypt_cost() -> u32 {
    10
}

fn default_min_password_len() -> usize {
    6
}

impl AuthConfig {
    /// Clamp token_ttl_days to 1-365
    pub fn effective_token_ttl_days(&self) -> i64 {
        self.token_ttl_days.clamp(1, 365)
    }

    /// Clamp bcrypt_cost to the range bcrypt accepts
    pub fn effective_bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost.clamp(4, 31)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_days: default_token_ttl_days(),
            bcrypt_cost: default_bcrypt_cost(),
            min_password_len: default_min_password_len(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Complete neond configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeonConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl NeonConfig {
    /// Load from the config file (if any), then apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::load_from(&config_path());
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Load from a specific file, falling back to defaults when the file is
    /// absent or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Invalid config {}: {}; using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Cannot read config {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Apply deployment overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(path) = lookup("NEON_DB_PATH") {
            self.storage.db_path = PathBuf::from(path);
        }
        if let Some(secret) = lookup("TOKEN_SECRET").filter(|s| !s.is_empty()) {
            self.auth.token_secret = Some(secret);
        }
        if let Some(level) = lookup("NEON_LOG") {
            self.log.level = level;
        }
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(SYSTEM_CONFIG_DIR).join(CONFIG_FILE))
}
