//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [server]     # bind address, CORS
//! [auth]       # identity provider and session cache
//! [database]   # SQLite file
//! [logging]    # log file directory
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com/v1";
pub const DEFAULT_CACHE_MAX_SIZE: usize = 1000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
/// Longest a verified session may be trusted without re-contacting the provider.
pub const MAX_CACHE_TTL_SECS: u64 = 86_400;
pub const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_DATABASE_PATH: &str = "synergia.db";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged. Use the accessors to read a section
/// with defaults filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynergiaConfig {
    pub server: Option<ServerConfig>,
    pub auth: Option<AuthConfig>,
    pub database: Option<DatabaseConfig>,
    pub logging: Option<LoggingConfig>,
}

impl SynergiaConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Merging is per section: a section present in `other` replaces ours.
    pub fn merge(&mut self, other: SynergiaConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.auth.is_some() {
            self.auth = other.auth;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    pub fn auth(&self) -> AuthConfig {
        self.auth.clone().unwrap_or_default()
    }

    pub fn database(&self) -> DatabaseConfig {
        self.database.clone().unwrap_or_default()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Mutable access to a section, creating it with defaults if absent.
    pub fn server_mut(&mut self) -> &mut ServerConfig {
        self.server.get_or_insert_with(ServerConfig::default)
    }

    pub fn auth_mut(&mut self) -> &mut AuthConfig {
        self.auth.get_or_insert_with(AuthConfig::default)
    }

    pub fn database_mut(&mut self) -> &mut DatabaseConfig {
        self.database.get_or_insert_with(DatabaseConfig::default)
    }

    /// Reject values the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        let auth = self.auth();
        if auth.cache_max_size == 0 {
            return Err(ConfigError::invalid(
                "auth.cache_max_size",
                "must be greater than zero",
            ));
        }
        if auth.cache_ttl_secs == 0 {
            return Err(ConfigError::invalid(
                "auth.cache_ttl_secs",
                "must be greater than zero",
            ));
        }
        if auth.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::invalid(
                "auth.cache_ttl_secs",
                format!("must be at most {}", MAX_CACHE_TTL_SECS),
            ));
        }
        if auth.verify_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "auth.verify_timeout_secs",
                "must be greater than zero",
            ));
        }
        if auth.cleanup_enabled && auth.cleanup_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "auth.cleanup_interval_secs",
                "must be greater than zero when cleanup is enabled",
            ));
        }

        self.server().socket_addr()?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to, `host:port`.
    pub bind: String,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Enable request logging middleware.
    pub request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            request_logging: true,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::invalid("server.bind", format!("{} ({})", e, self.bind)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Identity provider and session cache settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Clerk backend secret. Prefer the `CLERK_SECRET_KEY` env var.
    pub clerk_secret_key: Option<String>,
    pub clerk_api_url: String,
    /// Maximum number of cached sessions.
    pub cache_max_size: usize,
    /// Seconds a verified session stays cached.
    pub cache_ttl_secs: u64,
    /// Upper bound on a single provider call.
    pub verify_timeout_secs: u64,
    /// Run the periodic expired-entry sweep.
    pub cleanup_enabled: bool,
    pub cleanup_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            clerk_secret_key: None,
            clerk_api_url: DEFAULT_CLERK_API_URL.to_string(),
            cache_max_size: DEFAULT_CACHE_MAX_SIZE,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            verify_timeout_secs: DEFAULT_VERIFY_TIMEOUT_SECS,
            cleanup_enabled: true,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "clerk_secret_key",
                &self.clerk_secret_key.as_ref().map(|_| "***"),
            )
            .field("clerk_api_url", &self.clerk_api_url)
            .field("cache_max_size", &self.cache_max_size)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("verify_timeout_secs", &self.verify_timeout_secs)
            .field("cleanup_enabled", &self.cleanup_enabled)
            .field("cleanup_interval_secs", &self.cleanup_interval_secs)
            .finish()
    }
}

impl AuthConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }

    /// Sweep interval, or `None` when the sweep is disabled.
    pub fn cleanup_interval(&self) -> Option<Duration> {
        self.cleanup_enabled
            .then(|| Duration::from_secs(self.cleanup_interval_secs))
    }

    /// Whether the secret is written into the config file itself.
    pub fn has_plaintext_secret(&self) -> bool {
        self.clerk_secret_key
            .as_deref()
            .is_some_and(|key| !key.is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Database Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Log file settings. Console logging is always on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write daily-rolling JSON log files.
    pub file_enabled: bool,
    /// Directory for log files. Defaults to the platform data dir.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_enabled: true,
            dir: None,
        }
    }
}

impl LoggingConfig {
    /// Resolved log directory, if one can be determined.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|d| d.join("synergia").join("logs")))
    }
}
