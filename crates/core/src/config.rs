//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum size of an uploaded profile picture in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// HTML page served for unmatched routes. The built-in page is used when unset
    /// or unreadable.
    #[serde(default)]
    pub not_found_page: Option<PathBuf>,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_upload_bytes() -> u64 {
    crate::MAX_PICTURE_SIZE
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            not_found_page: None,
        }
    }
}

/// Authentication configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Process-wide salt mixed into every password hash.
    /// WARNING: Prefer ROSTER_AUTH__SALT env var over storing in config.
    /// Changing it invalidates every stored credential.
    pub salt: String,
    /// Sessions expire after this many seconds of inactivity.
    #[serde(default = "default_session_expiry_secs")]
    pub session_expiry_secs: u64,
    /// Mark the session cookie `Secure` (requires HTTPS in front of the server).
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_session_expiry_secs() -> u64 {
    86400 // 24 hours
}

impl AuthConfig {
    /// Create a test configuration with a fixed salt.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            salt: "test-salt".to_string(),
            session_expiry_secs: default_session_expiry_secs(),
            secure_cookies: false,
        }
    }

    /// Get the session inactivity expiry as a Duration.
    pub fn session_expiry(&self) -> Duration {
        // Saturate at i64::MAX to prevent overflow wrapping to negative
        let secs = i64::try_from(self.session_expiry_secs).unwrap_or(i64::MAX);
        Duration::seconds(secs)
    }
}

/// Storage backend configuration for uploaded files.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Uploads directory.
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./uploads"),
        }
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database (recommended for testing and small deployments).
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// Maximum connections in the pool.
        #[serde(default = "default_sqlite_max_connections")]
        max_connections: u32,
    },
    /// MySQL database.
    Mysql {
        /// Connection URL (optional if using individual fields).
        /// Takes precedence over individual fields if both are provided.
        url: Option<String>,
        /// Database host.
        host: Option<String>,
        /// Database port (default: 3306).
        #[serde(default = "default_mysql_port")]
        port: Option<u16>,
        /// Database username.
        username: Option<String>,
        /// Database password.
        /// WARNING: Prefer ROSTER_METADATA__PASSWORD env var over storing in config.
        password: Option<String>,
        /// Database name.
        database: Option<String>,
        /// Maximum connections in the pool.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

fn default_max_connections() -> u32 {
    10
}

fn default_sqlite_max_connections() -> u32 {
    1
}

fn default_mysql_port() -> Option<u16> {
    Some(3306)
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/roster.db"),
            max_connections: default_sqlite_max_connections(),
        }
    }
}

impl MetadataConfig {
    /// Validate metadata configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MetadataConfig::Sqlite {
                max_connections, ..
            } => {
                if *max_connections == 0 {
                    return Err("sqlite max_connections must be at least 1".to_string());
                }
                Ok(())
            }
            MetadataConfig::Mysql {
                url,
                host,
                database,
                max_connections,
                ..
            } => {
                if *max_connections == 0 {
                    return Err("mysql max_connections must be at least 1".to_string());
                }
                match (url.as_ref(), host.as_ref(), database.as_ref()) {
                    (Some(_), _, _) => Ok(()),
                    (None, Some(_), Some(_)) => Ok(()),
                    (None, None, _) => Err(
                        "mysql config requires either 'url' or 'host' + 'database'".to_string(),
                    ),
                    (None, Some(_), None) => Err(
                        "mysql config requires 'database' when using individual fields"
                            .to_string(),
                    ),
                }
            }
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Authentication configuration (required, carries the password salt).
    pub auth: AuthConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Upload storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses filesystem storage, SQLite metadata,
    /// and a fixed salt.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::for_testing(),
            metadata: MetadataConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// Validate the whole configuration, failing on the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.auth.salt.is_empty() {
            return Err("auth.salt must not be empty".to_string());
        }
        if self.server.max_upload_bytes == 0 {
            return Err("server.max_upload_bytes must be greater than zero".to_string());
        }
        self.metadata.validate()
    }
}
