//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. PORT (highest priority)                                            │
//! │     PORT=3001                                                          │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     KADE_SERVER__PORT=3001                                             │
//! │     KADE_AUTH__JWT_SECRET=...                                          │
//! │     KADE_POLICY__STOCK=reject                                          │
//! │                                                                         │
//! │  3. TOML Config File (optional)                                        │
//! │     ./kade.toml, or the path in KADE_CONFIG                            │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3001
//!
//! [database]
//! path = "/var/lib/kade/kade.db"
//!
//! [auth]
//! jwt_secret = "change-me"
//! previous_jwt_secrets = ["old-secret"]
//! require_auth = false
//!
//! [store]
//! utc_offset_minutes = 330
//!
//! [policy]
//! stock = "allow"    # allow | clamp | reject
//! loyalty = "allow"
//! ```

use std::path::PathBuf;

use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use kade_db::BalancePolicies;
use serde::{Deserialize, Serialize};

/// Config file read when `KADE_CONFIG` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "kade.toml";

/// Furthest UTC offset in use anywhere (UTC+14).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

// =============================================================================
// Sections
// =============================================================================

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Allow any origin. The desktop front end is served from a
    /// different origin than the API.
    pub cors_permissive: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            host: "127.0.0.1".to_string(),
            port: 3001,
            cors_permissive: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file. Defaults to the platform data directory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: None,
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    /// The configured path, or `kade.db` in the platform data directory.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.kade.pos/kade.db`
    /// - **Windows**: `%APPDATA%\kade\pos\data\kade.db`
    /// - **Linux**: `~/.local/share/pos/kade.db`
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }

        directories::ProjectDirs::from("com", "kade", "pos")
            .map(|dirs| dirs.data_dir().join("kade.db"))
            .unwrap_or_else(|| PathBuf::from("kade.db"))
    }
}

/// Token signing and enforcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. `None` means an ephemeral secret per process.
    pub jwt_secret: Option<String>,
    /// Secrets still accepted for validation during rotation.
    pub previous_jwt_secrets: Vec<String>,
    pub token_lifetime_secs: i64,
    /// Require a bearer token on every `/api` route except login.
    pub require_auth: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            jwt_secret: None,
            previous_jwt_secrets: Vec::new(),
            token_lifetime_secs: 24 * 60 * 60,
            require_auth: false,
        }
    }
}

/// Where the store is. Decides the business day of a sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub utc_offset_minutes: i32,
}

/// First-run sample data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub enabled: bool,
    pub admin_username: String,
    pub admin_password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        SeedConfig {
            enabled: true,
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
        }
    }
}

// =============================================================================
// Server Config
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub store: StoreConfig,
    pub policy: BalancePolicies,
    pub seed: SeedConfig,
}

impl ServerConfig {
    /// Loads `kade.toml` (or `$KADE_CONFIG`), then `KADE_*` variables,
    /// then `PORT`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("KADE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let builder = Config::builder()
            .add_source(File::with_name(&path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("KADE")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.previous_jwt_secrets")
                    .try_parsing(true),
            )
            .set_override_option("server.port", std::env::var("PORT").ok())?;

        Self::build(builder)
    }

    /// Parses a TOML document on top of the defaults.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_lifetime_secs <= 0 {
            return Err(ConfigError::Invalid(
                "auth.token_lifetime_secs must be positive".to_string(),
            ));
        }
        if self.store.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "store.utc_offset_minutes must be within ±{MAX_UTC_OFFSET_MINUTES}"
            )));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.seed.enabled && self.seed.admin_username.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "seed.admin_username must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use kade_core::BalancePolicy;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.policy.stock, BalancePolicy::Allow);
        assert!(!config.auth.require_auth);
        assert!(config.seed.enabled);
        assert_eq!(config.bind_address(), "127.0.0.1:3001");
    }

    #[test]
    fn test_toml_sections() {
        let config = ServerConfig::from_toml(
            r#"
            [server]
            port = 8080

            [database]
            path = "/tmp/kade-test.db"

            [auth]
            jwt_secret = "s3cret"
            previous_jwt_secrets = ["old"]
            require_auth = true

            [store]
            utc_offset_minutes = 330

            [policy]
            stock = "reject"
            loyalty = "clamp"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.database.resolved_path(), PathBuf::from("/tmp/kade-test.db"));
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.auth.previous_jwt_secrets, ["old"]);
        assert!(config.auth.require_auth);
        assert_eq!(config.store.utc_offset_minutes, 330);
        assert_eq!(config.policy.stock, BalancePolicy::Reject);
        assert_eq!(config.policy.loyalty, BalancePolicy::Clamp);
    }

    #[test]
    fn test_invalid_values() {
        assert!(ServerConfig::from_toml("[policy]\nstock = \"sometimes\"").is_err());
        assert!(matches!(
            ServerConfig::from_toml("[store]\nutc_offset_minutes = 900"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ServerConfig::from_toml("[auth]\ntoken_lifetime_secs = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_default_database_path() {
        let path = DatabaseConfig::default().resolved_path();
        assert!(path.ends_with("kade.db"));
    }
}
