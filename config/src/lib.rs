//! # Configuration Management for the Portal
//!
//! This crate provides the configuration structures shared by the portal crates:
//! database connection and pool settings plus the HTTP server section.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{DatabaseConfig, ServerConfig, Environment};
//!
//! let db_config = DatabaseConfig::new(
//!     "localhost".to_string(), 5432, "portal".to_string(),
//!     "postgres".to_string(), "password".to_string(),
//!     1, 10, 30, 600, 3600,
//! );
//!
//! let server_config = ServerConfig::new("127.0.0.1".to_string(), 3000, Environment::Development);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [database]
//! host = "localhost"
//! port = 5432
//! database = "portal"
//! username = "postgres"
//! password = "password"
//! min_connections = 1
//! max_connections = 10
//! connection_timeout_seconds = 30
//! idle_timeout_seconds = 600
//! max_lifetime_seconds = 3600
//! application_name = "portal"
//! ssl_mode = "prefer"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//! environment = "production"
//! cors_permissive = false
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from portal.toml (or the file named by PORTAL_CONFIG)
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, fmt, path::Path, str::FromStr};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./portal.toml";
const CONFIG_PATH_VAR: &str = "PORTAL_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    /// 0 disables the lifetime limit
    pub max_lifetime_seconds: u64,
    #[serde(default)]
    pub application_name: Option<String>,
    #[serde(default)]
    pub ssl_mode: SslMode,
}

/// TLS negotiation mode for database connections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

/// Build flavour; controls whether diagnostic details reach API clients
///
/// Only an explicit `development` exposes details; a missing setting is production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub cors_permissive: bool,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            environment: Environment::default(),
            cors_permissive: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the TOML file named in .env / the environment, or the default path
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }

        let config = if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified as {} (environment or .env) or in {} file",
                CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH
            )))
        }?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;

        if self.server.host.is_empty() {
            return Err(ConfigError::Invalid(
                "Server host cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl FromStr for AppConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

impl DatabaseConfig {
    /// Create a new database configuration
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
        min_connections: u32,
        max_connections: u32,
        connection_timeout_seconds: u64,
        idle_timeout_seconds: u64,
        max_lifetime_seconds: u64,
    ) -> Self {
        Self {
            host,
            port,
            database,
            username,
            password,
            min_connections,
            max_connections,
            connection_timeout_seconds,
            idle_timeout_seconds,
            max_lifetime_seconds,
            application_name: None,
            ssl_mode: SslMode::default(),
        }
    }

    /// Set the application name reported to the server
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Set the TLS mode
    pub fn with_ssl_mode(mut self, mode: SslMode) -> Self {
        self.ssl_mode = mode;
        self
    }

    /// Build connection string
    pub fn connection_string(&self) -> String {
        let mut url = format!(
            "postgresql://{}:{}@{}:{}/{}?sslmode={}",
            self.username, self.password, self.host, self.port, self.database, self.ssl_mode
        );
        if let Some(name) = &self.application_name {
            url.push_str("&application_name=");
            url.push_str(name);
        }
        url
    }

    /// Validate database values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid(
                "Database host cannot be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid(
                "Database port cannot be zero".to_string(),
            ));
        }
        if self.database.is_empty() {
            return Err(ConfigError::Invalid(
                "Database name cannot be empty".to_string(),
            ));
        }
        if self.username.is_empty() {
            return Err(ConfigError::Invalid(
                "Database username cannot be empty".to_string(),
            ));
        }
        if self.min_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database min_connections must be greater than 0".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid(
                "Database min_connections cannot be greater than max_connections".to_string(),
            ));
        }
        if self.connection_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Database connection_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if let Some(name) = &self.application_name {
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                return Err(ConfigError::Invalid(format!(
                    "Database application_name '{}' may only contain letters, digits, '-' and '_'",
                    name
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        };
        f.write_str(mode)
    }
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(host: String, port: u16, environment: Environment) -> Self {
        Self {
            host,
            port,
            environment,
            cors_permissive: false,
        }
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [database]
        host = "db.internal"
        port = 5432
        database = "portal"
        username = "portal_app"
        password = "secret"
        min_connections = 1
        max_connections = 8
        connection_timeout_seconds = 15
        idle_timeout_seconds = 600
        max_lifetime_seconds = 0
        application_name = "portal-api"
        ssl_mode = "require"

        [server]
        port = 8080
        environment = "production"
    "#;

    #[test]
    fn parses_full_document() {
        let config: AppConfig = SAMPLE.parse().unwrap();
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.ssl_mode, SslMode::Require);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.environment, Environment::Production);
        assert!(!config.server.environment.is_development());
    }

    #[test]
    fn server_section_is_optional() {
        let without_server = SAMPLE.split("[server]").next().unwrap();
        let config: AppConfig = without_server.parse().unwrap();
        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.server.environment, Environment::Production);
    }

    #[test]
    fn only_explicit_development_exposes_details() {
        let unset = SAMPLE.replace("environment = \"production\"", "");
        let config: AppConfig = unset.parse().unwrap();
        assert!(!config.server.environment.is_development());

        let dev = SAMPLE.replace("\"production\"", "\"development\"");
        let config: AppConfig = dev.parse().unwrap();
        assert!(config.server.environment.is_development());
    }

    #[test]
    fn connection_string_includes_options() {
        let db = DatabaseConfig::new(
            "localhost".to_string(),
            5432,
            "portal".to_string(),
            "postgres".to_string(),
            "pw".to_string(),
            1,
            5,
            30,
            600,
            3600,
        )
        .with_application_name("portal-api")
        .with_ssl_mode(SslMode::Disable);

        assert_eq!(
            db.connection_string(),
            "postgresql://postgres:pw@localhost:5432/portal?sslmode=disable&application_name=portal-api"
        );
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let broken = SAMPLE.replace("min_connections = 1", "min_connections = 20");
        let err = broken.parse::<AppConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("min_connections")));
    }

    #[test]
    fn rejects_empty_database_name() {
        let broken = SAMPLE.replace("database = \"portal\"", "database = \"\"");
        assert!(broken.parse::<AppConfig>().is_err());
    }

    #[test]
    fn rejects_unsafe_application_name() {
        let broken = SAMPLE.replace("portal-api", "portal api&x=1");
        assert!(broken.parse::<AppConfig>().is_err());
    }
}
