//! Configuration module for rifas-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{AuthConfig, DrawingConfig, ServerConfig, SharedConfig, TicketConfig};
use rifas_core::config::MAX_LOSERS_PER_PRIZE;
use rifas_core::services::generator::CodeUniverse;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub tickets: TicketConfig,
    pub drawing: DrawingConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with one lock per section.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig::new(self.server, self.auth, self.tickets, self.drawing)
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read the TOML file, apply CLI overrides, validate and build.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    /// Same as [`ConfigLoader::load`] on an in-memory document.
    pub fn load_str(&self, config_content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.build(file_config)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn build(&self, config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        if config.auth.token_secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.token_secret must not be empty".to_string(),
            ));
        }
        if config.tickets.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "tickets.batch_size must be at least 1".to_string(),
            ));
        }
        if config.drawing.losers_per_prize > MAX_LOSERS_PER_PRIZE {
            return Err(ConfigError::ValidationError(format!(
                "drawing.losers_per_prize must be at most {MAX_LOSERS_PER_PRIZE}"
            )));
        }
        let universe = CodeUniverse::new(config.tickets.first_code, config.tickets.last_code)
            .map_err(|e| ConfigError::ValidationError(format!("tickets: {e}")))?;

        Ok(LoadedConfig {
            server: ServerConfig {
                listen: config.server.listen,
            },
            auth: AuthConfig::new(config.auth.token_secret.into_bytes()),
            tickets: TicketConfig {
                universe,
                batch_size: config.tickets.batch_size,
            },
            drawing: DrawingConfig {
                losers_per_prize: config.drawing.losers_per_prize,
            },
        })
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[server]
listen = "127.0.0.1:3000"

[auth]
token_secret = "secret"

[tickets]
first_code = 0
last_code = 9999
"#;

    #[test]
    fn test_load_builds_every_section() {
        let loaded = ConfigLoader::new("unused.toml", None)
            .load_str(CONFIG)
            .unwrap();
        assert_eq!(loaded.server.listen.port(), 3000);
        assert_eq!(loaded.auth.secret_bytes(), b"secret");
        assert_eq!(loaded.tickets.universe.size(), 10_000);
        assert_eq!(loaded.tickets.universe.width(), 4);
        assert_eq!(loaded.drawing.losers_per_prize, 2);
    }

    #[test]
    fn test_listen_override() {
        let addr: SocketAddr = "0.0.0.0:9999".parse().unwrap();
        let loaded = ConfigLoader::new("unused.toml", Some(addr))
            .load_str(CONFIG)
            .unwrap();
        assert_eq!(loaded.server.listen, addr);
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let err = ConfigLoader::new("unused.toml", None)
            .load_str("[auth]\ntoken_secret = \"  \"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_inverted_code_range_is_rejected() {
        let err = ConfigLoader::new("unused.toml", None)
            .load_str("[auth]\ntoken_secret = \"s\"\n[tickets]\nfirst_code = 10\nlast_code = 5\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let err = ConfigLoader::new("unused.toml", None)
            .load_str("[auth]\ntoken_secret = \"s\"\n[tickets]\nbatch_size = 0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_oversized_losers_per_prize_is_rejected() {
        let err = ConfigLoader::new("unused.toml", None)
            .load_str("[auth]\ntoken_secret = \"s\"\n[drawing]\nlosers_per_prize = 4294967295\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let loaded = ConfigLoader::new("unused.toml", None)
            .load_str("[auth]\ntoken_secret = \"s\"\n[drawing]\nlosers_per_prize = 100\n")
            .unwrap();
        assert_eq!(loaded.drawing.block_size(), 101);
    }

    #[test]
    fn test_oversized_code_range_is_rejected() {
        let err = ConfigLoader::new("unused.toml", None)
            .load_str("[auth]\ntoken_secret = \"s\"\n[tickets]\nlast_code = 4294967295\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new("/nonexistent/rifas-config.toml", None)
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
