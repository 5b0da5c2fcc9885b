//! TOML file configuration structures.
//!
//! These structs directly map to the `rifas-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use rifas_core::config::{DEFAULT_BATCH_SIZE, DEFAULT_LOSERS_PER_PRIZE};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub tickets: TicketsConfig,
    #[serde(default)]
    pub drawing: DrawingConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Administrator token verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the login service.
    pub token_secret: String,
}

/// Ticket code universe. Codes are zero-padded to the width of `last_code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketsConfig {
    #[serde(default)]
    pub first_code: u32,
    #[serde(default = "default_last_code")]
    pub last_code: u32,
    /// Rows per insert statement when creating tickets.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            first_code: 0,
            last_code: default_last_code(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_last_code() -> u32 {
    999
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawingConfig {
    /// Losers revealed before each winner.
    #[serde(default = "default_losers_per_prize")]
    pub losers_per_prize: u32,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            losers_per_prize: default_losers_per_prize(),
        }
    }
}

fn default_losers_per_prize() -> u32 {
    DEFAULT_LOSERS_PER_PRIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[auth]
token_secret = "test-secret"

[tickets]
first_code = 100
last_code = 999
batch_size = 50

[drawing]
losers_per_prize = 3
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.auth.token_secret, "test-secret");
        assert_eq!(config.tickets.first_code, 100);
        assert_eq!(config.tickets.batch_size, 50);
        assert_eq!(config.drawing.losers_per_prize, 3);
    }

    #[test]
    fn test_defaults_apply() {
        let config: FileConfig = toml::from_str("[auth]\ntoken_secret = \"s\"\n").unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.tickets.first_code, 0);
        assert_eq!(config.tickets.last_code, 999);
        assert_eq!(config.tickets.batch_size, 300);
        assert_eq!(config.drawing.losers_per_prize, 2);
    }

    #[test]
    fn test_auth_section_is_required() {
        assert!(toml::from_str::<FileConfig>("[server]\nlisten = \"127.0.0.1:1\"\n").is_err());
    }
}
