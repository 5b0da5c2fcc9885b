//! Configuration types for the rifas backend.
//!
//! These types represent the validated runtime configuration used by the
//! server. Loading and parsing the config file is handled by the server crate.

mod auth;
mod drawing;
mod server;
mod tickets;

pub use auth::AuthConfig;
pub use drawing::{DEFAULT_LOSERS_PER_PRIZE, DrawingConfig, MAX_LOSERS_PER_PRIZE};
pub use server::ServerConfig;
pub use tickets::{DEFAULT_BATCH_SIZE, TicketConfig};

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
#[derive(Clone)]
pub struct SharedConfig {
    /// Server configuration (listen address).
    pub server: Arc<RwLock<ServerConfig>>,
    /// Token verification secret.
    pub auth: Arc<RwLock<AuthConfig>>,
    /// Ticket code universe and insert batching.
    pub tickets: Arc<RwLock<TicketConfig>>,
    pub drawing: Arc<RwLock<DrawingConfig>>,
}

impl SharedConfig {
    pub fn new(
        server: ServerConfig,
        auth: AuthConfig,
        tickets: TicketConfig,
        drawing: DrawingConfig,
    ) -> Self {
        Self {
            server: Arc::new(RwLock::new(server)),
            auth: Arc::new(RwLock::new(auth)),
            tickets: Arc::new(RwLock::new(tickets)),
            drawing: Arc::new(RwLock::new(drawing)),
        }
    }
}
