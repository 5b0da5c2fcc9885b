//! Application state shared across all request handlers.

use crate::api::extractors::{Hs256Verifier, TokenVerifier};
use crate::config::runtime::SharedConfig;
use rifas_core::framework::DatabaseProcessor;
use sqlx::PgPool;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Runtime configuration with separate locks per section (can be reloaded via SIGHUP).
    pub config: SharedConfig,
    /// Checks administrator bearer tokens.
    pub tokens: Arc<dyn TokenVerifier>,
}

impl AppState {
    /// Create a new AppState verifying HS256 tokens with the configured secret.
    pub fn new(db: PgPool, config: SharedConfig) -> Self {
        Self::with_verifier(db, config, Arc::new(Hs256Verifier))
    }

    pub fn with_verifier(db: PgPool, config: SharedConfig, tokens: Arc<dyn TokenVerifier>) -> Self {
        Self { db, config, tokens }
    }

    /// Postgres-backed store for one request.
    pub fn store(&self) -> DatabaseProcessor {
        DatabaseProcessor {
            pool: self.db.clone(),
        }
    }
}
