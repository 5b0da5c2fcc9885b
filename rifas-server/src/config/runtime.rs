//! Runtime configuration types.
//!
//! The validated sections live in `rifas-core` so the services can take
//! them directly; this module only re-exports them for the server.

pub use rifas_core::config::{AuthConfig, DrawingConfig, ServerConfig, SharedConfig, TicketConfig};
