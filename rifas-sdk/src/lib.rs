//! Shared wire types for the rifas raffle backend.
//!
//! - [`objects`]: JSON request and response bodies of the HTTP API.
//! - [`token`]: HS256 administrator tokens (signing and verification).
//! - `client`: a typed HTTP client, behind the `client` feature.

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod token;
