#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod entities;
pub mod error;
pub mod framework;
pub mod random;
pub mod services;
pub mod store;

pub use error::{ErrorKind, RaffleError, Resource};
