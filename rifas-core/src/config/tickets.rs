//! Ticket generation configuration.

use crate::services::generator::CodeUniverse;

/// Rows per `INSERT` statement when creating tickets.
pub const DEFAULT_BATCH_SIZE: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketConfig {
    /// Codes a raffle may draw its tickets from.
    pub universe: CodeUniverse,
    pub batch_size: usize,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            universe: CodeUniverse::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}
