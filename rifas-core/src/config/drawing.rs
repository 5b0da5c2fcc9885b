//! Drawing configuration.

/// Losers revealed before each winner unless configured otherwise.
pub const DEFAULT_LOSERS_PER_PRIZE: u32 = 2;

/// Upper bound accepted for `losers_per_prize`.
pub const MAX_LOSERS_PER_PRIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawingConfig {
    /// Tickets skipped as losers before each winner in batch and live draws.
    pub losers_per_prize: u32,
}

impl DrawingConfig {
    /// Tickets consumed by one prize: the losers plus the winner.
    pub fn block_size(&self) -> u32 {
        self.losers_per_prize.saturating_add(1)
    }
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            losers_per_prize: DEFAULT_LOSERS_PER_PRIZE,
        }
    }
}
