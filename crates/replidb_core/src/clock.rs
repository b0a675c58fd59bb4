//! Logical clock.

use crate::types::Tick;

/// Monotonic logical clock, advanced once per input batch.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    now: Tick,
}

impl Clock {
    /// Creates a clock at tick zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current tick.
    #[must_use]
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Moves to the next tick and returns it.
    pub fn advance(&mut self) -> Tick {
        self.now = self.now.next();
        self.now
    }
}
