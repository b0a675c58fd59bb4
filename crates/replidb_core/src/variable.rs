//! Versioned variables.
//!
//! Every copy of a variable keeps the full list of committed versions so that
//! read-only transactions can read the value as of their begin tick.

use crate::types::{Tick, Value, VariableId};

/// One copy of a variable at one site, with its committed history.
#[derive(Debug, Clone)]
pub struct VersionedVariable {
    id: VariableId,
    current: Value,
    valid: bool,
    /// Committed versions, strictly increasing in tick. Never empty.
    history: Vec<(Tick, Value)>,
}

impl VersionedVariable {
    /// Creates a variable with an initial version at `created`.
    #[must_use]
    pub fn new(id: VariableId, value: Value, created: Tick) -> Self {
        Self {
            id,
            current: value,
            valid: true,
            history: vec![(created, value)],
        }
    }

    /// Returns the variable ID.
    #[must_use]
    pub fn id(&self) -> VariableId {
        self.id
    }

    /// Returns the latest committed value.
    #[must_use]
    pub fn read_current(&self) -> Value {
        self.current
    }

    /// Returns the last value committed strictly before `tick`.
    ///
    /// Falls back to the current value when no version is that old.
    #[must_use]
    pub fn read_as_of(&self, tick: Tick) -> Value {
        let visible = self.history.partition_point(|(at, _)| *at < tick);
        match visible {
            0 => self.current,
            n => self.history[n - 1].1,
        }
    }

    /// Records a committed write at `tick` and makes the copy readable.
    ///
    /// A second commit within the same tick replaces that tick's version.
    pub fn commit_write(&mut self, tick: Tick, value: Value) {
        match self.history.last_mut() {
            Some((at, last)) if *at == tick => *last = value,
            _ => {
                debug_assert!(self.history.last().map_or(true, |(at, _)| *at < tick));
                self.history.push((tick, value));
            }
        }
        self.current = value;
        self.valid = true;
    }

    /// Marks the copy unreadable until its next committed write.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Returns false between a recovery and the next committed write.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns the committed versions, oldest first.
    #[must_use]
    pub fn history(&self) -> &[(Tick, Value)] {
        &self.history
    }
}
