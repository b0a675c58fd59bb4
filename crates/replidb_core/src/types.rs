//! Core type definitions for replidb.

use serde::{Serialize, Serializer};
use std::fmt;

/// Value stored in a variable.
pub type Value = i64;

/// Logical time.
///
/// Ticks are advanced once per input batch and never go backwards. Tick 0 is
/// the initial state, before any batch has been processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Tick(pub u64);

impl Tick {
    /// The tick at which the system is created.
    pub const ZERO: Tick = Tick(0);

    /// Creates a new tick.
    #[must_use]
    pub const fn new(tick: u64) -> Self {
        Self(tick)
    }

    /// Returns the raw tick value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the following tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick:{}", self.0)
    }
}

/// Name of a transaction, as given by the script (`T1`, `reader`, ...).
///
/// Names are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Creates a new transaction ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Index of a variable, starting at 1.
///
/// Even indexes are replicated at every site; odd indexes live at exactly
/// one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableId(pub u32);

impl VariableId {
    /// Creates a new variable ID.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns true if the variable has a copy at every site.
    #[must_use]
    pub const fn is_replicated(self) -> bool {
        self.0 % 2 == 0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl Serialize for VariableId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Number of a site, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SiteId(pub u32);

impl SiteId {
    /// Creates a new site ID.
    #[must_use]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// Returns the raw site number.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "site {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_next() {
        let t = Tick::new(5);
        assert_eq!(t.next().as_u64(), 6);
        assert!(Tick::ZERO < t);
    }

    #[test]
    fn variable_replication_by_parity() {
        assert!(VariableId::new(2).is_replicated());
        assert!(VariableId::new(20).is_replicated());
        assert!(!VariableId::new(1).is_replicated());
        assert!(!VariableId::new(19).is_replicated());
    }

    #[test]
    fn display_formats() {
        assert_eq!(VariableId::new(7).to_string(), "x7");
        assert_eq!(SiteId::new(3).to_string(), "site 3");
        assert_eq!(TransactionId::new("T1").to_string(), "T1");
        assert_eq!(Tick::new(4).to_string(), "tick:4");
    }

    #[test]
    fn variable_serializes_as_name() {
        let json = serde_json::to_string(&VariableId::new(4)).unwrap();
        assert_eq!(json, "\"x4\"");
    }
}
