//! Per-site lock table.
//!
//! Shared locks for reads, an exclusive lock for writes. A transaction that is
//! the only reader of a variable may take the write lock on it as well.

use crate::types::{TransactionId, VariableId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Lock modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LockMode {
    /// Shared lock for reading.
    Read,
    /// Exclusive lock for writing.
    Write,
}

/// Locks held at one site.
#[derive(Debug, Clone, Default)]
pub struct LockTable {
    read_holders: BTreeMap<VariableId, BTreeSet<TransactionId>>,
    write_holder: BTreeMap<VariableId, TransactionId>,
}

impl LockTable {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether `tx` could take a `mode` lock on `var` right now.
    #[must_use]
    pub fn can_acquire(&self, tx: &TransactionId, var: VariableId, mode: LockMode) -> bool {
        if self.write_held_by_other(tx, var) {
            return false;
        }
        match mode {
            LockMode::Read => true,
            LockMode::Write => match self.read_holders.get(&var) {
                None => true,
                Some(readers) if readers.is_empty() => true,
                // the requester may upgrade only as the sole reader
                Some(readers) => readers.len() == 1 && readers.contains(tx),
            },
        }
    }

    /// Records a lock. The caller must have checked [`Self::can_acquire`].
    pub fn acquire(&mut self, tx: &TransactionId, var: VariableId, mode: LockMode) {
        debug_assert!(self.can_acquire(tx, var, mode));
        match mode {
            LockMode::Read => {
                self.read_holders.entry(var).or_default().insert(tx.clone());
            }
            LockMode::Write => {
                self.write_holder.insert(var, tx.clone());
            }
        }
    }

    /// Releases every lock held by `tx`.
    pub fn release_all(&mut self, tx: &TransactionId) {
        self.read_holders.retain(|_, readers| {
            readers.remove(tx);
            !readers.is_empty()
        });
        self.write_holder.retain(|_, holder| holder != tx);
    }

    /// Drops every lock.
    pub fn clear(&mut self) {
        self.read_holders.clear();
        self.write_holder.clear();
    }

    /// Returns the transactions holding a read lock on `var`.
    pub fn read_holders(&self, var: VariableId) -> impl Iterator<Item = &TransactionId> {
        self.read_holders.get(&var).into_iter().flatten()
    }

    /// Returns the transaction holding the write lock on `var`, if any.
    #[must_use]
    pub fn write_holder(&self, var: VariableId) -> Option<&TransactionId> {
        self.write_holder.get(&var)
    }

    /// Returns true if `tx` holds any lock in this table.
    #[must_use]
    pub fn is_held_by(&self, tx: &TransactionId) -> bool {
        self.write_holder.values().any(|holder| holder == tx)
            || self.read_holders.values().any(|readers| readers.contains(tx))
    }

    /// Returns every `(variable, holder, mode)` triple, ordered by variable.
    #[must_use]
    pub fn holders(&self) -> Vec<(VariableId, TransactionId, LockMode)> {
        let reads = self.read_holders.iter().flat_map(|(var, readers)| {
            readers
                .iter()
                .map(move |tx| (*var, tx.clone(), LockMode::Read))
        });
        let writes = self
            .write_holder
            .iter()
            .map(|(var, tx)| (*var, tx.clone(), LockMode::Write));
        let mut all: Vec<_> = reads.chain(writes).collect();
        all.sort_by_key(|(var, _, _)| *var);
        all
    }

    /// Returns true if no lock is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_holders.is_empty() && self.write_holder.is_empty()
    }

    fn write_held_by_other(&self, tx: &TransactionId, var: VariableId) -> bool {
        self.write_holder
            .get(&var)
            .is_some_and(|holder| holder != tx)
    }
}
