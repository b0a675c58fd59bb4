//! Transaction state.

use crate::types::{Tick, TransactionId, VariableId};
use serde::Serialize;
use std::collections::BTreeSet;

/// Status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionStatus {
    /// Transaction is running and may still commit.
    Active,
    /// Transaction has committed.
    Completed,
    /// A site this transaction locked at has failed; it can never commit.
    Failed,
}

/// A live transaction.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: TransactionId,
    begin_tick: Tick,
    read_only: bool,
    status: TransactionStatus,
    /// Variables locked at any site, in any mode.
    locked: BTreeSet<VariableId>,
}

impl Transaction {
    /// Creates a read-write transaction.
    #[must_use]
    pub fn read_write(id: TransactionId, begin_tick: Tick) -> Self {
        Self::new(id, begin_tick, false)
    }

    /// Creates a read-only transaction.
    #[must_use]
    pub fn read_only(id: TransactionId, begin_tick: Tick) -> Self {
        Self::new(id, begin_tick, true)
    }

    fn new(id: TransactionId, begin_tick: Tick, read_only: bool) -> Self {
        Self {
            id,
            begin_tick,
            read_only,
            status: TransactionStatus::Active,
            locked: BTreeSet::new(),
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    /// Returns the tick at which the transaction began.
    #[must_use]
    pub fn begin_tick(&self) -> Tick {
        self.begin_tick
    }

    /// Returns true for read-only transactions.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Returns false once a site failure has tainted the transaction.
    #[must_use]
    pub fn is_commitable(&self) -> bool {
        self.status != TransactionStatus::Failed
    }

    /// Returns true if this transaction began strictly before `other`.
    #[must_use]
    pub fn is_older_than(&self, other: &Transaction) -> bool {
        self.begin_tick < other.begin_tick
    }

    /// Returns true if the transaction has locked `var` at some site.
    #[must_use]
    pub fn holds(&self, var: VariableId) -> bool {
        self.locked.contains(&var)
    }

    /// Returns every variable the transaction has locked.
    pub fn locked_variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.locked.iter().copied()
    }

    /// Records a lock acquired on `var`.
    pub(crate) fn record_lock(&mut self, var: VariableId) {
        self.locked.insert(var);
    }

    /// Taints the transaction after a site failure.
    pub(crate) fn mark_failed(&mut self) {
        self.status = TransactionStatus::Failed;
    }

    /// Marks the transaction as committed.
    pub(crate) fn mark_completed(&mut self) {
        debug_assert!(self.is_commitable());
        self.status = TransactionStatus::Completed;
    }
}
