//! Sites: one simulated machine each.
//!
//! A site holds copies of the variables placed on it, a lock table, and the
//! writes staged by transactions that have not ended yet. Failing a site
//! drops its locks and staged writes but keeps committed history.

use crate::config::Config;
use crate::lock::{LockMode, LockTable};
use crate::transaction::Transaction;
use crate::types::{SiteId, Tick, TransactionId, Value, VariableId};
use crate::variable::VersionedVariable;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// An uncommitted write waiting for its transaction to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedWrite {
    /// Transaction that wrote the value.
    pub writer: TransactionId,
    /// The value written.
    pub value: Value,
}

/// Committed state of one variable copy, as reported by a dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopySnapshot {
    /// The variable.
    pub var: VariableId,
    /// Latest committed value.
    pub value: Value,
    /// False if the copy is waiting for a write after recovery.
    pub valid: bool,
}

/// Committed state of a site, as reported by a dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteSnapshot {
    /// The site.
    pub site: SiteId,
    /// Whether the site is up.
    pub running: bool,
    /// Copies included in the dump, in variable order.
    pub copies: Vec<CopySnapshot>,
}

/// A simulated database site.
#[derive(Debug, Clone)]
pub struct Site {
    id: SiteId,
    running: bool,
    copies: BTreeMap<VariableId, VersionedVariable>,
    locks: LockTable,
    staged: BTreeMap<VariableId, StagedWrite>,
    /// Live transactions that took any lock here since the last failure.
    listeners: BTreeSet<TransactionId>,
}

impl Site {
    /// Creates a running site holding the copies `config` places on it.
    #[must_use]
    pub fn new(id: SiteId, config: &Config, created: Tick) -> Self {
        let copies = config
            .variables()
            .filter(|var| config.hosts(id, *var))
            .map(|var| {
                let copy = VersionedVariable::new(var, config.initial_value(var), created);
                (var, copy)
            })
            .collect();

        Self {
            id,
            running: true,
            copies,
            locks: LockTable::new(),
            staged: BTreeMap::new(),
            listeners: BTreeSet::new(),
        }
    }

    /// Returns the site ID.
    #[must_use]
    pub fn id(&self) -> SiteId {
        self.id
    }

    /// Returns true unless the site has failed and not yet recovered.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns true if the site holds a copy of `var`.
    #[must_use]
    pub fn hosts(&self, var: VariableId) -> bool {
        self.copies.contains_key(&var)
    }

    /// Returns the copy of `var`, if hosted here.
    #[must_use]
    pub fn variable(&self, var: VariableId) -> Option<&VersionedVariable> {
        self.copies.get(&var)
    }

    /// Returns the lock table.
    #[must_use]
    pub fn lock_table(&self) -> &LockTable {
        &self.locks
    }

    /// Returns the transactions that will be tainted if this site fails.
    pub fn listeners(&self) -> impl Iterator<Item = &TransactionId> {
        self.listeners.iter()
    }

    /// Returns the staged write on `var`, if any.
    #[must_use]
    pub fn staged_write(&self, var: VariableId) -> Option<&StagedWrite> {
        self.staged.get(&var)
    }

    /// Reads `var` as the lock holder sees it: its staged value if there is
    /// one, otherwise the committed value.
    #[must_use]
    pub fn read(&self, var: VariableId) -> Option<Value> {
        match self.staged.get(&var) {
            Some(staged) => Some(staged.value),
            None => self.committed_value(var),
        }
    }

    /// Returns the latest committed value of `var`.
    #[must_use]
    pub fn committed_value(&self, var: VariableId) -> Option<Value> {
        self.copies.get(&var).map(VersionedVariable::read_current)
    }

    /// Reads `var` as it was when `tx` began. Takes no lock.
    #[must_use]
    pub fn read_snapshot(&self, var: VariableId, tx: &Transaction) -> Option<Value> {
        self.copies
            .get(&var)
            .map(|copy| copy.read_as_of(tx.begin_tick()))
    }

    /// Stages a write to `var`. Committed state is untouched until
    /// [`Self::commit`].
    pub fn write(&mut self, tx: &TransactionId, var: VariableId, value: Value) {
        debug_assert!(self.hosts(var));
        self.staged.insert(
            var,
            StagedWrite {
                writer: tx.clone(),
                value,
            },
        );
    }

    /// Tries to lock `var` for `tx`. On success the transaction is
    /// registered to be tainted if this site fails.
    pub fn acquire_lock(&mut self, tx: &TransactionId, var: VariableId, mode: LockMode) -> bool {
        if !self.locks.can_acquire(tx, var, mode) {
            debug!(site = %self.id, tx = %tx, var = %var, ?mode, "lock denied");
            return false;
        }
        self.locks.acquire(tx, var, mode);
        self.listeners.insert(tx.clone());
        debug!(site = %self.id, tx = %tx, var = %var, ?mode, "lock granted");
        true
    }

    /// Returns true if `var` can be read here: hosted, and either staged or
    /// written since the last recovery.
    #[must_use]
    pub fn is_initialized(&self, var: VariableId) -> bool {
        match self.copies.get(&var) {
            Some(copy) => self.staged.contains_key(&var) || copy.is_valid(),
            None => false,
        }
    }

    /// Commits the writes `tx` staged here at `tick`. Returns the variables
    /// committed.
    pub fn commit(&mut self, tx: &Transaction, tick: Tick) -> Vec<VariableId> {
        let committed = self.take_staged(tx);
        for (var, value) in &committed {
            if let Some(copy) = self.copies.get_mut(var) {
                copy.commit_write(tick, *value);
            }
        }
        committed.into_iter().map(|(var, _)| var).collect()
    }

    /// Discards the writes `tx` staged here. Returns the variables discarded.
    pub fn abort(&mut self, tx: &Transaction) -> Vec<VariableId> {
        self.take_staged(tx)
            .into_iter()
            .map(|(var, _)| var)
            .collect()
    }

    /// Releases every lock `tx` holds here.
    pub fn release(&mut self, tx: &TransactionId) {
        self.locks.release_all(tx);
    }

    /// Stops tainting `tx` on failure. Called when `tx` ends.
    pub fn forget(&mut self, tx: &TransactionId) {
        self.listeners.remove(tx);
    }

    /// Takes the site down. Locks, staged writes and listeners are dropped.
    ///
    /// Returns the transactions that had locked anything here; the caller
    /// must mark them failed.
    pub fn fail(&mut self) -> Vec<TransactionId> {
        self.running = false;
        self.staged.clear();
        self.locks.clear();
        let tainted: Vec<_> = std::mem::take(&mut self.listeners).into_iter().collect();
        info!(site = %self.id, tainted = tainted.len(), "site failed");
        tainted
    }

    /// Brings the site back up.
    ///
    /// Replicated copies stay unreadable until their next committed write,
    /// since other sites may have committed newer values meanwhile.
    /// Single-copy variables are readable immediately.
    pub fn recover(&mut self) {
        self.running = true;
        for copy in self.copies.values_mut() {
            if copy.id().is_replicated() {
                copy.invalidate();
            }
        }
        info!(site = %self.id, "site recovered");
    }

    /// Reports the committed state of the given variables (every hosted
    /// variable if `filter` is `None`).
    #[must_use]
    pub fn snapshot(&self, filter: Option<VariableId>) -> SiteSnapshot {
        let copies = self
            .copies
            .values()
            .filter(|copy| filter.map_or(true, |var| copy.id() == var))
            .map(|copy| CopySnapshot {
                var: copy.id(),
                value: copy.read_current(),
                valid: copy.is_valid(),
            })
            .collect();

        SiteSnapshot {
            site: self.id,
            running: self.running,
            copies,
        }
    }

    fn take_staged(&mut self, tx: &Transaction) -> Vec<(VariableId, Value)> {
        let owned: Vec<VariableId> = self
            .staged
            .iter()
            .filter(|(var, staged)| tx.holds(**var) && &staged.writer == tx.id())
            .map(|(var, _)| *var)
            .collect();

        owned
            .into_iter()
            .filter_map(|var| self.staged.remove(&var).map(|staged| (var, staged.value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(number: u32) -> Site {
        Site::new(SiteId::new(number), &Config::default(), Tick::ZERO)
    }

    fn txn(name: &str, tick: u64) -> Transaction {
        Transaction::read_write(TransactionId::new(name), Tick::new(tick))
    }

    fn lock_and_write(site: &mut Site, tx: &mut Transaction, var: VariableId, value: Value) {
        assert!(site.acquire_lock(tx.id(), var, LockMode::Write));
        tx.record_lock(var);
        site.write(tx.id(), var, value);
    }

    #[test]
    fn placement() {
        let s2 = site(2);
        assert!(s2.hosts(VariableId::new(1)));
        assert!(s2.hosts(VariableId::new(11)));
        assert!(s2.hosts(VariableId::new(2)));
        assert!(!s2.hosts(VariableId::new(3)));

        let s1 = site(1);
        assert!(!s1.hosts(VariableId::new(1)));
        assert_eq!(s1.snapshot(None).copies.len(), 10);
    }

    #[test]
    fn initial_values() {
        let s = site(1);
        assert_eq!(s.committed_value(VariableId::new(2)), Some(20));
        assert_eq!(s.committed_value(VariableId::new(3)), None);
    }

    #[test]
    fn staged_write_is_visible_to_read_but_not_committed() {
        let mut s = site(1);
        let mut t1 = txn("T1", 1);
        let x2 = VariableId::new(2);
        lock_and_write(&mut s, &mut t1, x2, 99);

        assert_eq!(s.read(x2), Some(99));
        assert_eq!(s.committed_value(x2), Some(20));
    }

    #[test]
    fn commit_applies_only_own_writes() {
        let mut s = site(1);
        let mut t1 = txn("T1", 1);
        let mut t2 = txn("T2", 2);
        let x2 = VariableId::new(2);
        let x4 = VariableId::new(4);
        lock_and_write(&mut s, &mut t1, x2, 21);
        lock_and_write(&mut s, &mut t2, x4, 41);
        // t1 knows x4 from a lock elsewhere, but did not write it here
        t1.record_lock(x4);

        let committed = s.commit(&t1, Tick::new(5));

        assert_eq!(committed, vec![x2]);
        assert_eq!(s.committed_value(x2), Some(21));
        assert_eq!(s.committed_value(x4), Some(40));
        assert!(s.staged_write(x4).is_some());
    }

    #[test]
    fn abort_discards_staged() {
        let mut s = site(1);
        let mut t1 = txn("T1", 1);
        let x2 = VariableId::new(2);
        lock_and_write(&mut s, &mut t1, x2, 21);

        assert_eq!(s.abort(&t1), vec![x2]);
        assert_eq!(s.read(x2), Some(20));
        assert!(s.staged_write(x2).is_none());
    }

    #[test]
    fn acquire_registers_listener() {
        let mut s = site(1);
        let t1 = TransactionId::new("T1");
        assert!(s.acquire_lock(&t1, VariableId::new(2), LockMode::Read));
        assert_eq!(s.listeners().collect::<Vec<_>>(), vec![&t1]);

        s.release(&t1);
        assert!(s.lock_table().is_empty());
        assert_eq!(s.listeners().count(), 1);

        s.forget(&t1);
        assert_eq!(s.listeners().count(), 0);
        assert!(s.fail().is_empty());
    }

    #[test]
    fn denied_lock_does_not_register() {
        let mut s = site(1);
        let t1 = TransactionId::new("T1");
        let t2 = TransactionId::new("T2");
        assert!(s.acquire_lock(&t1, VariableId::new(2), LockMode::Write));
        assert!(!s.acquire_lock(&t2, VariableId::new(2), LockMode::Read));
        assert_eq!(s.listeners().count(), 1);
    }

    #[test]
    fn fail_clears_volatile_state() {
        let mut s = site(1);
        let mut t1 = txn("T1", 1);
        let x2 = VariableId::new(2);
        lock_and_write(&mut s, &mut t1, x2, 21);

        let tainted = s.fail();

        assert_eq!(tainted, vec![TransactionId::new("T1")]);
        assert!(!s.is_running());
        assert!(s.lock_table().is_empty());
        assert!(s.staged_write(x2).is_none());
        assert_eq!(s.listeners().count(), 0);
        assert_eq!(s.committed_value(x2), Some(20));
    }

    #[test]
    fn recover_invalidates_replicated_copies_only() {
        let mut s = site(2);
        let x1 = VariableId::new(1);
        let x2 = VariableId::new(2);
        s.fail();
        s.recover();

        assert!(s.is_running());
        assert!(!s.is_initialized(x2));
        assert!(s.is_initialized(x1));
        assert!(!s.snapshot(Some(x2)).copies[0].valid);
    }

    #[test]
    fn recovered_copy_initialized_by_staged_write_then_commit() {
        let mut s = site(1);
        let x2 = VariableId::new(2);
        s.fail();
        s.recover();

        let mut t1 = txn("T1", 3);
        lock_and_write(&mut s, &mut t1, x2, 77);
        assert!(s.is_initialized(x2));

        s.commit(&t1, Tick::new(4));
        s.release(t1.id());
        assert!(s.variable(x2).unwrap().is_valid());
        assert_eq!(s.committed_value(x2), Some(77));
    }

    #[test]
    fn read_snapshot_uses_begin_tick() {
        let mut s = site(1);
        let x2 = VariableId::new(2);
        let reader = Transaction::read_only(TransactionId::new("R"), Tick::new(2));
        let mut t1 = txn("T1", 1);
        lock_and_write(&mut s, &mut t1, x2, 30);
        s.commit(&t1, Tick::new(3));

        assert_eq!(s.read_snapshot(x2, &reader), Some(20));
        assert_eq!(s.read(x2), Some(30));
    }

    #[test]
    fn snapshot_filter() {
        let s = site(4);
        let snap = s.snapshot(Some(VariableId::new(3)));
        assert_eq!(snap.copies.len(), 1);
        assert_eq!(snap.copies[0].value, 30);

        let snap = s.snapshot(Some(VariableId::new(5)));
        assert!(snap.copies.is_empty());
    }
}
