//! Transaction manager.

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::event::{AbortReason, Event};
use crate::lock::LockMode;
use crate::operation::{DumpTarget, Operation};
use crate::site::{Site, SiteSnapshot};
use crate::transaction::state::Transaction;
use crate::types::{SiteId, Tick, TransactionId, Value, VariableId};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, warn};

/// Result of attempting one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    /// The operation took effect.
    Applied,
    /// The operation must be retried on a later tick.
    Queued,
    /// The owning transaction must be aborted.
    AbortRequested {
        tx: TransactionId,
        reason: AbortReason,
    },
}

/// Schedules transactions over replicated sites.
///
/// The transaction manager provides:
/// - Strict two-phase locking for read-write transactions
/// - Snapshot reads without locks for read-only transactions
/// - Wait-die deadlock avoidance
/// - Available copies replication: a read needs one readable copy, a write
///   needs every running copy
///
/// ## Ticks
///
/// Each call to [`TransactionManager::step`] advances the clock and runs
/// one batch. Operations that cannot proceed are queued and retried, ahead
/// of new operations, on every later tick until their transaction ends.
#[derive(Debug)]
pub struct TransactionManager {
    config: Config,
    clock: Clock,
    /// Site `n` is at index `n - 1`.
    sites: Vec<Site>,
    transactions: BTreeMap<TransactionId, Transaction>,
    pending: VecDeque<Operation>,
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::build(Config::default())
    }
}

impl TransactionManager {
    /// Creates a transaction manager with every site up at tick zero.
    pub fn new(config: Config) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        let clock = Clock::new();
        let sites = config
            .sites()
            .map(|id| Site::new(id, &config, clock.now()))
            .collect();

        Self {
            config,
            clock,
            sites,
            transactions: BTreeMap::new(),
            pending: VecDeque::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the current tick.
    #[must_use]
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Returns a site by number.
    #[must_use]
    pub fn site(&self, id: SiteId) -> Option<&Site> {
        let index = id.as_u32().checked_sub(1)?;
        self.sites.get(index as usize)
    }

    /// Returns all sites in ascending order.
    pub fn sites(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter()
    }

    /// Returns a live transaction by name.
    #[must_use]
    pub fn transaction(&self, id: &TransactionId) -> Option<&Transaction> {
        self.transactions.get(id)
    }

    /// Returns all live transactions.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    /// Returns the operations waiting for retry, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &Operation> {
        self.pending.iter()
    }

    /// Advances the clock by one tick, then processes `batch`.
    pub fn step(&mut self, batch: impl IntoIterator<Item = Operation>) -> Vec<Event> {
        let tick = self.clock.advance();
        debug!(%tick, pending = self.pending.len(), "tick");
        self.process(batch)
    }

    /// Processes previously queued operations, then `batch`, at the current
    /// tick.
    pub fn process(&mut self, batch: impl IntoIterator<Item = Operation>) -> Vec<Event> {
        let mut queue = std::mem::take(&mut self.pending);
        queue.extend(batch);

        let mut events = Vec::new();
        while let Some(op) = queue.pop_front() {
            let before = events.len();
            self.execute(op, &mut events);
            for event in &events[before..] {
                if let Event::Aborted { tx, .. } = event {
                    discard_aborted(&mut queue, tx);
                }
            }
        }
        events
    }

    /// Reports the committed state of the sites selected by `target`.
    #[must_use]
    pub fn dump(&self, target: DumpTarget) -> Vec<SiteSnapshot> {
        match target {
            DumpTarget::All => self.sites.iter().map(|site| site.snapshot(None)).collect(),
            DumpTarget::Variable(var) => self
                .sites
                .iter()
                .filter(|site| site.hosts(var))
                .map(|site| site.snapshot(Some(var)))
                .collect(),
            DumpTarget::Site(id) => self
                .site(id)
                .map(|site| site.snapshot(None))
                .into_iter()
                .collect(),
        }
    }

    fn execute(&mut self, op: Operation, events: &mut Vec<Event>) {
        if let Err(err) = self.validate(&op) {
            warn!(operation = %op, error = %err, "operation ignored");
            events.push(Event::Ignored {
                operation: op,
                reason: err.to_string(),
            });
            return;
        }

        match self.translate(&op, events) {
            Outcome::Applied => {}
            Outcome::Queued => {
                if let Some(tx) = op.transaction() {
                    debug!(tx = %tx, operation = %op, "waiting");
                    events.push(Event::Waiting {
                        tx: tx.clone(),
                        operation: op.clone(),
                    });
                }
                self.pending.push_back(op);
            }
            Outcome::AbortRequested { tx, reason } => self.abort(&tx, reason, events),
        }
    }

    /// Rejects operations that name unknown transactions, sites or variables.
    fn validate(&self, op: &Operation) -> CoreResult<()> {
        match op {
            Operation::Begin(tx) | Operation::BeginReadOnly(tx) => {
                if self.transactions.contains_key(tx) {
                    return Err(CoreError::DuplicateTransaction(tx.clone()));
                }
            }
            Operation::Fail(site)
            | Operation::Recover(site)
            | Operation::Dump(DumpTarget::Site(site)) => {
                if !self.config.has_site(*site) {
                    return Err(CoreError::UnknownSite(*site));
                }
            }
            _ => {}
        }
        if let Some(var) = op.variable() {
            if !self.config.has_variable(var) {
                return Err(CoreError::UnknownVariable(var));
            }
        }
        if op.requires_transaction() {
            if let Some(tx) = op.transaction() {
                if !self.transactions.contains_key(tx) {
                    return Err(CoreError::UnknownTransaction(tx.clone()));
                }
            }
        }
        Ok(())
    }

    fn translate(&mut self, op: &Operation, events: &mut Vec<Event>) -> Outcome {
        match op {
            Operation::Begin(tx) => {
                self.begin(Transaction::read_write(tx.clone(), self.now()), events);
                Outcome::Applied
            }
            Operation::BeginReadOnly(tx) => {
                self.begin(Transaction::read_only(tx.clone(), self.now()), events);
                Outcome::Applied
            }
            Operation::Read { tx, var } => {
                if self.has_pending(tx) {
                    return Outcome::Queued;
                }
                self.read(tx, *var, events)
            }
            Operation::Write { tx, var, value } => {
                if self.has_pending(tx) {
                    return Outcome::Queued;
                }
                self.write(tx, *var, *value, events)
            }
            Operation::End(tx) => {
                self.end(tx, events);
                Outcome::Applied
            }
            Operation::Abort(tx) => Outcome::AbortRequested {
                tx: tx.clone(),
                reason: AbortReason::Requested,
            },
            Operation::Fail(site) => {
                self.fail_site(*site, events);
                Outcome::Applied
            }
            Operation::Recover(site) => {
                self.recover_site(*site, events);
                Outcome::Applied
            }
            Operation::Dump(target) => {
                events.push(Event::Dumped {
                    sites: self.dump(*target),
                });
                Outcome::Applied
            }
        }
    }

    fn begin(&mut self, txn: Transaction, events: &mut Vec<Event>) {
        info!(tx = %txn.id(), read_only = txn.is_read_only(), tick = %txn.begin_tick(), "begin");
        events.push(Event::Began {
            tx: txn.id().clone(),
            tick: txn.begin_tick(),
            read_only: txn.is_read_only(),
        });
        self.transactions.insert(txn.id().clone(), txn);
    }

    /// Returns true if an earlier operation of `tx` is still queued.
    fn has_pending(&self, tx: &TransactionId) -> bool {
        self.pending.iter().any(|op| op.transaction() == Some(tx))
    }

    fn read(&mut self, tx: &TransactionId, var: VariableId, events: &mut Vec<Event>) -> Outcome {
        let Some(txn) = self.transactions.get_mut(tx) else {
            return Outcome::Applied;
        };

        if txn.is_read_only() {
            let served = self
                .sites
                .iter()
                // staged writes do not count: snapshots read committed history
                .find(|site| {
                    site.is_running() && site.variable(var).is_some_and(|copy| copy.is_valid())
                })
                .and_then(|site| Some((site.id(), site.read_snapshot(var, txn)?)));
            return match served {
                Some((site, value)) => {
                    events.push(Event::Read {
                        tx: tx.clone(),
                        var,
                        value,
                        site,
                    });
                    Outcome::Applied
                }
                // read-only transactions hold no locks, so they only wait
                None => Outcome::Queued,
            };
        }

        let candidates = self
            .sites
            .iter_mut()
            .filter(|site| site.is_running() && site.is_initialized(var));
        for site in candidates {
            if !site.acquire_lock(tx, var, LockMode::Read) {
                continue;
            }
            txn.record_lock(var);
            if let Some(value) = site.read(var) {
                events.push(Event::Read {
                    tx: tx.clone(),
                    var,
                    value,
                    site: site.id(),
                });
                return Outcome::Applied;
            }
        }
        self.wait_die(tx, var)
    }

    fn write(
        &mut self,
        tx: &TransactionId,
        var: VariableId,
        value: Value,
        events: &mut Vec<Event>,
    ) -> Outcome {
        let Some(txn) = self.transactions.get_mut(tx) else {
            return Outcome::Applied;
        };
        if txn.is_read_only() {
            return Outcome::AbortRequested {
                tx: tx.clone(),
                reason: AbortReason::ReadOnlyWrite,
            };
        }

        let mut staged = Vec::new();
        let mut blocked = false;
        let copies = self
            .sites
            .iter_mut()
            .filter(|site| site.is_running() && site.hosts(var));
        for site in copies {
            if site.acquire_lock(tx, var, LockMode::Write) {
                txn.record_lock(var);
                site.write(tx, var, value);
                staged.push(site.id());
            } else {
                blocked = true;
            }
        }

        if blocked {
            // staged copies stay; the retry re-acquires the same locks
            debug!(tx = %tx, var = %var, staged = staged.len(), "write incomplete");
            return self.wait_die(tx, var);
        }

        events.push(Event::Wrote {
            tx: tx.clone(),
            var,
            value,
            sites: staged,
        });
        Outcome::Applied
    }

    /// Decides between waiting and dying for an unsatisfied request.
    ///
    /// Any live transaction that has locked `var` at any site counts as a
    /// holder. The requester dies if a holder is strictly older, otherwise
    /// it waits.
    fn wait_die(&self, tx: &TransactionId, var: VariableId) -> Outcome {
        let Some(requester) = self.transactions.get(tx) else {
            return Outcome::Queued;
        };
        let older = self
            .transactions
            .values()
            .find(|other| other.holds(var) && other.is_older_than(requester));

        match older {
            Some(holder) => {
                debug!(tx = %tx, var = %var, holder = %holder.id(), "dies");
                Outcome::AbortRequested {
                    tx: tx.clone(),
                    reason: AbortReason::WaitDie,
                }
            }
            None => Outcome::Queued,
        }
    }

    fn end(&mut self, tx: &TransactionId, events: &mut Vec<Event>) {
        let Some(txn) = self.transactions.get(tx) else {
            return;
        };
        let commitable = txn.is_commitable();

        if !commitable {
            self.abort(tx, AbortReason::SiteFailure, events);
        } else if self.has_pending(tx) {
            self.abort(tx, AbortReason::PendingOperations, events);
        } else {
            self.commit(tx, events);
        }
    }

    fn commit(&mut self, tx: &TransactionId, events: &mut Vec<Event>) {
        let Some(mut txn) = self.transactions.remove(tx) else {
            return;
        };
        let tick = self.now();
        for site in self.sites.iter_mut().filter(|site| site.is_running()) {
            let committed = site.commit(&txn, tick);
            if !committed.is_empty() {
                debug!(tx = %tx, site = %site.id(), ?committed, "committed writes");
            }
            site.release(tx);
        }
        self.forget(tx);
        txn.mark_completed();
        self.purge(tx);

        info!(tx = %tx, %tick, "commit");
        events.push(Event::Committed {
            tx: tx.clone(),
            tick,
        });
    }

    fn abort(&mut self, tx: &TransactionId, reason: AbortReason, events: &mut Vec<Event>) {
        let Some(txn) = self.transactions.remove(tx) else {
            return;
        };
        for site in self.sites.iter_mut().filter(|site| site.is_running()) {
            site.abort(&txn);
            site.release(tx);
        }
        self.forget(tx);
        self.purge(tx);

        info!(tx = %tx, %reason, "abort");
        events.push(Event::Aborted {
            tx: tx.clone(),
            reason,
        });
    }

    /// Drops every queued operation of `tx`.
    fn purge(&mut self, tx: &TransactionId) {
        self.pending.retain(|op| op.transaction() != Some(tx));
    }

    /// Removes an ended transaction from every site's listeners.
    fn forget(&mut self, tx: &TransactionId) {
        for site in &mut self.sites {
            site.forget(tx);
        }
    }

    fn fail_site(&mut self, id: SiteId, events: &mut Vec<Event>) {
        let Some(site) = self.site_mut(id) else {
            return;
        };
        let listeners = site.fail();

        let mut tainted = Vec::new();
        for tx in listeners {
            if let Some(txn) = self.transactions.get_mut(&tx) {
                txn.mark_failed();
                tainted.push(tx);
            }
        }
        events.push(Event::SiteFailed { site: id, tainted });
    }

    fn recover_site(&mut self, id: SiteId, events: &mut Vec<Event>) {
        let Some(site) = self.site_mut(id) else {
            return;
        };
        site.recover();
        events.push(Event::SiteRecovered { site: id });
    }

    fn site_mut(&mut self, id: SiteId) -> Option<&mut Site> {
        let index = id.as_u32().checked_sub(1)?;
        self.sites.get_mut(index as usize)
    }
}

/// Drops the operations of an aborted transaction still waiting in this
/// tick's queue, up to a `begin` that reuses its name.
fn discard_aborted(queue: &mut VecDeque<Operation>, tx: &TransactionId) {
    let restart = queue
        .iter()
        .position(|op| {
            matches!(op, Operation::Begin(name) | Operation::BeginReadOnly(name) if name == tx)
        })
        .unwrap_or(queue.len());
    let mut index = 0;
    queue.retain(|op| {
        let keep = index >= restart || op.transaction() != Some(tx);
        index += 1;
        keep
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionStatus;

    fn ops(script: &str) -> Vec<Operation> {
        script
            .split(';')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse().unwrap())
            .collect()
    }

    fn tx(name: &str) -> TransactionId {
        TransactionId::new(name)
    }

    fn x(index: u32) -> VariableId {
        VariableId::new(index)
    }

    #[test]
    fn begin_registers_transaction() {
        let mut tm = TransactionManager::default();
        let events = tm.step(ops("begin(T1); beginRO(T2)"));

        assert_eq!(events.len(), 2);
        let t1 = tm.transaction(&tx("T1")).unwrap();
        assert_eq!(t1.begin_tick(), Tick::new(1));
        assert!(!t1.is_read_only());
        assert!(tm.transaction(&tx("T2")).unwrap().is_read_only());
    }

    #[test]
    fn duplicate_begin_is_ignored() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1)"));
        let events = tm.step(ops("beginRO(T1)"));

        assert!(matches!(events[0], Event::Ignored { .. }));
        let t1 = tm.transaction(&tx("T1")).unwrap();
        assert!(!t1.is_read_only());
        assert_eq!(t1.begin_tick(), Tick::new(1));
    }

    #[test]
    fn unknown_transaction_is_ignored() {
        let mut tm = TransactionManager::default();
        let events = tm.step(ops("R(T9,x2); begin(T1); R(T1,x2)"));

        assert!(matches!(events[0], Event::Ignored { .. }));
        assert!(matches!(events[2], Event::Read { value: 20, .. }));
    }

    #[test]
    fn out_of_range_ids_are_ignored() {
        let mut tm = TransactionManager::default();
        let events = tm.step(ops("begin(T1); R(T1,x21); fail(11); dump(0)"));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, Event::Ignored { .. }))
                .count(),
            3
        );
        assert_eq!(tm.pending().count(), 0);
    }

    #[test]
    fn read_uses_first_site() {
        let mut tm = TransactionManager::default();
        let events = tm.step(ops("begin(T1); R(T1,x2)"));
        assert_eq!(
            events[1],
            Event::Read {
                tx: tx("T1"),
                var: x(2),
                value: 20,
                site: SiteId::new(1),
            }
        );
        let site = tm.site(SiteId::new(1)).unwrap();
        assert_eq!(site.lock_table().read_holders(x(2)).count(), 1);
        assert_eq!(
            tm.site(SiteId::new(2))
                .unwrap()
                .lock_table()
                .read_holders(x(2))
                .count(),
            0
        );
    }

    #[test]
    fn write_locks_every_running_copy() {
        let mut tm = TransactionManager::default();
        tm.step(ops("fail(3)"));
        let events = tm.step(ops("begin(T1); W(T1,x2,5)"));

        let Event::Wrote { sites, .. } = &events[1] else {
            panic!("expected write, got {:?}", events[1]);
        };
        assert_eq!(sites.len(), 9);
        assert!(!sites.contains(&SiteId::new(3)));
        for site in tm.sites().filter(|s| s.is_running()) {
            assert_eq!(site.lock_table().write_holder(x(2)), Some(&tx("T1")));
        }
    }

    #[test]
    fn commit_applies_writes_at_running_sites() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1)"));
        tm.step(ops("W(T1,x2,30)"));
        let events = tm.step(ops("end(T1)"));

        assert_eq!(
            events[0],
            Event::Committed {
                tx: tx("T1"),
                tick: Tick::new(3)
            }
        );
        for site in tm.sites() {
            assert_eq!(site.committed_value(x(2)), Some(30));
            assert!(site.lock_table().is_empty());
        }
        assert!(tm.transaction(&tx("T1")).is_none());
    }

    #[test]
    fn younger_requester_dies_when_holder_is_older() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1)"));
        tm.step(ops("begin(T2)"));
        tm.step(ops("W(T1,x4,1)"));
        let events = tm.step(ops("R(T2,x4)"));

        assert_eq!(
            events[0],
            Event::Aborted {
                tx: tx("T2"),
                reason: AbortReason::WaitDie
            }
        );
        assert!(tm.transaction(&tx("T2")).is_none());
        assert_eq!(tm.pending().count(), 0);
    }

    #[test]
    fn older_requester_waits_for_younger_holder() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1)"));
        tm.step(ops("begin(T2)"));
        tm.step(ops("W(T2,x4,1)"));
        let events = tm.step(ops("R(T1,x4)"));

        assert!(matches!(&events[0], Event::Waiting { tx: t, .. } if t == &tx("T1")));
        assert_eq!(tm.pending().count(), 1);
        assert!(tm.transaction(&tx("T1")).is_some());
    }

    #[test]
    fn dying_writer_discards_partial_writes() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1)"));
        tm.step(ops("begin(T2)"));
        // T1 read-locks x4 at site 1 only, so T2 gets the other nine copies
        tm.step(ops("R(T1,x4)"));
        let events = tm.step(ops("W(T2,x4,9)"));

        assert_eq!(
            events[0],
            Event::Aborted {
                tx: tx("T2"),
                reason: AbortReason::WaitDie
            }
        );
        for site in tm.sites() {
            assert!(site.staged_write(x(4)).is_none());
            assert!(!site.lock_table().is_held_by(&tx("T2")));
        }
    }

    #[test]
    fn same_age_waits() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1); begin(T2)"));
        tm.step(ops("W(T1,x4,1)"));
        let events = tm.step(ops("W(T2,x4,2)"));
        assert!(matches!(&events[0], Event::Waiting { .. }));
    }

    #[test]
    fn queued_operation_retries_after_release() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1)"));
        tm.step(ops("begin(T2)"));
        tm.step(ops("W(T2,x4,44)"));
        tm.step(ops("R(T1,x4)"));
        let events = tm.step(ops("end(T2)"));

        // the retry comes first and is still blocked, then T2 commits
        assert!(matches!(&events[0], Event::Waiting { .. }));
        assert!(matches!(&events[1], Event::Committed { .. }));

        let events = tm.step(Vec::new());
        assert!(matches!(&events[0], Event::Read { value: 44, .. }));
        assert_eq!(tm.pending().count(), 0);
    }

    #[test]
    fn end_with_pending_operation_aborts() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1)"));
        tm.step(ops("begin(T2)"));
        tm.step(ops("W(T2,x4,44)"));
        tm.step(ops("R(T1,x4)"));
        let events = tm.step(ops("end(T1)"));

        assert_eq!(
            events.last(),
            Some(&Event::Aborted {
                tx: tx("T1"),
                reason: AbortReason::PendingOperations
            })
        );
        assert_eq!(tm.pending().count(), 0);
    }

    #[test]
    fn explicit_abort_discards_writes() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1); W(T1,x2,99)"));
        let events = tm.step(ops("abort(T1)"));

        assert_eq!(
            events[0],
            Event::Aborted {
                tx: tx("T1"),
                reason: AbortReason::Requested
            }
        );
        for site in tm.sites() {
            assert_eq!(site.committed_value(x(2)), Some(20));
            assert!(site.staged_write(x(2)).is_none());
        }
    }

    #[test]
    fn read_only_write_aborts() {
        let mut tm = TransactionManager::default();
        let events = tm.step(ops("beginRO(T1); W(T1,x2,5)"));
        assert_eq!(
            events[1],
            Event::Aborted {
                tx: tx("T1"),
                reason: AbortReason::ReadOnlyWrite
            }
        );
    }

    #[test]
    fn site_failure_taints_lock_holders() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1); begin(T2)"));
        tm.step(ops("R(T1,x1); R(T2,x4)"));
        let events = tm.step(ops("fail(2)"));

        // x1 lives at site 2; T2 read x4 from site 1
        assert_eq!(
            events[0],
            Event::SiteFailed {
                site: SiteId::new(2),
                tainted: vec![tx("T1")]
            }
        );
        assert_eq!(
            tm.transaction(&tx("T1")).unwrap().status(),
            TransactionStatus::Failed
        );
        assert_eq!(
            tm.transaction(&tx("T2")).unwrap().status(),
            TransactionStatus::Active
        );
    }

    #[test]
    fn abort_drops_rest_of_batch_for_that_transaction() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1)"));
        tm.step(ops("begin(T2)"));
        tm.step(ops("W(T1,x4,1)"));
        let events = tm.step(ops("R(T2,x4); W(T2,x6,6); end(T2); R(T1,x2)"));

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            Event::Aborted {
                tx: tx("T2"),
                reason: AbortReason::WaitDie
            }
        );
        assert!(matches!(&events[1], Event::Read { tx: t, .. } if t == &tx("T1")));
    }

    #[test]
    fn abort_keeps_operations_of_a_restarted_name() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1)"));
        let events = tm.step(ops("abort(T1); R(T1,x2); begin(T1); R(T1,x4)"));

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], Event::Aborted { .. }));
        assert!(matches!(&events[1], Event::Began { tick: Tick(2), .. }));
        assert!(matches!(&events[2], Event::Read { value: 40, .. }));
    }

    #[test]
    fn later_operations_queue_behind_waiting_one() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1)"));
        tm.step(ops("begin(T2)"));
        tm.step(ops("W(T2,x4,1)"));
        let events = tm.step(ops("R(T1,x4); W(T1,x6,6)"));

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| matches!(e, Event::Waiting { .. })));
        let queued: Vec<_> = tm.pending().map(ToString::to_string).collect();
        assert_eq!(queued, vec!["R(T1,x4)", "W(T1,x6,6)"]);
    }

    #[test]
    fn write_with_no_running_copy_succeeds_without_sites() {
        let mut tm = TransactionManager::default();
        tm.step(ops("begin(T1); fail(2)"));
        let events = tm.step(ops("W(T1,x1,5)"));
        assert_eq!(
            events[0],
            Event::Wrote {
                tx: tx("T1"),
                var: x(1),
                value: 5,
                sites: Vec::new(),
            }
        );
        assert_eq!(tm.pending().count(), 0);

        // nothing was locked at the down site, so nothing taints T1
        let events = tm.step(ops("end(T1)"));
        assert_eq!(
            events[0],
            Event::Committed {
                tx: tx("T1"),
                tick: Tick::new(3)
            }
        );
        assert_eq!(
            tm.site(SiteId::new(2)).unwrap().committed_value(x(1)),
            Some(10)
        );
    }

    #[test]
    fn dump_targets() {
        let tm = TransactionManager::default();
        assert_eq!(tm.dump(DumpTarget::All).len(), 10);
        let by_var = tm.dump(DumpTarget::Variable(x(3)));
        assert_eq!(by_var.len(), 1);
        assert_eq!(by_var[0].site, SiteId::new(4));
        let by_site = tm.dump(DumpTarget::Site(SiteId::new(2)));
        assert_eq!(by_site[0].copies.len(), 12);
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(TransactionManager::new(Config::new().site_count(0)).is_err());
        assert!(TransactionManager::new(Config::new().site_count(3)).is_ok());
    }
}
