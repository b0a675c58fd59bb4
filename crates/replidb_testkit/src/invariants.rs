//! Invariant checkers.
//!
//! Each checker inspects a transaction manager between ticks and reports
//! the first violation it finds.

use replidb_core::{TransactionManager, VariableId};
use std::fmt;

/// A broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Which invariant.
    pub invariant: &'static str,
    /// What was observed.
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.invariant, self.detail)
    }
}

impl std::error::Error for Violation {}

fn violation(invariant: &'static str, detail: String) -> Result<(), Violation> {
    Err(Violation { invariant, detail })
}

/// A write lock excludes every other lock on the same variable at the same
/// site. The writer itself may also hold the read lock.
pub fn check_mutual_exclusion(tm: &TransactionManager) -> Result<(), Violation> {
    for site in tm.sites() {
        let table = site.lock_table();
        for var in tm.config().variables() {
            let Some(writer) = table.write_holder(var) else {
                continue;
            };
            if let Some(reader) = table.read_holders(var).find(|reader| *reader != writer) {
                return violation(
                    "mutual exclusion",
                    format!("{} {var}: {writer} writes while {reader} reads", site.id()),
                );
            }
        }
    }
    Ok(())
}

/// Read-only transactions never appear in any lock table.
pub fn check_read_only_holds_no_locks(tm: &TransactionManager) -> Result<(), Violation> {
    for txn in tm.transactions().filter(|txn| txn.is_read_only()) {
        if let Some(site) = tm.sites().find(|site| site.lock_table().is_held_by(txn.id())) {
            return violation(
                "read-only holds no locks",
                format!("{} holds a lock at {}", txn.id(), site.id()),
            );
        }
    }
    Ok(())
}

/// Every lock belongs to a live transaction; ended ones released theirs.
pub fn check_locks_held_by_live_transactions(tm: &TransactionManager) -> Result<(), Violation> {
    for site in tm.sites() {
        for (var, holder, mode) in site.lock_table().holders() {
            if tm.transaction(&holder).is_none() {
                return violation(
                    "strict two-phase locking",
                    format!("{holder} ended but still holds {mode:?} on {var} at {}", site.id()),
                );
            }
        }
    }
    Ok(())
}

/// Down sites hold no locks and no staged writes.
pub fn check_failed_sites_are_empty(tm: &TransactionManager) -> Result<(), Violation> {
    for site in tm.sites().filter(|site| !site.is_running()) {
        if !site.lock_table().is_empty() {
            return violation("failed site", format!("{} still holds locks", site.id()));
        }
        if let Some(var) = tm
            .config()
            .variables()
            .find(|var| site.staged_write(*var).is_some())
        {
            return violation(
                "failed site",
                format!("{} still has a staged write on {var}", site.id()),
            );
        }
    }
    Ok(())
}

/// Even variables are at every site; odd variable `i` is only at its home
/// site.
pub fn check_placement(tm: &TransactionManager) -> Result<(), Violation> {
    let config = tm.config();
    for var in config.variables() {
        let hosts: Vec<_> = tm
            .sites()
            .filter(|site| site.hosts(var))
            .map(|site| site.id())
            .collect();
        let expected: Vec<_> = match config.home_site(var) {
            Some(home) => vec![home],
            None => config.sites().collect(),
        };
        if hosts != expected {
            return violation(
                "placement",
                format!("{var} is at {hosts:?}, expected {expected:?}"),
            );
        }
    }
    let stray = tm.sites().find_map(|site| {
        let index = config.variable_count + 1;
        site.hosts(VariableId::new(index)).then_some(site.id())
    });
    if let Some(site) = stray {
        return violation("placement", format!("{site} hosts an unknown variable"));
    }
    Ok(())
}

/// Runs every checker.
pub fn check_all(tm: &TransactionManager) -> Result<(), Violation> {
    check_placement(tm)?;
    check_mutual_exclusion(tm)?;
    check_read_only_holds_no_locks(tm)?;
    check_locks_held_by_live_transactions(tm)?;
    check_failed_sites_are_empty(tm)
}
