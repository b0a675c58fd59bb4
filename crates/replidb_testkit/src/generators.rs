//! Property-based test generators using proptest.
//!
//! Strategies draw names and ids from small pools so that generated
//! transactions actually contend for the same variables and sites.

use proptest::prelude::*;
use replidb_core::{
    DumpTarget, LockMode, Operation, SiteId, TransactionId, Value, VariableId, SITE_COUNT,
    VAR_COUNT,
};

/// Strategy for transaction names `T1..=Tmax`.
pub fn transaction_id_strategy(max: u32) -> impl Strategy<Value = TransactionId> {
    (1..=max).prop_map(|n| TransactionId::new(format!("T{n}")))
}

/// Strategy for variables of the default topology.
pub fn variable_strategy() -> impl Strategy<Value = VariableId> {
    (1..=VAR_COUNT).prop_map(VariableId::new)
}

/// Strategy for sites of the default topology.
pub fn site_strategy() -> impl Strategy<Value = SiteId> {
    (1..=SITE_COUNT).prop_map(SiteId::new)
}

/// Strategy for written values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    -1000..1000_i64
}

/// Strategy for single operations over the default topology, using at most
/// `transactions` distinct transaction names.
///
/// Reads and writes dominate; failures and recoveries are rare.
pub fn operation_strategy(transactions: u32) -> impl Strategy<Value = Operation> {
    let tx = move || transaction_id_strategy(transactions);
    prop_oneof![
        3 => tx().prop_map(Operation::Begin),
        1 => tx().prop_map(Operation::BeginReadOnly),
        6 => (tx(), variable_strategy()).prop_map(|(tx, var)| Operation::Read { tx, var }),
        6 => (tx(), variable_strategy(), value_strategy())
            .prop_map(|(tx, var, value)| Operation::Write { tx, var, value }),
        3 => tx().prop_map(Operation::End),
        1 => tx().prop_map(Operation::Abort),
        1 => site_strategy().prop_map(Operation::Fail),
        1 => site_strategy().prop_map(Operation::Recover),
        1 => Just(Operation::Dump(DumpTarget::All)),
    ]
}

/// Strategy for a single lock request on a small pool of variables.
pub fn lock_request_strategy() -> impl Strategy<Value = (TransactionId, VariableId, LockMode)> {
    (
        transaction_id_strategy(4),
        (1..=4_u32).prop_map(VariableId::new),
        prop_oneof![Just(LockMode::Read), Just(LockMode::Write)],
    )
}

/// Strategy for scripts of `min_ticks..max_ticks` batches, each holding one
/// to three operations.
pub fn script_strategy(
    transactions: u32,
    min_ticks: usize,
    max_ticks: usize,
) -> impl Strategy<Value = Vec<Vec<Operation>>> {
    prop::collection::vec(
        prop::collection::vec(operation_strategy(transactions), 1..4),
        min_ticks..max_ticks,
    )
}
