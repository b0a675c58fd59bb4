//! Transaction management.
//!
//! Read-write transactions use strict two-phase locking: locks are taken
//! per copy as operations arrive and released only when the transaction
//! ends. Read-only transactions take no locks and read the values committed
//! before they began. Conflicts are resolved by wait-die: a transaction that
//! wants a variable held by an older transaction aborts, otherwise it waits.

mod manager;
mod state;

pub use manager::TransactionManager;
pub use state::{Transaction, TransactionStatus};
