//! # replidb core
//!
//! Concurrency control and failure recovery for a replicated, partitioned
//! database, simulated in discrete logical time.
//!
//! This crate provides:
//! - Versioned variables with snapshot reads
//! - Per-site lock tables with shared and exclusive locks
//! - Sites that fail, lose volatile state and recover
//! - A transaction manager implementing strict two-phase locking, wait-die
//!   and the available copies algorithm
//! - The command grammar and script parser
//!
//! ## Example
//!
//! ```rust
//! use replidb_core::{script, Event, TransactionManager};
//!
//! let mut tm = TransactionManager::default();
//! let mut events = Vec::new();
//! for batch in script::parse_script("begin(T1)\nW(T1,x2,30)\nend(T1)\ndump(x2)") {
//!     events.extend(tm.step(batch.operations));
//! }
//! assert!(matches!(events[2], Event::Committed { .. }));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod config;
mod error;
mod event;
mod lock;
mod operation;
pub mod script;
mod site;
mod transaction;
mod types;
mod variable;

pub use clock::Clock;
pub use config::{Config, INITIAL_VALUE_FACTOR, SITE_COUNT, VAR_COUNT};
pub use error::{CoreError, CoreResult};
pub use event::{AbortReason, Event};
pub use lock::{LockMode, LockTable};
pub use operation::{DumpTarget, Operation};
pub use site::{CopySnapshot, Site, SiteSnapshot, StagedWrite};
pub use transaction::{Transaction, TransactionManager, TransactionStatus};
pub use types::{SiteId, Tick, TransactionId, Value, VariableId};
pub use variable::VersionedVariable;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
