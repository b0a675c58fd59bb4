//! # replidb Testkit
//!
//! Test utilities for replidb.
//!
//! This crate provides:
//! - Scenario fixtures that drive a transaction manager tick by tick
//! - Property-based test generators using proptest
//! - Invariant checkers over a manager's sites and lock tables
//!
//! ## Usage
//!
//! ```rust
//! use replidb_testkit::prelude::*;
//!
//! let mut scenario = Scenario::new();
//! scenario.script("begin(T1)\nW(T1,x2,30)\nend(T1)");
//! assert_eq!(scenario.committed(), vec!["T1"]);
//! check_all(scenario.manager()).unwrap();
//! ```

pub mod fixtures;
pub mod generators;
pub mod invariants;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::invariants::*;
}

pub use fixtures::*;
pub use generators::*;
pub use invariants::*;
