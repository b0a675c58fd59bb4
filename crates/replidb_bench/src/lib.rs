//! Benchmark support for replidb.

pub mod utils;
