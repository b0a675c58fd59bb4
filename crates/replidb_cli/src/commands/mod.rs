//! CLI command implementations.

pub mod check;
pub mod run;

use replidb_core::script::{self, Batch};
use replidb_core::CoreResult;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// `--format` named something other than `text` or `json`.
    #[error("unknown output format `{0}` (expected text or json)")]
    UnknownFormat(String),

    /// `check` found commands that do not parse.
    #[error("{count} malformed command(s)")]
    MalformedScript {
        /// Number of malformed commands.
        count: usize,
    },
}

/// Reads a script from `path`, or from stdin if there is none.
pub fn load_script(path: Option<&Path>) -> CoreResult<Vec<Batch>> {
    match path {
        Some(path) => script::read_script(BufReader::new(File::open(path)?)),
        None => script::read_script(io::stdin().lock()),
    }
}
