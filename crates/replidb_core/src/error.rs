//! Error types for replidb core.

use crate::types::{SiteId, TransactionId, VariableId};
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in replidb core operations.
///
/// Lock conflicts and aborts are not errors: the scheduler handles them by
/// queueing or aborting the requesting transaction.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error while reading a script.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A command could not be parsed.
    #[error("malformed command `{command}`: {message}")]
    Parse {
        /// The offending command text.
        command: String,
        /// Description of the problem.
        message: String,
    },

    /// The command keyword is not recognised.
    #[error("unrecognized command: {command}")]
    UnknownCommand {
        /// The offending command text.
        command: String,
    },

    /// The site does not exist in the configured topology.
    #[error("unknown site: {0}")]
    UnknownSite(SiteId),

    /// The variable does not exist in the configured topology.
    #[error("unknown variable: {0}")]
    UnknownVariable(VariableId),

    /// No live transaction has this name.
    #[error("transaction {0} does not exist")]
    UnknownTransaction(TransactionId),

    /// A live transaction already has this name.
    #[error("transaction {0} already exists")]
    DuplicateTransaction(TransactionId),

    /// The configuration cannot describe a valid topology.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a parse error.
    pub fn parse(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown command error.
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
