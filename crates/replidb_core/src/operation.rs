//! Operations submitted to the transaction manager, and their text form.
//!
//! ```text
//! begin(T1); beginRO(T2); R(T1,x4); W(T1,x4,7); end(T1); abort(T2)
//! fail(3); recover(3); dump(); dump(x4); dump(3)
//! ```
//!
//! Keywords are case-insensitive and whitespace is ignored anywhere.

use crate::error::{CoreError, CoreResult};
use crate::types::{SiteId, TransactionId, Value, VariableId};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// What a dump reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpTarget {
    /// Every variable at every site.
    All,
    /// One variable at every site holding it.
    Variable(VariableId),
    /// Every variable at one site.
    Site(SiteId),
}

/// A single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Start a read-write transaction.
    Begin(TransactionId),
    /// Start a read-only transaction.
    BeginReadOnly(TransactionId),
    /// Read a variable.
    Read {
        /// Reading transaction.
        tx: TransactionId,
        /// Variable read.
        var: VariableId,
    },
    /// Write a variable.
    Write {
        /// Writing transaction.
        tx: TransactionId,
        /// Variable written.
        var: VariableId,
        /// New value.
        value: Value,
    },
    /// Try to commit a transaction.
    End(TransactionId),
    /// Abort a transaction.
    Abort(TransactionId),
    /// Take a site down.
    Fail(SiteId),
    /// Bring a site back up.
    Recover(SiteId),
    /// Report committed state.
    Dump(DumpTarget),
}

impl Operation {
    /// Returns the transaction this operation belongs to, if any.
    #[must_use]
    pub fn transaction(&self) -> Option<&TransactionId> {
        match self {
            Operation::Begin(tx)
            | Operation::BeginReadOnly(tx)
            | Operation::End(tx)
            | Operation::Abort(tx)
            | Operation::Read { tx, .. }
            | Operation::Write { tx, .. } => Some(tx),
            Operation::Fail(_) | Operation::Recover(_) | Operation::Dump(_) => None,
        }
    }

    /// Returns the variable this operation touches, if any.
    #[must_use]
    pub fn variable(&self) -> Option<VariableId> {
        match self {
            Operation::Read { var, .. } | Operation::Write { var, .. } => Some(*var),
            Operation::Dump(DumpTarget::Variable(var)) => Some(*var),
            _ => None,
        }
    }

    /// Returns true if the operation needs an existing transaction.
    #[must_use]
    pub fn requires_transaction(&self) -> bool {
        matches!(
            self,
            Operation::Read { .. }
                | Operation::Write { .. }
                | Operation::End(_)
                | Operation::Abort(_)
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Begin(tx) => write!(f, "begin({tx})"),
            Operation::BeginReadOnly(tx) => write!(f, "beginRO({tx})"),
            Operation::Read { tx, var } => write!(f, "R({tx},{var})"),
            Operation::Write { tx, var, value } => write!(f, "W({tx},{var},{value})"),
            Operation::End(tx) => write!(f, "end({tx})"),
            Operation::Abort(tx) => write!(f, "abort({tx})"),
            Operation::Fail(site) => write!(f, "fail({})", site.as_u32()),
            Operation::Recover(site) => write!(f, "recover({})", site.as_u32()),
            Operation::Dump(DumpTarget::All) => f.write_str("dump()"),
            Operation::Dump(DumpTarget::Variable(var)) => write!(f, "dump({var})"),
            Operation::Dump(DumpTarget::Site(site)) => write!(f, "dump({})", site.as_u32()),
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for Operation {
    type Err = CoreError;

    fn from_str(text: &str) -> CoreResult<Self> {
        let command: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let Some((keyword, rest)) = command.split_once('(') else {
            return Err(CoreError::unknown_command(command));
        };
        let Some(inner) = rest.strip_suffix(')') else {
            return Err(CoreError::parse(&command, "missing closing parenthesis"));
        };
        let args: Vec<&str> = if inner.is_empty() {
            Vec::new()
        } else {
            inner.split(',').collect()
        };
        let args = Args {
            command: &command,
            args,
        };

        match keyword.to_ascii_uppercase().as_str() {
            "BEGIN" => {
                args.expect(1)?;
                Ok(Operation::Begin(args.transaction(0)?))
            }
            "BEGINRO" => {
                args.expect(1)?;
                Ok(Operation::BeginReadOnly(args.transaction(0)?))
            }
            "R" => {
                args.expect(2)?;
                Ok(Operation::Read {
                    tx: args.transaction(0)?,
                    var: args.variable(1)?,
                })
            }
            "W" => {
                args.expect(3)?;
                Ok(Operation::Write {
                    tx: args.transaction(0)?,
                    var: args.variable(1)?,
                    value: args.value(2)?,
                })
            }
            "END" => {
                args.expect(1)?;
                Ok(Operation::End(args.transaction(0)?))
            }
            "ABORT" => {
                args.expect(1)?;
                Ok(Operation::Abort(args.transaction(0)?))
            }
            "FAIL" => {
                args.expect(1)?;
                Ok(Operation::Fail(args.site(0)?))
            }
            "RECOVER" => {
                args.expect(1)?;
                Ok(Operation::Recover(args.site(0)?))
            }
            "DUMP" => match args.args.as_slice() {
                [] => Ok(Operation::Dump(DumpTarget::All)),
                [arg] if arg.starts_with(['x', 'X']) => {
                    Ok(Operation::Dump(DumpTarget::Variable(args.variable(0)?)))
                }
                [_] => Ok(Operation::Dump(DumpTarget::Site(args.site(0)?))),
                _ => Err(CoreError::parse(&command, "dump takes at most 1 argument")),
            },
            _ => Err(CoreError::unknown_command(command)),
        }
    }
}

/// Argument list of one command, with the command text for error messages.
struct Args<'a> {
    command: &'a str,
    args: Vec<&'a str>,
}

impl Args<'_> {
    fn expect(&self, count: usize) -> CoreResult<()> {
        if self.args.len() != count {
            return Err(CoreError::parse(
                self.command,
                format!("expected {count} argument(s), got {}", self.args.len()),
            ));
        }
        Ok(())
    }

    fn transaction(&self, at: usize) -> CoreResult<TransactionId> {
        match self.args[at] {
            "" => Err(CoreError::parse(self.command, "empty transaction name")),
            name => Ok(TransactionId::new(name)),
        }
    }

    fn variable(&self, at: usize) -> CoreResult<VariableId> {
        let arg = self.args[at];
        let index = arg
            .strip_prefix(['x', 'X'])
            .and_then(|digits| digits.parse::<u32>().ok())
            .ok_or_else(|| CoreError::parse(self.command, format!("bad variable `{arg}`")))?;
        Ok(VariableId::new(index))
    }

    fn site(&self, at: usize) -> CoreResult<SiteId> {
        let arg = self.args[at];
        arg.parse::<u32>()
            .map(SiteId::new)
            .map_err(|_| CoreError::parse(self.command, format!("bad site `{arg}`")))
    }

    fn value(&self, at: usize) -> CoreResult<Value> {
        let arg = self.args[at];
        arg.parse::<Value>()
            .map_err(|_| CoreError::parse(self.command, format!("bad value `{arg}`")))
    }
}
