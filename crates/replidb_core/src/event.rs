//! Events reported by the transaction manager.

use crate::operation::Operation;
use crate::site::SiteSnapshot;
use crate::types::{SiteId, Tick, TransactionId, Value, VariableId};
use serde::Serialize;
use std::fmt;

/// Why a transaction was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// It requested a variable that an older transaction has locked.
    WaitDie,
    /// A read-only transaction tried to write.
    ReadOnlyWrite,
    /// A site it had locked at failed before it ended.
    SiteFailure,
    /// It ended while some of its operations were still waiting.
    PendingOperations,
    /// The script aborted it explicitly.
    Requested,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AbortReason::WaitDie => "wait-die",
            AbortReason::ReadOnlyWrite => "write in read-only transaction",
            AbortReason::SiteFailure => "site failure",
            AbortReason::PendingOperations => "operations still waiting",
            AbortReason::Requested => "requested",
        };
        f.write_str(text)
    }
}

/// Something that happened while processing a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A transaction started.
    Began {
        /// The transaction.
        tx: TransactionId,
        /// Its begin tick.
        tick: Tick,
        /// Whether it is read-only.
        read_only: bool,
    },
    /// A read returned a value.
    Read {
        /// Reading transaction.
        tx: TransactionId,
        /// Variable read.
        var: VariableId,
        /// Value seen.
        value: Value,
        /// Site that served the read.
        site: SiteId,
    },
    /// A write was staged at every available copy.
    Wrote {
        /// Writing transaction.
        tx: TransactionId,
        /// Variable written.
        var: VariableId,
        /// Value staged.
        value: Value,
        /// Sites holding the staged value.
        sites: Vec<SiteId>,
    },
    /// An operation could not proceed and was queued for the next tick.
    Waiting {
        /// Owning transaction.
        tx: TransactionId,
        /// The queued operation.
        operation: Operation,
    },
    /// A transaction committed.
    Committed {
        /// The transaction.
        tx: TransactionId,
        /// Commit tick.
        tick: Tick,
    },
    /// A transaction was aborted.
    Aborted {
        /// The transaction.
        tx: TransactionId,
        /// Why.
        reason: AbortReason,
    },
    /// A site went down.
    SiteFailed {
        /// The site.
        site: SiteId,
        /// Live transactions that can no longer commit because of it.
        tainted: Vec<TransactionId>,
    },
    /// A site came back up.
    SiteRecovered {
        /// The site.
        site: SiteId,
    },
    /// Committed state, per site.
    Dumped {
        /// One entry per reported site.
        sites: Vec<SiteSnapshot>,
    },
    /// An operation was discarded without effect.
    Ignored {
        /// The discarded operation.
        operation: Operation,
        /// Why it was discarded.
        reason: String,
    },
    /// A script command did not parse and was skipped.
    Malformed {
        /// 1-based script line.
        line: usize,
        /// The parse error.
        reason: String,
    },
}

impl Event {
    /// Returns the transaction the event concerns, if any.
    #[must_use]
    pub fn transaction(&self) -> Option<&TransactionId> {
        match self {
            Event::Began { tx, .. }
            | Event::Read { tx, .. }
            | Event::Wrote { tx, .. }
            | Event::Waiting { tx, .. }
            | Event::Committed { tx, .. }
            | Event::Aborted { tx, .. } => Some(tx),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_tag() {
        let event = Event::Aborted {
            tx: TransactionId::new("T2"),
            reason: AbortReason::WaitDie,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"aborted","tx":"T2","reason":"wait_die"}"#);
    }

    #[test]
    fn waiting_serializes_operation_text() {
        let event = Event::Waiting {
            tx: TransactionId::new("T2"),
            operation: "R(T2,x4)".parse().unwrap(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"event":"waiting","tx":"T2","operation":"R(T2,x4)"}"#
        );
    }

    #[test]
    fn malformed_serializes_line() {
        let event = Event::Malformed {
            line: 4,
            reason: "unrecognized command: frob(T1)".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"event":"malformed","line":4,"reason":"unrecognized command: frob(T1)"}"#
        );
    }

    #[test]
    fn transaction_accessor() {
        let event = Event::SiteRecovered {
            site: SiteId::new(1),
        };
        assert_eq!(event.transaction(), None);

        let event = Event::Committed {
            tx: TransactionId::new("T1"),
            tick: Tick::new(3),
        };
        assert_eq!(event.transaction(), Some(&TransactionId::new("T1")));
    }
}
