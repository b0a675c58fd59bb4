//! Scenario fixtures.
//!
//! A [`Scenario`] owns a transaction manager and records the events of
//! every tick, so tests can drive a script and then ask what happened.

use replidb_core::script;
use replidb_core::{
    AbortReason, Config, CoreResult, Event, Operation, TransactionId, TransactionManager, Value,
    VariableId,
};

/// A transaction manager plus the events it produced, tick by tick.
#[derive(Debug, Default)]
pub struct Scenario {
    manager: TransactionManager,
    ticks: Vec<Vec<Event>>,
}

impl Scenario {
    /// Creates a scenario over the default topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scenario over a custom topology.
    pub fn with_config(config: Config) -> CoreResult<Self> {
        Ok(Self {
            manager: TransactionManager::new(config)?,
            ticks: Vec::new(),
        })
    }

    /// Runs one tick with the given operations and returns its events.
    pub fn step(&mut self, ops: impl IntoIterator<Item = Operation>) -> &[Event] {
        let events = self.manager.step(ops);
        let tick = self.ticks.len();
        self.ticks.push(events);
        &self.ticks[tick]
    }

    /// Runs one tick from a `;`-separated line.
    ///
    /// # Panics
    ///
    /// Panics if any command on the line is malformed.
    pub fn line(&mut self, line: &str) -> &[Event] {
        let ops: Vec<Operation> = script::parse_line(line)
            .into_iter()
            .map(|op| op.unwrap_or_else(|err| panic!("bad command in `{line}`: {err}")))
            .collect();
        self.step(ops)
    }

    /// Runs every non-blank line of `text` as its own tick.
    ///
    /// # Panics
    ///
    /// Panics if any command is malformed.
    pub fn script(&mut self, text: &str) -> &mut Self {
        for batch in script::parse_script(text) {
            if let Some(err) = batch.errors.first() {
                panic!("bad command on line {}: {err}", batch.line);
            }
            self.step(batch.operations);
        }
        self
    }

    /// Returns the transaction manager.
    pub fn manager(&self) -> &TransactionManager {
        &self.manager
    }

    /// Returns the events of each tick run so far.
    pub fn ticks(&self) -> &[Vec<Event>] {
        &self.ticks
    }

    /// Returns every event in order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.ticks.iter().flatten()
    }

    /// Names of committed transactions, in commit order.
    pub fn committed(&self) -> Vec<&str> {
        self.events()
            .filter_map(|event| match event {
                Event::Committed { tx, .. } => Some(tx.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Aborted transactions with their reasons, in abort order.
    pub fn aborted(&self) -> Vec<(&str, AbortReason)> {
        self.events()
            .filter_map(|event| match event {
                Event::Aborted { tx, reason } => Some((tx.as_str(), *reason)),
                _ => None,
            })
            .collect()
    }

    /// Values `tx` has read from `var`, in order.
    pub fn reads(&self, tx: &str, var: u32) -> Vec<Value> {
        let tx = TransactionId::new(tx);
        let var = VariableId::new(var);
        self.events()
            .filter_map(|event| match event {
                Event::Read {
                    tx: reader,
                    var: read,
                    value,
                    ..
                } if *reader == tx && *read == var => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Number of `Waiting` events so far.
    pub fn waits(&self) -> usize {
        self.events()
            .filter(|event| matches!(event, Event::Waiting { .. }))
            .count()
    }
}

/// Runs `text` as a script over the default topology.
///
/// # Panics
///
/// Panics if any command is malformed.
pub fn run_script(text: &str) -> Scenario {
    let mut scenario = Scenario::new();
    scenario.script(text);
    scenario
}
