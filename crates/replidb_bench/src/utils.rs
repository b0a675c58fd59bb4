//! Benchmark utilities.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use replidb_core::{Operation, SiteId, TransactionId, VariableId, VAR_COUNT};

/// Shape of a generated workload.
#[derive(Debug, Clone, Copy)]
pub struct Workload {
    /// Number of ticks.
    pub ticks: usize,
    /// Transactions running at once.
    pub concurrency: usize,
    /// Variables drawn from `x1..=hot_variables`. Fewer means more conflicts.
    pub hot_variables: u32,
    /// Share of transactions started read-only, in percent.
    pub read_only_percent: u32,
    /// Chance per tick of a site failing or recovering, in percent.
    pub failure_percent: u32,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            ticks: 200,
            concurrency: 4,
            hot_variables: VAR_COUNT,
            read_only_percent: 20,
            failure_percent: 0,
        }
    }
}

/// Generates a reproducible script for `workload`.
///
/// Each slot runs transactions back to back: begin, a few reads and writes,
/// then end. One slot acts per tick.
pub fn generate_script(workload: &Workload, seed: u64) -> Vec<Vec<Operation>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut slots: Vec<Option<(TransactionId, bool, u32)>> = vec![None; workload.concurrency];
    let mut next_tx = 1_u32;
    let mut down: Vec<SiteId> = Vec::new();
    let mut script = Vec::with_capacity(workload.ticks);

    for _ in 0..workload.ticks {
        let mut batch = Vec::new();

        if rng.gen_range(0..100) < workload.failure_percent {
            match down.pop() {
                Some(site) => batch.push(Operation::Recover(site)),
                None => {
                    let site = SiteId::new(rng.gen_range(1..=10));
                    down.push(site);
                    batch.push(Operation::Fail(site));
                }
            }
        }

        let slot = rng.gen_range(0..slots.len().max(1));
        let Some(entry) = slots.get_mut(slot) else {
            script.push(batch);
            continue;
        };
        match entry.take() {
            None => {
                let tx = TransactionId::new(format!("T{next_tx}"));
                next_tx += 1;
                let read_only = rng.gen_range(0..100) < workload.read_only_percent;
                batch.push(if read_only {
                    Operation::BeginReadOnly(tx.clone())
                } else {
                    Operation::Begin(tx.clone())
                });
                *entry = Some((tx, read_only, rng.gen_range(1..6)));
            }
            Some((tx, _, 0)) => batch.push(Operation::End(tx)),
            Some((tx, read_only, left)) => {
                let var = VariableId::new(rng.gen_range(1..=workload.hot_variables.max(1)));
                if read_only || rng.gen_bool(0.5) {
                    batch.push(Operation::Read {
                        tx: tx.clone(),
                        var,
                    });
                } else {
                    batch.push(Operation::Write {
                        tx: tx.clone(),
                        var,
                        value: rng.gen_range(0..1000),
                    });
                }
                *entry = Some((tx, read_only, left - 1));
            }
        }
        script.push(batch);
    }
    script
}

/// Renders a script as text, one batch per line.
pub fn render_script(script: &[Vec<Operation>]) -> String {
    script
        .iter()
        .map(|batch| {
            batch
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
