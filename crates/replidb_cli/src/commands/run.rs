//! Run command implementation.

use crate::output::{write_event, OutputFormat};
use replidb_core::script::Batch;
use replidb_core::{Config, DumpTarget, Event, TransactionManager};
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

/// Runs the run command.
pub fn run(
    script: Option<&Path>,
    config: Config,
    format: &str,
    final_dump: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let format: OutputFormat = format.parse()?;
    let batches = super::load_script(script)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(config, batches, format, final_dump, &mut out)
}

/// Feeds each batch to a fresh transaction manager, one tick per batch, and
/// writes the resulting events to `out`.
pub fn execute(
    config: Config,
    batches: Vec<Batch>,
    format: OutputFormat,
    final_dump: bool,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut tm = TransactionManager::new(config)?;

    for batch in batches {
        for err in &batch.errors {
            warn!(line = batch.line, error = %err, "skipping malformed command");
            let event = Event::Malformed {
                line: batch.line,
                reason: err.to_string(),
            };
            write_event(out, format, &event)?;
        }
        for event in tm.step(batch.operations) {
            write_event(out, format, &event)?;
        }
    }

    if final_dump {
        let event = Event::Dumped {
            sites: tm.dump(DumpTarget::All),
        };
        write_event(out, format, &event)?;
    }

    info!(
        tick = %tm.now(),
        live = tm.transactions().count(),
        pending = tm.pending().count(),
        "script finished"
    );
    Ok(())
}
