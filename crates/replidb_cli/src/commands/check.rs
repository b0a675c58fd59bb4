//! Check command implementation.

use super::CliError;
use replidb_core::script::Batch;
use std::io::{self, Write};
use std::path::Path;

/// Runs the check command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let batches = super::load_script(Some(path))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let count = report(&batches, &mut out)?;
    if count > 0 {
        return Err(CliError::MalformedScript { count }.into());
    }
    Ok(())
}

/// Writes one line per malformed command and a summary. Returns the number of
/// malformed commands.
pub fn report(batches: &[Batch], out: &mut impl Write) -> io::Result<usize> {
    let mut malformed = 0;
    let mut operations = 0;

    for batch in batches {
        operations += batch.operations.len();
        for err in &batch.errors {
            malformed += 1;
            writeln!(out, "line {}: {err}", batch.line)?;
        }
    }

    writeln!(
        out,
        "{} tick(s), {operations} command(s), {malformed} malformed",
        batches.len()
    )?;
    Ok(malformed)
}
