//! Line-oriented scripts.
//!
//! Each non-empty line is one batch, processed in one tick. Commands on a
//! line are separated by `;`. Text after `//` or `#` is a comment.

use crate::error::{CoreError, CoreResult};
use crate::operation::Operation;
use std::io::BufRead;

/// The commands of one script line.
#[derive(Debug)]
pub struct Batch {
    /// 1-based line number in the script.
    pub line: usize,
    /// Commands that parsed, in order.
    pub operations: Vec<Operation>,
    /// Commands that did not parse.
    pub errors: Vec<CoreError>,
}

/// Parses the `;`-separated commands of one line.
pub fn parse_line(line: &str) -> Vec<CoreResult<Operation>> {
    strip_comment(line)
        .split(';')
        .filter(|command| !command.trim().is_empty())
        .map(|command| {
            if command.contains(char::REPLACEMENT_CHARACTER) {
                return Err(CoreError::parse(command.trim(), "invalid UTF-8"));
            }
            command.parse::<Operation>()
        })
        .collect()
}

/// Splits a script into batches. Blank and comment-only lines are skipped.
pub fn parse_script(text: &str) -> Vec<Batch> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| parse_batch(index + 1, line))
        .collect()
}

/// Reads a whole script from `reader`.
///
/// Bytes that are not valid UTF-8 only spoil the command they appear in,
/// which is reported in [`Batch::errors`]. Only I/O failures are errors.
pub fn read_script(mut reader: impl BufRead) -> CoreResult<Vec<Batch>> {
    let mut batches = Vec::new();
    let mut buf = Vec::new();
    let mut line_number = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if let Some(batch) = parse_batch(line_number, line) {
            batches.push(batch);
        }
    }
    Ok(batches)
}

fn parse_batch(line_number: usize, line: &str) -> Option<Batch> {
    if strip_comment(line).trim().is_empty() {
        return None;
    }

    let mut batch = Batch {
        line: line_number,
        operations: Vec::new(),
        errors: Vec::new(),
    };
    for parsed in parse_line(line) {
        match parsed {
            Ok(op) => batch.operations.push(op),
            Err(err) => batch.errors.push(err),
        }
    }
    Some(batch)
}

fn strip_comment(line: &str) -> &str {
    let end = [line.find("//"), line.find('#')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}
