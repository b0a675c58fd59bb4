//! Event rendering.

use crate::commands::CliError;
use replidb_core::{Event, SiteSnapshot};
use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;

/// How events are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One human-readable line per event (dumps take one line per site).
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(CliError::UnknownFormat(other.to_string())),
        }
    }
}

/// Writes one event in the given format.
pub fn write_event(
    out: &mut impl Write,
    format: OutputFormat,
    event: &Event,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, event)?;
            writeln!(out)?;
        }
        OutputFormat::Text => writeln!(out, "{}", format_event(event))?,
    }
    Ok(())
}

/// Renders an event as text.
pub fn format_event(event: &Event) -> String {
    match event {
        Event::Began {
            tx,
            tick,
            read_only,
        } => {
            let kind = if *read_only { "read-only" } else { "read-write" };
            format!("{tx} begins ({kind}) at {tick}")
        }
        Event::Read {
            tx,
            var,
            value,
            site,
        } => format!("{tx} reads {var}: {value} from {site}"),
        Event::Wrote {
            tx,
            var,
            value,
            sites,
        } => {
            if sites.is_empty() {
                return format!("{tx} writes {var}: {value} at no running site");
            }
            let sites: Vec<String> = sites.iter().map(|site| site.as_u32().to_string()).collect();
            format!("{tx} writes {var}: {value} at sites {}", sites.join(","))
        }
        Event::Waiting { tx, operation } => format!("{tx} waits on {operation}"),
        Event::Committed { tx, tick } => format!("{tx} commits at {tick}"),
        Event::Aborted { tx, reason } => format!("{tx} aborts ({reason})"),
        Event::SiteFailed { site, tainted } if tainted.is_empty() => format!("{site} fails"),
        Event::SiteFailed { site, tainted } => {
            let names: Vec<&str> = tainted.iter().map(|tx| tx.as_str()).collect();
            format!("{site} fails, tainting {}", names.join(", "))
        }
        Event::SiteRecovered { site } => format!("{site} recovers"),
        Event::Dumped { sites } => sites
            .iter()
            .map(format_site)
            .collect::<Vec<_>>()
            .join("\n"),
        Event::Ignored { operation, reason } => format!("ignored {operation}: {reason}"),
        Event::Malformed { line, reason } => format!("line {line}: skipped {reason}"),
    }
}

/// Renders one site of a dump, e.g. `site 2 - x1: 10, x2: 20`.
///
/// Copies waiting for a write after recovery are marked with `*`.
fn format_site(snapshot: &SiteSnapshot) -> String {
    let mut line = snapshot.site.to_string();
    if !snapshot.running {
        line.push_str(" (down)");
    }
    line.push_str(" -");
    for (i, copy) in snapshot.copies.iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        let mark = if copy.valid { "" } else { "*" };
        let _ = write!(line, "{sep}{}: {}{mark}", copy.var, copy.value);
    }
    line
}
