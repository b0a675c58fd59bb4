//! replidb CLI
//!
//! Runs transaction scripts against the replicated database simulator.
//!
//! # Commands
//!
//! - `run` - Execute a script, one line per tick, and print the events
//! - `check` - Parse a script and report malformed commands
//! - `version` - Show version information

mod commands;
mod output;

use clap::{Parser, Subcommand};
use replidb_core::{Config, SITE_COUNT, VAR_COUNT};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// replidb transaction simulator.
#[derive(Parser)]
#[command(name = "replidb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a script and print what happens at each tick
    Run {
        /// Script file (reads stdin if omitted)
        script: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Dump every site after the last line
        #[arg(long)]
        final_dump: bool,

        /// Number of sites
        #[arg(long, default_value_t = SITE_COUNT)]
        sites: u32,

        /// Number of variables
        #[arg(long, default_value_t = VAR_COUNT)]
        variables: u32,
    },

    /// Parse a script without running it
    Check {
        /// Script file
        script: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so event output stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            script,
            format,
            final_dump,
            sites,
            variables,
        } => {
            let config = Config::new().site_count(sites).variable_count(variables);
            commands::run::run(script.as_deref(), config, &format, final_dump)?;
        }
        Commands::Check { script } => {
            commands::check::run(&script)?;
        }
        Commands::Version => {
            println!("replidb CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("replidb core v{}", replidb_core::VERSION);
        }
    }

    Ok(())
}
