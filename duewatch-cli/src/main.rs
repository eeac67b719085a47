//! Duewatch CLI - overdue-invoice reports in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{diff, logs, parse, status, upload};

/// Duewatch - track newly overdue invoices across report uploads
#[derive(Parser)]
#[command(name = "dw", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a report text file and show its client ledger
    Parse {
        /// Extracted report text (reads stdin when omitted)
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long, conflicts_with = "csv")]
        json: bool,
        /// Output titles as CSV
        #[arg(long)]
        csv: bool,
        /// List every diagnostic recorded while parsing
        #[arg(long)]
        diagnostics: bool,
    },

    /// Parse a report, store it as the feed's newest snapshot and show what is new
    Upload {
        /// Extracted report text (reads stdin when omitted)
        file: Option<PathBuf>,
        /// Feed to store under (defaults to settings / DUEWATCH_FEED)
        #[arg(long)]
        feed: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare the two stored snapshots of a feed
    Diff {
        /// Feed to compare (defaults to settings / DUEWATCH_FEED)
        #[arg(long)]
        feed: Option<String>,
        /// Only titles due on or after this date (YYYY-MM-DD)
        #[arg(long)]
        due_from: Option<String>,
        /// Only titles due on or before this date (YYYY-MM-DD)
        #[arg(long)]
        due_to: Option<String>,
        /// Output as JSON
        #[arg(long, conflicts_with = "csv")]
        json: bool,
        /// Output titles as CSV
        #[arg(long)]
        csv: bool,
    },

    /// Show stored feeds and snapshots
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Parse {
            file,
            json,
            csv,
            diagnostics,
        } => parse::run(file.as_deref(), json, csv, diagnostics),
        Commands::Upload { file, feed, json } => upload::run(file.as_deref(), feed.as_deref(), json),
        Commands::Diff {
            feed,
            due_from,
            due_to,
            json,
            csv,
        } => diff::run(
            feed.as_deref(),
            due_from.as_deref(),
            due_to.as_deref(),
            json,
            csv,
        ),
        Commands::Status { json } => status::run(json),
        Commands::Logs { command } => logs::run(command),
    }
}
