use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Agenda and day layout viewer for Almanac calendar exports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file [default: almanac.toml]
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log expansion details to stderr
    #[clap(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List every occurrence in a date range
    Agenda(AgendaCommand),
    /// Show how one day's events are packed into columns
    Day(DayCommand),
    /// Validate the records and recurrence rules in an export
    Check(CheckCommand),
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// JSON file containing an array of event records
    pub file: PathBuf,
    /// Fail when any recurrence rule had to fall back or was truncated
    #[clap(long)]
    pub strict: bool,
    /// Print JSON instead of a table
    #[clap(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct AgendaCommand {
    #[command(flatten)]
    pub export: ExportArgs,
    /// First date to show (YYYY-MM-DD or e.g. "today", "next monday")
    #[clap(long)]
    pub from: Option<String>,
    /// Last date to show, inclusive
    #[clap(long)]
    pub to: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DayCommand {
    #[command(flatten)]
    pub export: ExportArgs,
    /// Date to lay out (defaults to today)
    #[clap(long)]
    pub date: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckCommand {
    /// JSON file containing an array of event records
    pub file: PathBuf,
}
