//! Command-line layer - Argument parsing and command handlers
//!
//! Every handler takes the shared [`CliContext`] and the current time, calls into
//! [`crate::core`] and returns the text to print. Nothing here writes to stdout
//! directly, which keeps the handlers testable.

/// `add`, `history` and `delete-latest`
pub mod reading;
/// `settings` and `reminder`
pub mod settings;
/// `stats`
pub mod stats;
/// `export`, `import` and `init`
pub mod transfer;

use crate::{config::app::AppConfig, errors::Result};
use chrono::{DateTime, TimeZone};
use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;
use std::fmt::Display;

/// Meter Buddy - track utility meter readings and what they cost.
#[derive(Debug, Parser)]
#[command(name = "meter-buddy")]
#[command(about = "Track utility meter readings, costs and tariffs")]
#[command(long_about = r#"
Meter Buddy keeps a history of meter readings in a local SQLite database,
computes consumption and cost, and shows per-period statistics.

Examples:
  meter-buddy add 1350                 # Previous value taken from the last reading
  meter-buddy stats --period 12m       # Last twelve months
  meter-buddy export --with-metadata   # Backup including the tariff setting
  meter-buddy import backup.txt        # Replace the history from a backup
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (debug logging)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a new meter reading
    #[command(visible_alias = "a")]
    Add(reading::AddArgs),

    /// List stored readings
    #[command(visible_alias = "h")]
    History(reading::HistoryArgs),

    /// Delete the most recent reading
    DeleteLatest,

    /// Show statistics and a forecast for a period
    #[command(visible_alias = "s")]
    Stats(stats::StatsArgs),

    /// Write the history to a text file
    Export(transfer::ExportArgs),

    /// Replace the history with the contents of a text file
    Import(transfer::ImportArgs),

    /// Set up a new installation, optionally from a backup
    Init(transfer::InitArgs),

    /// Show or change settings
    #[command(subcommand)]
    Settings(settings::SettingsCommand),

    /// Inspect or toggle monthly reading reminders
    #[command(subcommand)]
    Reminder(settings::ReminderCommand),
}

/// Shared data available to all command handlers.
pub struct CliContext {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Settings loaded from `meter-buddy.toml`
    pub config: AppConfig,
}

impl CliContext {
    /// Creates a new `CliContext`.
    #[must_use]
    pub const fn new(database: DatabaseConnection, config: AppConfig) -> Self {
        Self { database, config }
    }
}

/// Runs one command and returns its output.
pub async fn execute<Tz: TimeZone>(
    ctx: &CliContext,
    command: Command,
    now: &DateTime<Tz>,
) -> Result<String>
where
    Tz::Offset: Display,
{
    match command {
        Command::Add(args) => reading::add(ctx, args, now).await,
        Command::History(args) => reading::history(ctx, args, now).await,
        Command::DeleteLatest => reading::delete_latest(ctx, now).await,
        Command::Stats(args) => stats::stats(ctx, args, now).await,
        Command::Export(args) => transfer::export(ctx, args, now).await,
        Command::Import(args) => transfer::import(ctx, args, now).await,
        Command::Init(args) => transfer::init(ctx, args, now).await,
        Command::Settings(command) => settings::settings(ctx, command, now).await,
        Command::Reminder(command) => settings::reminder(ctx, command, now).await,
    }
}
