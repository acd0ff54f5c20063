//! Reading commands - `add`, `history` and `delete-latest`.

use crate::{
    cli::{CliContext, transfer},
    core::{
        calendar,
        history::{self, ReadingInput, Recorded},
        period::{self, Period},
        reading::format_receipt,
    },
    errors::Result,
};
use chrono::{DateTime, TimeZone};
use clap::Args;
use std::fmt::{Display, Write};

/// Arguments for `add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Current meter value
    pub current: String,

    /// Previous meter value (defaults to the last recorded value; requires `settings unlock previous`)
    #[arg(long, short)]
    pub previous: Option<String>,

    /// Tariff per unit (defaults to the stored tariff; requires `settings unlock tariff` to change)
    #[arg(long, short)]
    pub tariff: Option<String>,

    /// Save even if the meter went backwards
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `history`.
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Period to list: 3m, 6m, 12m, last-year or all
    #[arg(long, short, default_value_t = Period::All)]
    pub period: Period,
}

/// Records a reading.
pub async fn add<Tz: TimeZone>(ctx: &CliContext, args: AddArgs, now: &DateTime<Tz>) -> Result<String>
where
    Tz::Offset: Display,
{
    let input = ReadingInput {
        current: &args.current,
        previous: args.previous.as_deref(),
        tariff: args.tariff.as_deref(),
    };
    let recorded =
        history::record_reading(&ctx.database, input, args.force, now, &ctx.config.address).await?;

    let tz = now.timezone();
    Ok(match recorded {
        Recorded::Saved {
            id,
            reading,
            meter_reset,
        } => {
            let mut out = format!("✅ Reading saved (ID: {id})\n");
            if meter_reset {
                out.push_str("⚠️ Saved a reading lower than the previous one (meter reset)\n");
            }
            out.push_str(&format_receipt(&reading, &tz));
            if let Some(dir) = &ctx.config.backup_dir {
                match transfer::write_backup(ctx, dir, now).await {
                    Ok(Some(path)) => {
                        let _ = write!(out, "\n💾 Backup written to {}", path.display());
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!("Backup to {} failed: {}", dir.display(), e);
                        let _ = write!(out, "\n⚠️ Reading saved, but the backup failed: {e}");
                    }
                }
            }
            out
        }
        Recorded::NeedsConfirmation(reading) => format!(
            "⚠️ Current reading {:.0} is lower than previous {:.0}. The meter may have been reset.\n\
             Nothing was saved; run the command again with --force to keep it.",
            reading.current_reading.trunc(),
            reading.previous_reading.trunc()
        ),
    })
}

/// Lists readings, newest first.
pub async fn history<Tz: TimeZone>(
    ctx: &CliContext,
    args: HistoryArgs,
    now: &DateTime<Tz>,
) -> Result<String>
where
    Tz::Offset: Display,
{
    let all = history::list(&ctx.database).await?;
    let readings = period::filter_by_period(&all, args.period, now);

    if readings.is_empty() {
        return Ok(format!(
            "No readings for period {}. Use `meter-buddy add` to record one.",
            args.period
        ));
    }

    let tz = now.timezone();
    let mut out = format!("📋 Readings ({}, {} total)\n", args.period, readings.len());
    for reading in &readings {
        let _ = writeln!(
            out,
            "{}  {:>8.0} -> {:<8.0} {:>7.1}  x {:.2} = {:>9.2}",
            calendar::format_day(reading.date, &tz),
            reading.previous_reading.trunc(),
            reading.current_reading.trunc(),
            reading.consumption,
            reading.tariff,
            reading.amount
        );
    }
    out.push('\n');
    out.push_str(&history::export_summary(&readings));
    Ok(out)
}

/// Deletes the most recent reading.
pub async fn delete_latest<Tz: TimeZone>(ctx: &CliContext, now: &DateTime<Tz>) -> Result<String>
where
    Tz::Offset: Display,
{
    Ok(match history::delete_latest(&ctx.database).await? {
        Some(reading) => format!(
            "🗑️ Deleted reading from {} ({:.0} -> {:.0})",
            calendar::format_day(reading.date, &now.timezone()),
            reading.previous_reading.trunc(),
            reading.current_reading.trunc()
        ),
        None => "Nothing to delete: the history is empty.".to_string(),
    })
}
