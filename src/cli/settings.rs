//! Settings commands - `settings` and `reminder`.

use crate::{
    cli::CliContext,
    core::{calendar, history, settings},
    errors::{Error, Result},
};
use chrono::{DateTime, TimeZone};
use clap::{Subcommand, ValueEnum};
use std::fmt::Display;

/// Format for reminder times.
const REMINDER_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Field that can be locked against accidental edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LockField {
    /// The tariff
    Tariff,
    /// The previous-reading value used by `add`
    Previous,
}

/// `settings` subcommands.
#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show every setting
    Show,
    /// Change the tariff (the tariff must be unlocked)
    Tariff {
        /// New tariff per unit
        value: String,
    },
    /// Lock a field
    Lock {
        /// Field to lock
        field: LockField,
    },
    /// Unlock a field
    Unlock {
        /// Field to unlock
        field: LockField,
    },
}

/// `reminder` subcommands.
#[derive(Debug, Subcommand)]
pub enum ReminderCommand {
    /// Show whether a reminder is due and when the next one fires
    Status,
    /// Turn reminders on
    Enable,
    /// Turn reminders off
    Disable,
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn locked(value: bool) -> &'static str {
    if value { "locked" } else { "unlocked" }
}

/// Runs a `settings` subcommand.
pub async fn settings<Tz: TimeZone>(
    ctx: &CliContext,
    command: SettingsCommand,
    now: &DateTime<Tz>,
) -> Result<String> {
    let db = &ctx.database;
    let today = now.date_naive();

    match command {
        SettingsCommand::Show => {
            let current = settings::load(db, today).await?;
            Ok(format!(
                "⚙️ Settings\n\
                 Tariff:          {} (since {}, {})\n\
                 Previous value:  {}\n\
                 Reminders:       {}\n\
                 Address:         {}",
                current.tariff,
                current.tariff_change_date.format(calendar::DAY_FORMAT),
                locked(current.tariff_locked),
                locked(current.previous_locked),
                on_off(current.reminder_enabled),
                ctx.config.address
            ))
        }
        SettingsCommand::Tariff { value } => {
            if settings::is_tariff_locked(db).await? {
                return Err(Error::FieldLocked { field: "tariff" });
            }
            if history::update_tariff(db, &value, today).await? {
                Ok(format!(
                    "✅ Tariff set to {} from {}",
                    settings::tariff(db).await?,
                    today.format(calendar::DAY_FORMAT)
                ))
            } else {
                Ok("Tariff unchanged.".to_string())
            }
        }
        SettingsCommand::Lock { field } => set_lock(db, field, true).await,
        SettingsCommand::Unlock { field } => set_lock(db, field, false).await,
    }
}

async fn set_lock(db: &sea_orm::DatabaseConnection, field: LockField, value: bool) -> Result<String> {
    let name = match field {
        LockField::Tariff => {
            settings::set_tariff_locked(db, value).await?;
            "Tariff"
        }
        LockField::Previous => {
            settings::set_previous_locked(db, value).await?;
            "Previous value"
        }
    };
    Ok(format!("🔒 {name} {}", locked(value)))
}

/// Runs a `reminder` subcommand.
pub async fn reminder<Tz: TimeZone>(
    ctx: &CliContext,
    command: ReminderCommand,
    now: &DateTime<Tz>,
) -> Result<String>
where
    Tz::Offset: Display,
{
    let db = &ctx.database;
    match command {
        ReminderCommand::Enable => {
            settings::set_reminder_enabled(db, true).await?;
            Ok(format!(
                "🔔 Reminders on: from day {} of each month at {:02}:00 until a reading is recorded",
                ctx.config.reminder.start_day, ctx.config.reminder.hour
            ))
        }
        ReminderCommand::Disable => {
            settings::set_reminder_enabled(db, false).await?;
            Ok("🔕 Reminders off".to_string())
        }
        ReminderCommand::Status => {
            let status =
                history::reminder_status(db, &ctx.config.reminder, now, ctx.config.locale).await?;
            if !status.enabled {
                return Ok("🔕 Reminders are off. Turn them on with `meter-buddy reminder enable`.".to_string());
            }

            let mut out = if status.due {
                format!("🔔 {}\n{}", status.message.title, status.message.body)
            } else {
                "No reminder due.".to_string()
            };
            if let Some(next) = status.next {
                out.push_str(&format!(
                    "\nNext reminder: {}",
                    next.format(REMINDER_TIME_FORMAT)
                ));
            }
            Ok(out)
        }
    }
}
