//! History use cases - Record, delete, import, export and summarize readings.
//!
//! These functions combine the pure engine, filter, statistics and codec with the
//! reading and settings stores. The CLI calls nothing else.

use crate::{
    core::{
        calendar::{self, Locale},
        codec::{self, ImportMetadata},
        period::{self, Period},
        reading,
        reminder::{self, ReminderMessage, ReminderSchedule},
        settings,
        statistics::{self, Forecast, PeriodStats, TariffChange},
        store,
    },
    entities::reading as reading_entity,
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, TimeZone};
use sea_orm::{DatabaseConnection, TransactionTrait};

/// Raw user input for a new reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadingInput<'a> {
    /// Current meter value as typed
    pub current: &'a str,
    /// Previous meter value; defaults to the latest stored current value
    pub previous: Option<&'a str>,
    /// Tariff; defaults to the stored tariff setting
    pub tariff: Option<&'a str>,
}

/// What happened to a new reading.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    /// The reading was stored under `id`.
    Saved {
        /// Id assigned by the store
        id: i64,
        /// The stored reading
        reading: reading_entity::Model,
        /// Whether the meter went backwards and the save was forced
        meter_reset: bool,
    },
    /// The meter went backwards; nothing was stored.
    NeedsConfirmation(reading_entity::Model),
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    /// Readings now in the store
    pub imported: usize,
    /// Lines that could not be parsed
    pub skipped: usize,
    /// Tariff setting after the import
    pub tariff: String,
    /// Tariff change date after the import
    pub tariff_date: NaiveDate,
}

/// Everything the statistics view shows for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    /// Period the readings were filtered to
    pub period: Period,
    /// Filtered readings, newest first
    pub readings: Vec<reading_entity::Model>,
    /// Totals and chart series
    pub stats: PeriodStats,
    /// Next month's projection, rolling periods only
    pub forecast: Option<Forecast>,
    /// Rate changes within the period
    pub tariff_history: Vec<TariffChange>,
}

/// Reminder state as shown by `reminder status`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderStatus<Tz: TimeZone> {
    /// Reminder switch from settings
    pub enabled: bool,
    /// Whether a reminder should be showing now
    pub due: bool,
    /// Next time a reminder fires, `None` when disabled
    pub next: Option<DateTime<Tz>>,
    /// Text of the reminder
    pub message: ReminderMessage,
}

fn format_value(value: f64) -> String {
    format!("{value}")
}

/// Records a new reading.
///
/// Locked fields may not be overridden: passing `previous` while the previous
/// field is locked (and a previous reading exists), or a different `tariff`
/// while the tariff is locked, fails with [`Error::FieldLocked`]. A reading
/// lower than the previous one is stored only when `force` is set.
pub async fn record_reading<Tz: TimeZone>(
    db: &DatabaseConnection,
    input: ReadingInput<'_>,
    force: bool,
    now: &DateTime<Tz>,
    address: &str,
) -> Result<Recorded> {
    let latest = store::latest(db).await?;
    let stored_tariff = settings::tariff(db).await?;
    let previous_locked = settings::is_previous_locked(db).await?;

    let previous = match (input.previous, &latest) {
        (Some(_), Some(_)) if previous_locked => {
            return Err(Error::FieldLocked {
                field: "previous reading",
            });
        }
        (Some(previous), _) => previous.to_string(),
        (None, Some(latest)) => format_value(latest.current_reading),
        (None, None) => {
            return Err(Error::InvalidInput {
                field: "previous reading",
                value: String::new(),
            });
        }
    };

    let tariff_override = match input.tariff {
        Some(tariff) => {
            let value = reading::parse_number("tariff", tariff)?;
            if settings::same_tariff(value, settings::parse_tariff(&stored_tariff)) {
                None
            } else if settings::is_tariff_locked(db).await? {
                return Err(Error::FieldLocked { field: "tariff" });
            } else {
                Some(tariff)
            }
        }
        None => None,
    };
    let tariff = tariff_override.unwrap_or(stored_tariff.as_str());

    let outcome = reading::create_reading(&previous, input.current, tariff, now, address)?;
    let meter_reset = outcome.is_warning();
    if meter_reset && !force {
        tracing::warn!("Current reading is lower than previous; possible meter reset");
        return Ok(Recorded::NeedsConfirmation(outcome.into_reading()));
    }

    let mut reading = outcome.into_reading();
    reading.id = store::insert(db, &reading).await?;
    settings::set_previous_locked(db, true).await?;

    if let Some(tariff) = tariff_override {
        update_tariff(db, tariff, now.date_naive()).await?;
    }

    Ok(Recorded::Saved {
        id: reading.id,
        reading,
        meter_reset,
    })
}

/// Stores a new tariff; if it differs from the current one, the change date
/// becomes `today`.
///
/// # Returns
/// `true` when the tariff actually changed.
pub async fn update_tariff(db: &DatabaseConnection, tariff: &str, today: NaiveDate) -> Result<bool> {
    let value = reading::parse_number("tariff", tariff)?;
    let normalized = tariff.trim().replace(',', ".");
    let current = settings::tariff(db).await?;

    if settings::same_tariff(value, settings::parse_tariff(&current)) {
        return Ok(false);
    }

    settings::set_tariff(db, &normalized).await?;
    settings::set_tariff_change_date(db, today).await?;
    tracing::info!("Tariff changed from {current} to {value}");
    Ok(true)
}

/// Resets the tariff setting for a user starting without a history.
pub async fn start_fresh(db: &DatabaseConnection, today: NaiveDate) -> Result<()> {
    settings::set_tariff(db, settings::DEFAULT_TARIFF).await?;
    settings::set_tariff_change_date(db, today).await?;
    Ok(())
}

/// Whether any reading has been stored yet.
pub async fn has_data(db: &DatabaseConnection) -> Result<bool> {
    Ok(store::count(db).await? > 0)
}

/// The whole history, newest first.
pub async fn list(db: &DatabaseConnection) -> Result<Vec<reading_entity::Model>> {
    store::list_all(db).await
}

/// Removes the most recent reading.
pub async fn delete_latest(db: &DatabaseConnection) -> Result<Option<reading_entity::Model>> {
    store::delete_most_recent(db).await
}

/// Encodes the whole history, optionally preceded by the tariff metadata line.
pub async fn export_history<Tz: TimeZone>(
    db: &DatabaseConnection,
    tz: &Tz,
    include_metadata: bool,
    today: NaiveDate,
) -> Result<String>
where
    Tz::Offset: std::fmt::Display,
{
    let readings = store::list_all(db).await?;
    let body = codec::encode(&readings, tz);

    if !include_metadata {
        return Ok(body);
    }

    let tariff = settings::tariff(db).await?;
    let tariff_date = settings::tariff_change_date(db, today).await?;
    let meta = codec::encode_metadata(&tariff, tariff_date);
    if body.is_empty() {
        Ok(meta)
    } else {
        Ok(format!("{meta}\n{body}"))
    }
}

/// Footer summarizing an export: record count, total consumption and amount.
#[must_use]
pub fn export_summary(readings: &[reading_entity::Model]) -> String {
    let consumption: f64 = readings.iter().map(|r| r.consumption).sum();
    let amount: f64 = readings.iter().map(|r| r.amount).sum();
    format!(
        "Records: {}\nTotal consumption: {:.0}\nTotal amount: {amount:.2}",
        readings.len(),
        codec::whole(consumption)
    )
}

/// Replaces the history with the readings decoded from `text` and updates the
/// tariff settings.
///
/// The tariff becomes the newest reading's tariff, dated at the earliest reading
/// that used it. A metadata line is only used when that cannot be determined.
/// The readings and both tariff settings are written in one transaction;
/// nothing is changed when the text holds no valid record.
pub async fn import_history<Tz: TimeZone>(
    db: &DatabaseConnection,
    text: &str,
    tz: &Tz,
    address: &str,
) -> Result<ImportReport> {
    let decoded = codec::decode(text, tz, address)?;
    let mut readings = decoded.readings;
    readings.sort_by(|a, b| b.date.cmp(&a.date));

    let setting = derive_tariff_setting(&readings, tz)
        .or(decoded.metadata)
        .ok_or(Error::NoValidRecords {
            skipped: decoded.skipped,
        })?;

    let txn = db.begin().await?;
    store::replace_rows(&txn, &readings).await?;
    settings::set_tariff(&txn, &setting.tariff).await?;
    settings::set_tariff_change_date(&txn, setting.tariff_date).await?;
    txn.commit().await?;

    tracing::info!(
        "Imported {} readings ({} lines skipped), tariff {} since {}",
        readings.len(),
        decoded.skipped,
        setting.tariff,
        setting.tariff_date.format(calendar::DAY_FORMAT)
    );

    Ok(ImportReport {
        imported: readings.len(),
        skipped: decoded.skipped,
        tariff: setting.tariff,
        tariff_date: setting.tariff_date,
    })
}

/// Newest reading's tariff, dated at the earliest reading that used it.
fn derive_tariff_setting<Tz: TimeZone>(
    readings: &[reading_entity::Model],
    tz: &Tz,
) -> Option<ImportMetadata> {
    let newest = readings.first()?;

    let since = statistics::tariff_history(readings, newest.tariff)
        .into_iter()
        .find(|change| change.tariff.to_bits() == newest.tariff.to_bits())
        .map_or(newest.date, |change| change.effective_date);

    Some(ImportMetadata {
        tariff: format!("{:.2}", newest.tariff),
        tariff_date: calendar::to_zoned(since, tz)?.date_naive(),
    })
}

/// Filters the history to `period` and computes the statistics view.
///
/// Forecasts are only produced for rolling periods.
pub async fn overview<Tz: TimeZone>(
    db: &DatabaseConnection,
    period: Period,
    now: &DateTime<Tz>,
    locale: Locale,
) -> Result<Overview> {
    let all = store::list_all(db).await?;
    let readings = period::filter_by_period(&all, period, now);
    let current_tariff = settings::parse_tariff(&settings::tariff(db).await?);

    let stats = statistics::summarize(&readings, &now.timezone(), locale);
    let forecast = if period.supports_forecast() {
        statistics::forecast(&readings, current_tariff, now, locale)
    } else {
        None
    };
    let tariff_history = statistics::tariff_history(&readings, current_tariff);

    Ok(Overview {
        period,
        readings,
        stats,
        forecast,
        tariff_history,
    })
}

/// Computes the reminder state at `now`.
pub async fn reminder_status<Tz: TimeZone>(
    db: &DatabaseConnection,
    schedule: &ReminderSchedule,
    now: &DateTime<Tz>,
    locale: Locale,
) -> Result<ReminderStatus<Tz>>
where
    Tz::Offset: std::fmt::Display,
{
    let enabled = settings::is_reminder_enabled(db).await?;
    let latest = store::latest(db).await?;
    let latest_date = latest.as_ref().map(|r| r.date);

    Ok(ReminderStatus {
        enabled,
        due: enabled && schedule.is_due(now, latest_date),
        next: if enabled {
            schedule.next_reminder(now, latest_date)
        } else {
            None
        },
        message: reminder::reminder_message(latest.as_ref(), now, locale),
    })
}
