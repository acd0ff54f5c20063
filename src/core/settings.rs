//! Settings store - Named scalar settings kept in the `settings` table.
//!
//! Every setting has a defined default that is returned until the user writes a
//! value. Callers pass the connection explicitly; there is no process-wide
//! settings object.

use crate::{
    core::calendar,
    entities::{Setting, setting},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{Set, prelude::*};

/// Tariff used before the user ever sets one.
pub const DEFAULT_TARIFF: &str = "6.84";
const DEFAULT_TARIFF_VALUE: f64 = 6.84;

/// Two tariffs closer than this are the same rate.
pub const TARIFF_TOLERANCE: f64 = 0.01;

/// Identifies one stored setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    /// Current tariff as a decimal string
    Tariff,
    /// Date the current tariff took effect, `dd.mm.yyyy`
    TariffChangeDate,
    /// Guards the tariff field against accidental edits
    TariffLocked,
    /// Guards the previous-reading field against accidental edits
    PreviousLocked,
    /// Whether reading reminders are on
    ReminderEnabled,
}

impl SettingKey {
    /// Column value of the `key` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tariff => "tariff",
            Self::TariffChangeDate => "tariff_change_date",
            Self::TariffLocked => "tariff_locked",
            Self::PreviousLocked => "previous_locked",
            Self::ReminderEnabled => "reminder_enabled",
        }
    }
}

/// Snapshot of every setting with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Current tariff as stored
    pub tariff: String,
    /// Date the tariff took effect
    pub tariff_change_date: NaiveDate,
    /// Tariff field lock
    pub tariff_locked: bool,
    /// Previous-reading field lock
    pub previous_locked: bool,
    /// Reminder switch
    pub reminder_enabled: bool,
}

impl Settings {
    /// Stored tariff as a number, or the default tariff if it does not parse.
    #[must_use]
    pub fn tariff_value(&self) -> f64 {
        parse_tariff(&self.tariff)
    }
}

/// Parses a stored tariff, falling back to [`DEFAULT_TARIFF`].
#[must_use]
pub fn parse_tariff(text: &str) -> f64 {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(DEFAULT_TARIFF_VALUE)
}

/// Whether two tariffs are the same rate, e.g. `6.84` and `6.840`.
#[must_use]
pub fn same_tariff(a: f64, b: f64) -> bool {
    (a - b).abs() < TARIFF_TOLERANCE
}

/// Reads the raw value of a setting.
pub async fn get_setting<C>(db: &C, key: SettingKey) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let row = Setting::find()
        .filter(setting::Column::Key.eq(key.as_str()))
        .one(db)
        .await?;
    Ok(row.map(|s| s.value))
}

/// Writes the raw value of a setting, inserting the row if needed.
pub async fn set_setting<C>(db: &C, key: SettingKey, value: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();

    let existing = Setting::find()
        .filter(setting::Column::Key.eq(key.as_str()))
        .one(db)
        .await?;

    if let Some(row) = existing {
        let mut active_model: setting::ActiveModel = row.into();
        active_model.value = Set(value.to_string());
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_row = setting::ActiveModel {
            key: Set(key.as_str().to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };
        new_row.insert(db).await?;
    }

    tracing::debug!("Setting {} = {}", key.as_str(), value);
    Ok(())
}

async fn get_flag<C>(db: &C, key: SettingKey, default: bool) -> Result<bool>
where
    C: ConnectionTrait,
{
    match get_setting(db, key).await?.as_deref() {
        None => Ok(default),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(Error::Config {
            message: format!("Setting {} has non-boolean value {other:?}", key.as_str()),
        }),
    }
}

async fn set_flag<C>(db: &C, key: SettingKey, value: bool) -> Result<()>
where
    C: ConnectionTrait,
{
    set_setting(db, key, if value { "true" } else { "false" }).await
}

/// Current tariff string, `"6.84"` by default.
pub async fn tariff<C: ConnectionTrait>(db: &C) -> Result<String> {
    Ok(get_setting(db, SettingKey::Tariff)
        .await?
        .unwrap_or_else(|| DEFAULT_TARIFF.to_string()))
}

/// Stores the tariff string as given.
pub async fn set_tariff<C: ConnectionTrait>(db: &C, tariff: &str) -> Result<()> {
    set_setting(db, SettingKey::Tariff, tariff).await
}

/// Date the current tariff took effect, `today` by default.
pub async fn tariff_change_date<C: ConnectionTrait>(db: &C, today: NaiveDate) -> Result<NaiveDate> {
    match get_setting(db, SettingKey::TariffChangeDate).await? {
        None => Ok(today),
        Some(text) => calendar::parse_day(&text).ok_or_else(|| Error::Config {
            message: format!("Failed to parse tariff change date: {text:?}"),
        }),
    }
}

/// Stores the tariff change date.
pub async fn set_tariff_change_date<C: ConnectionTrait>(db: &C, date: NaiveDate) -> Result<()> {
    let text = date.format(calendar::DAY_FORMAT).to_string();
    set_setting(db, SettingKey::TariffChangeDate, &text).await
}

/// Whether the tariff field is locked, `true` by default.
pub async fn is_tariff_locked<C: ConnectionTrait>(db: &C) -> Result<bool> {
    get_flag(db, SettingKey::TariffLocked, true).await
}

/// Locks or unlocks the tariff field.
pub async fn set_tariff_locked<C: ConnectionTrait>(db: &C, locked: bool) -> Result<()> {
    set_flag(db, SettingKey::TariffLocked, locked).await
}

/// Whether the previous-reading field is locked, `true` by default.
pub async fn is_previous_locked<C: ConnectionTrait>(db: &C) -> Result<bool> {
    get_flag(db, SettingKey::PreviousLocked, true).await
}

/// Locks or unlocks the previous-reading field.
pub async fn set_previous_locked<C: ConnectionTrait>(db: &C, locked: bool) -> Result<()> {
    set_flag(db, SettingKey::PreviousLocked, locked).await
}

/// Whether reminders are on, `false` by default.
pub async fn is_reminder_enabled<C: ConnectionTrait>(db: &C) -> Result<bool> {
    get_flag(db, SettingKey::ReminderEnabled, false).await
}

/// Turns reminders on or off.
pub async fn set_reminder_enabled<C: ConnectionTrait>(db: &C, enabled: bool) -> Result<()> {
    set_flag(db, SettingKey::ReminderEnabled, enabled).await
}

/// Loads every setting at once.
pub async fn load<C: ConnectionTrait>(db: &C, today: NaiveDate) -> Result<Settings> {
    Ok(Settings {
        tariff: tariff(db).await?,
        tariff_change_date: tariff_change_date(db, today).await?,
        tariff_locked: is_tariff_locked(db).await?,
        previous_locked: is_previous_locked(db).await?,
        reminder_enabled: is_reminder_enabled(db).await?,
    })
}
