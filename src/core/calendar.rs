//! Calendar helpers shared by the filter, statistics, codec and reminder code.
//!
//! Readings carry epoch milliseconds; everything calendar-shaped (days, months,
//! years) is evaluated in a caller-supplied time zone. Production code passes
//! `chrono::Local`, tests pass `Utc` so results do not depend on the host.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::Deserialize;

/// Display format for dates in exports, settings and CLI output.
pub const DAY_FORMAT: &str = "%d.%m.%Y";

const RU_MONTHS: [&str; 12] = [
    "январь",
    "февраль",
    "март",
    "апрель",
    "май",
    "июнь",
    "июль",
    "август",
    "сентябрь",
    "октябрь",
    "ноябрь",
    "декабрь",
];

const EN_MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Language for month names.
///
/// Month names are the standalone (nominative) form, which chrono's
/// `%B`/`%b` formatting does not provide for Russian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Russian
    #[default]
    Ru,
    /// English
    En,
}

impl Locale {
    /// Lowercase full month name, `month` is 1-based.
    #[must_use]
    pub fn month_name(self, month: u32) -> &'static str {
        let names = match self {
            Self::Ru => &RU_MONTHS,
            Self::En => &EN_MONTHS,
        };
        let index = usize::try_from(month.clamp(1, 12) - 1).unwrap_or(0);
        names[index]
    }

    /// Capitalized full month name, e.g. `"Ноябрь"`.
    #[must_use]
    pub fn month_title(self, month: u32) -> String {
        capitalize(self.month_name(month))
    }

    /// Capitalized three-letter abbreviation, e.g. `"Ноя"` or `"Nov"`.
    #[must_use]
    pub fn month_abbrev(self, month: u32) -> String {
        capitalize(&self.month_name(month).chars().take(3).collect::<String>())
    }

    /// Placeholder shown when there is no reading yet.
    #[must_use]
    pub const fn no_data(self) -> &'static str {
        match self {
            Self::Ru => "нет данных",
            Self::En => "no data",
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Converts a reading timestamp into a calendar date-time in `tz`.
///
/// Returns `None` only for timestamps outside chrono's representable range.
pub fn to_zoned<Tz: TimeZone>(millis: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(millis).single()
}

/// Epoch milliseconds of local midnight of `day` in `tz`.
///
/// Falls back to the earliest valid instant when midnight is skipped by a DST
/// transition.
pub fn day_start_millis<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> Option<i64> {
    let midnight = day.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

/// Formats a reading timestamp as `dd.mm.yyyy` in `tz`.
#[must_use]
pub fn format_day<Tz: TimeZone>(millis: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    to_zoned(millis, tz).map_or_else(String::new, |dt| dt.format(DAY_FORMAT).to_string())
}

/// Parses a `dd.mm.yyyy` day.
#[must_use]
pub fn parse_day(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DAY_FORMAT).ok()
}

/// Year and month following the month of `now`.
pub fn next_month<Tz: TimeZone>(now: &DateTime<Tz>) -> (i32, u32) {
    if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    }
}
