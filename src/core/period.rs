//! History filter - Restricts a reading list to a named time window.

use crate::{core::calendar, entities::reading};
use chrono::{DateTime, Datelike, Months, TimeZone};
use std::{fmt, str::FromStr};

/// Readings dated before this day of January belong to the previous year's bill.
///
/// Readings are usually taken mid-month, so an early-January reading reports
/// December's consumption.
const YEAR_BOUNDARY_DAY: u32 = 15;

/// Named window over the reading history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    /// Rolling three calendar months back from now
    Last3Months,
    /// Rolling six calendar months back from now
    #[default]
    Last6Months,
    /// Rolling twelve calendar months back from now
    Last12Months,
    /// Billing year before the current one (Jan 15 .. Jan 14)
    PriorCalendarYear,
    /// Everything
    All,
}

impl Period {
    /// Every period, in menu order.
    pub const ALL_PERIODS: [Self; 5] = [
        Self::Last3Months,
        Self::Last6Months,
        Self::Last12Months,
        Self::PriorCalendarYear,
        Self::All,
    ];

    /// Number of months in a rolling window, `None` for the other periods.
    #[must_use]
    pub const fn rolling_months(self) -> Option<u32> {
        match self {
            Self::Last3Months => Some(3),
            Self::Last6Months => Some(6),
            Self::Last12Months => Some(12),
            Self::PriorCalendarYear | Self::All => None,
        }
    }

    /// Forecasts only make sense for windows ending now.
    #[must_use]
    pub const fn supports_forecast(self) -> bool {
        self.rolling_months().is_some()
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Last3Months => "3m",
            Self::Last6Months => "6m",
            Self::Last12Months => "12m",
            Self::PriorCalendarYear => "last-year",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL_PERIODS
            .into_iter()
            .find(|period| period.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown period {s:?} (expected 3m, 6m, 12m, last-year or all)"))
    }
}

/// Returns the readings that fall inside `period`, in their original order.
///
/// Calendar fields are evaluated in the time zone of `now`.
#[must_use]
pub fn filter_by_period<Tz: TimeZone>(
    readings: &[reading::Model],
    period: Period,
    now: &DateTime<Tz>,
) -> Vec<reading::Model> {
    match period {
        Period::All => readings.to_vec(),
        Period::Last3Months | Period::Last6Months | Period::Last12Months => {
            let months = period.rolling_months().unwrap_or_default();
            let cutoff = now
                .clone()
                .checked_sub_months(Months::new(months))
                .map_or(i64::MIN, |dt| dt.timestamp_millis());
            readings
                .iter()
                .filter(|r| r.date >= cutoff)
                .cloned()
                .collect()
        }
        Period::PriorCalendarYear => {
            let year = now.year() - 1;
            let tz = now.timezone();
            readings
                .iter()
                .filter(|r| in_billing_year(r.date, year, &tz))
                .cloned()
                .collect()
        }
    }
}

fn in_billing_year<Tz: TimeZone>(millis: i64, year: i32, tz: &Tz) -> bool {
    let Some(dt) = calendar::to_zoned(millis, tz) else {
        return false;
    };
    let early_january = dt.month() == 1 && dt.day() < YEAR_BOUNDARY_DAY;

    (dt.year() == year && !early_january) || (dt.year() == year + 1 && early_january)
}
