//! Statistics engine - Summaries, forecast and tariff timeline over a reading list.
//!
//! All functions take readings newest first, the order the store returns them in,
//! and never fail: empty or short inputs produce zeroed summaries or no result.

use crate::{
    core::{
        calendar::{self, Locale},
        settings,
    },
    entities::reading,
};
use chrono::{DateTime, Datelike, TimeZone};
use std::collections::HashMap;

/// Number of recent readings the forecast averages over.
const FORECAST_WINDOW: usize = 3;

/// Aggregates over a set of readings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PeriodStats {
    /// Sum of `amount`
    pub total_paid: f64,
    /// Sum of `consumption`
    pub total_consumption: f64,
    /// `total_consumption / count`
    pub average_consumption: f64,
    /// Smallest single consumption
    pub min_consumption: f64,
    /// Largest single consumption
    pub max_consumption: f64,
    /// One point per reading, oldest first, for left-to-right charts
    pub monthly: Vec<MonthPoint>,
}

/// One bar in the consumption chart.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthPoint {
    /// Capitalized three-letter month abbreviation
    pub month: String,
    /// Consumption recorded by this reading
    pub consumption: f64,
    /// `consumption > average_consumption`
    pub is_above_average: bool,
}

/// Projection of next month's bill.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    /// Capitalized name of the month after now
    pub next_month: String,
    /// Year of `next_month`
    pub year: i32,
    /// Mean consumption of the three most recent readings
    pub expected_consumption: f64,
    /// `expected_consumption * current_tariff`
    pub expected_amount: f64,
}

/// One entry in the tariff timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TariffChange {
    /// Rate per unit
    pub tariff: f64,
    /// Date of the earliest reading that used this rate, epoch milliseconds
    pub effective_date: i64,
    /// Whether this rate matches the current tariff setting
    pub is_current: bool,
}

/// Computes totals, extremes and the per-reading chart series.
#[must_use]
pub fn summarize<Tz: TimeZone>(readings: &[reading::Model], tz: &Tz, locale: Locale) -> PeriodStats {
    if readings.is_empty() {
        return PeriodStats::default();
    }

    let total_paid: f64 = readings.iter().map(|r| r.amount).sum();
    let total_consumption: f64 = readings.iter().map(|r| r.consumption).sum();
    #[allow(clippy::cast_precision_loss)]
    let average_consumption = total_consumption / readings.len() as f64;
    let min_consumption = readings
        .iter()
        .map(|r| r.consumption)
        .fold(f64::INFINITY, f64::min);
    let max_consumption = readings
        .iter()
        .map(|r| r.consumption)
        .fold(f64::NEG_INFINITY, f64::max);

    let monthly = readings
        .iter()
        .rev()
        .map(|r| MonthPoint {
            month: calendar::to_zoned(r.date, tz)
                .map(|dt| locale.month_abbrev(dt.month()))
                .unwrap_or_default(),
            consumption: r.consumption,
            is_above_average: r.consumption > average_consumption,
        })
        .collect();

    PeriodStats {
        total_paid,
        total_consumption,
        average_consumption,
        min_consumption,
        max_consumption,
        monthly,
    }
}

/// Projects next month from the three most recent readings.
///
/// Returns `None` with fewer than three readings. The caller supplies the list
/// already filtered and ordered newest first.
#[must_use]
pub fn forecast<Tz: TimeZone>(
    readings: &[reading::Model],
    current_tariff: f64,
    now: &DateTime<Tz>,
    locale: Locale,
) -> Option<Forecast> {
    if readings.len() < FORECAST_WINDOW {
        return None;
    }

    let recent: f64 = readings
        .iter()
        .take(FORECAST_WINDOW)
        .map(|r| r.consumption)
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let expected_consumption = recent / FORECAST_WINDOW as f64;
    let (year, month) = calendar::next_month(now);

    Some(Forecast {
        next_month: locale.month_title(month),
        year,
        expected_consumption,
        expected_amount: expected_consumption * current_tariff,
    })
}

/// Builds the rate-change timeline, most recent change first.
///
/// Readings are grouped by exact tariff value; each group's earliest reading is
/// taken as the date the rate took effect. A rate reused after a temporary change
/// collapses into one entry dated at its first use.
#[must_use]
pub fn tariff_history(readings: &[reading::Model], current_tariff: f64) -> Vec<TariffChange> {
    let mut earliest: HashMap<u64, &reading::Model> = HashMap::new();

    for reading in readings {
        earliest
            .entry(reading.tariff.to_bits())
            .and_modify(|seen| {
                if reading.date < seen.date {
                    *seen = reading;
                }
            })
            .or_insert(reading);
    }

    let mut changes: Vec<TariffChange> = earliest
        .into_values()
        .map(|reading| TariffChange {
            tariff: reading.tariff,
            effective_date: reading.date,
            is_current: settings::same_tariff(reading.tariff, current_tariff),
        })
        .collect();
    changes.sort_by(|a, b| b.effective_date.cmp(&a.effective_date));
    changes
}
