//! Reminder planning - When to nag for a new reading and what to say.
//!
//! A reminder window opens every month on `start_day` at `hour:00`. From then on
//! a reminder is due once a day at the same hour until a reading dated after the
//! window opened exists. The next window opens a month later.
//!
//! This module only computes times and texts. Delivering notifications is left to
//! whatever runs the binary (cron, a systemd timer, a desktop notifier).

use crate::{
    core::calendar::{self, Locale},
    entities::reading,
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use serde::Deserialize;

/// Day of month and hour at which reminders fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReminderSchedule {
    /// First day of the month on which reminders fire (1-28)
    pub start_day: u32,
    /// Hour of day reminders fire at (0-23)
    pub hour: u32,
}

impl Default for ReminderSchedule {
    fn default() -> Self {
        Self {
            start_day: 24,
            hour: 12,
        }
    }
}

/// Notification text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderMessage {
    /// Short headline
    pub title: String,
    /// Longer text with the last known reading
    pub body: String,
}

impl ReminderSchedule {
    /// Rejects days that do not exist in every month and impossible hours.
    pub fn validate(&self) -> Result<()> {
        if !(1..=28).contains(&self.start_day) {
            return Err(Error::Config {
                message: format!(
                    "reminder.start_day must be between 1 and 28, got {}",
                    self.start_day
                ),
            });
        }
        if self.hour > 23 {
            return Err(Error::Config {
                message: format!("reminder.hour must be between 0 and 23, got {}", self.hour),
            });
        }
        Ok(())
    }

    fn at<Tz: TimeZone>(&self, tz: &Tz, day: NaiveDate) -> Option<DateTime<Tz>> {
        let local = day.and_hms_opt(self.hour, 0, 0)?;
        tz.from_local_datetime(&local).earliest()
    }

    fn opening_in<Tz: TimeZone>(&self, tz: &Tz, year: i32, month: u32) -> Option<DateTime<Tz>> {
        self.at(tz, NaiveDate::from_ymd_opt(year, month, self.start_day)?)
    }

    /// The most recent window opening at or before `now`.
    pub fn window_open<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let this_month = self.opening_in(&tz, now.year(), now.month())?;
        if this_month <= *now {
            return Some(this_month);
        }

        let (year, month) = if now.month() == 1 {
            (now.year() - 1, 12)
        } else {
            (now.year(), now.month() - 1)
        };
        self.opening_in(&tz, year, month)
    }

    /// The first window opening strictly after `now`.
    fn next_window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let this_month = self.opening_in(&tz, now.year(), now.month())?;
        if this_month > *now {
            return Some(this_month);
        }
        let (year, month) = calendar::next_month(now);
        self.opening_in(&tz, year, month)
    }

    /// Whether a reminder should be showing at `now`.
    ///
    /// `latest_reading` is the date of the newest reading in epoch milliseconds.
    pub fn is_due<Tz: TimeZone>(&self, now: &DateTime<Tz>, latest_reading: Option<i64>) -> bool {
        self.window_open(now).is_some_and(|open| {
            latest_reading.is_none_or(|date| date < open.timestamp_millis())
        })
    }

    /// When the next reminder should fire.
    ///
    /// While a reminder is due this is the next daily slot; once a reading has
    /// been recorded it is the opening of the next window.
    pub fn next_reminder<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        latest_reading: Option<i64>,
    ) -> Option<DateTime<Tz>> {
        if !self.is_due(now, latest_reading) {
            return self.next_window(now);
        }

        let tz = now.timezone();
        let today = self.at(&tz, now.date_naive())?;
        if today > *now {
            Some(today)
        } else {
            self.at(&tz, now.date_naive() + Duration::days(1))
        }
    }
}

/// Builds the reminder notification text.
#[must_use]
pub fn reminder_message<Tz: TimeZone>(
    latest: Option<&reading::Model>,
    now: &DateTime<Tz>,
    locale: Locale,
) -> ReminderMessage
where
    Tz::Offset: std::fmt::Display,
{
    let month = locale.month_name(now.month());
    let (value, date) = latest.map_or_else(
        || (locale.no_data().to_string(), locale.no_data().to_string()),
        |r| {
            (
                format!("{:.0}", r.current_reading.trunc()),
                calendar::format_day(r.date, &now.timezone()),
            )
        },
    );

    match locale {
        Locale::Ru => ReminderMessage {
            title: "Пора передать показания!".to_string(),
            body: format!(
                "Не забудьте передать показания счётчика за {month}.\n\
                 Последние показания: {value} ({date})"
            ),
        },
        Locale::En => ReminderMessage {
            title: "Time to submit your meter reading!".to_string(),
            body: format!(
                "Don't forget to submit the meter reading for {month}.\n\
                 Last reading: {value} ({date})"
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::reading_on;
    use chrono::Utc;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn millis(y: i32, m: u32, d: u32, h: u32) -> i64 {
        at(y, m, d, h).timestamp_millis()
    }

    #[test]
    fn test_window_open() {
        let schedule = ReminderSchedule::default();

        assert_eq!(schedule.window_open(&at(2026, 10, 25, 9)), Some(at(2026, 10, 24, 12)));
        assert_eq!(schedule.window_open(&at(2026, 10, 24, 12)), Some(at(2026, 10, 24, 12)));
        assert_eq!(schedule.window_open(&at(2026, 10, 17, 9)), Some(at(2026, 9, 24, 12)));
        assert_eq!(schedule.window_open(&at(2026, 1, 5, 9)), Some(at(2025, 12, 24, 12)));
    }

    #[test]
    fn test_not_due_before_window_when_last_month_was_submitted() {
        let schedule = ReminderSchedule::default();
        let now = at(2026, 10, 17, 9);
        let latest = Some(millis(2026, 9, 26, 10));

        assert!(!schedule.is_due(&now, latest));
        assert_eq!(schedule.next_reminder(&now, latest), Some(at(2026, 10, 24, 12)));
    }

    #[test]
    fn test_due_daily_until_reading_entered() {
        let schedule = ReminderSchedule::default();
        let latest = Some(millis(2026, 9, 26, 10));

        let morning = at(2026, 10, 25, 9);
        assert!(schedule.is_due(&morning, latest));
        assert_eq!(schedule.next_reminder(&morning, latest), Some(at(2026, 10, 25, 12)));

        let afternoon = at(2026, 10, 25, 15);
        assert_eq!(schedule.next_reminder(&afternoon, latest), Some(at(2026, 10, 26, 12)));
    }

    #[test]
    fn test_overdue_reminders_continue_into_next_month() {
        let schedule = ReminderSchedule::default();
        let latest = Some(millis(2026, 9, 26, 10));
        let now = at(2026, 11, 2, 13);

        assert!(schedule.is_due(&now, latest));
        assert_eq!(schedule.next_reminder(&now, latest), Some(at(2026, 11, 3, 12)));
    }

    #[test]
    fn test_reading_stops_reminders_until_next_month() {
        let schedule = ReminderSchedule::default();
        let now = at(2026, 10, 27, 15);
        let latest = Some(millis(2026, 10, 27, 14));

        assert!(!schedule.is_due(&now, latest));
        assert_eq!(schedule.next_reminder(&now, latest), Some(at(2026, 11, 24, 12)));
    }

    #[test]
    fn test_december_rolls_into_january() {
        let schedule = ReminderSchedule::default();
        let now = at(2026, 12, 28, 15);
        let latest = Some(millis(2026, 12, 25, 10));

        assert_eq!(schedule.next_reminder(&now, latest), Some(at(2027, 1, 24, 12)));
    }

    #[test]
    fn test_no_readings_is_due() {
        let schedule = ReminderSchedule::default();
        assert!(schedule.is_due(&at(2026, 10, 17, 9), None));
    }

    #[test]
    fn test_custom_schedule_validation() {
        assert!(ReminderSchedule { start_day: 1, hour: 0 }.validate().is_ok());
        assert!(ReminderSchedule { start_day: 0, hour: 12 }.validate().is_err());
        assert!(ReminderSchedule { start_day: 29, hour: 12 }.validate().is_err());
        assert!(ReminderSchedule { start_day: 10, hour: 24 }.validate().is_err());
    }

    #[test]
    fn test_reminder_message_with_reading() {
        let latest = reading_on(2026, 9, 26, 150.0, 6.84);
        let message = reminder_message(Some(&latest), &at(2026, 10, 25, 12), Locale::Ru);

        assert_eq!(message.title, "Пора передать показания!");
        assert!(message.body.contains("за октябрь"));
        assert!(message.body.contains("1150 (26.09.2026)"));
    }

    #[test]
    fn test_reminder_message_without_reading() {
        let message = reminder_message(None, &at(2026, 10, 25, 12), Locale::En);
        assert!(message.body.contains("for october"));
        assert!(message.body.contains("no data (no data)"));
    }
}
