//! Reading engine - Turns two meter values and a rate into a billed reading.
//!
//! Nothing here touches the database. The engine validates the user's text,
//! computes consumption and amount, and reports whether the meter appears to have
//! gone backwards. Persisting the result is a separate, explicit step
//! (see [`crate::core::store::insert`]).

use crate::{
    entities::reading,
    errors::{Error, Result},
};
use chrono::{DateTime, TimeZone};

/// Result of running the engine on valid input.
///
/// A lower current value than the previous one usually means the meter was
/// replaced or rolled over. It is reported, not rejected, so the user can decide.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingOutcome {
    /// Values are consistent; the reading can be stored.
    Accepted(reading::Model),
    /// `current < previous`; the reading is computed but should be confirmed first.
    PossibleMeterReset(reading::Model),
}

impl ReadingOutcome {
    /// The computed reading, whichever way it was classified.
    #[must_use]
    pub const fn reading(&self) -> &reading::Model {
        match self {
            Self::Accepted(reading) | Self::PossibleMeterReset(reading) => reading,
        }
    }

    /// Consumes the outcome and returns the reading.
    #[must_use]
    pub fn into_reading(self) -> reading::Model {
        match self {
            Self::Accepted(reading) | Self::PossibleMeterReset(reading) => reading,
        }
    }

    /// `true` for [`ReadingOutcome::PossibleMeterReset`].
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::PossibleMeterReset(_))
    }
}

/// Parses a user-entered number.
///
/// Accepts surrounding whitespace and `,` as the decimal separator. Rejects
/// anything that is not finite, so `"inf"` and `"NaN"` fail like any other junk.
pub fn parse_number(field: &'static str, text: &str) -> Result<f64> {
    let normalized = text.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| Error::InvalidInput {
            field,
            value: text.to_string(),
        })
}

/// Creates a reading from raw user input.
///
/// # Arguments
/// * `previous` - Previous meter value as typed
/// * `current` - Current meter value as typed
/// * `tariff` - Rate per unit as typed
/// * `now` - Wall-clock time to stamp on the reading
/// * `address` - Site label for the reading
///
/// # Errors
/// Returns [`Error::InvalidInput`] naming the first value that fails to parse.
pub fn create_reading<Tz: TimeZone>(
    previous: &str,
    current: &str,
    tariff: &str,
    now: &DateTime<Tz>,
    address: &str,
) -> Result<ReadingOutcome> {
    let previous = parse_number("previous reading", previous)?;
    let current = parse_number("current reading", current)?;
    let tariff = parse_number("tariff", tariff)?;

    Ok(compute_reading(previous, current, tariff, now, address))
}

/// Computes a reading from already-parsed values.
#[must_use]
pub fn compute_reading<Tz: TimeZone>(
    previous: f64,
    current: f64,
    tariff: f64,
    now: &DateTime<Tz>,
    address: &str,
) -> ReadingOutcome {
    let consumption = current - previous;
    let amount = consumption * tariff;

    let reading = reading::Model {
        id: 0,
        date: now.timestamp_millis(),
        previous_reading: previous,
        current_reading: current,
        consumption,
        tariff,
        amount,
        address: address.to_string(),
    };

    if current < previous {
        ReadingOutcome::PossibleMeterReset(reading)
    } else {
        ReadingOutcome::Accepted(reading)
    }
}

/// Multi-line receipt shown after a reading is saved.
#[must_use]
pub fn format_receipt<Tz: TimeZone>(reading: &reading::Model, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "Consumed: {:.1}\nTariff: {:.2} per unit\nAmount due: {:.2}\nDate: {}\nMeter: {:.0} -> {:.0}",
        reading.consumption,
        reading.tariff,
        reading.amount,
        crate::core::calendar::format_day(reading.date, tz),
        reading.previous_reading.trunc(),
        reading.current_reading.trunc(),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_create_reading_computes_consumption_and_amount() {
        let outcome = create_reading("1200", "1350", "6.84", &now(), "site").unwrap();
        assert!(!outcome.is_warning());

        let reading = outcome.into_reading();
        assert_eq!(reading.id, 0);
        assert_eq!(reading.previous_reading, 1200.0);
        assert_eq!(reading.current_reading, 1350.0);
        assert_eq!(reading.consumption, 150.0);
        assert_eq!(reading.amount, 150.0 * 6.84);
        assert_eq!(reading.date, now().timestamp_millis());
        assert_eq!(reading.address, "site");
    }

    #[test]
    fn test_amount_is_not_rounded() {
        let reading = compute_reading(0.5, 10.25, 6.95, &now(), "site").into_reading();
        assert_eq!(reading.consumption, 10.25 - 0.5);
        assert_eq!(reading.amount, (10.25 - 0.5) * 6.95);
    }

    #[test]
    fn test_meter_reset_is_a_warning_not_an_error() {
        let outcome = create_reading("100", "80", "5", &now(), "site").unwrap();
        assert!(outcome.is_warning());
        assert!(matches!(outcome, ReadingOutcome::PossibleMeterReset(_)));
        assert_eq!(outcome.reading().consumption, -20.0);
        assert_eq!(outcome.reading().amount, -100.0);
    }

    #[test]
    fn test_equal_values_are_accepted() {
        let outcome = create_reading("100", "100", "5", &now(), "site").unwrap();
        assert!(!outcome.is_warning());
        assert_eq!(outcome.reading().amount, 0.0);
    }

    #[test]
    fn test_comma_decimal_separator() {
        let outcome = create_reading("100", "110", "6,84", &now(), "site").unwrap();
        assert_eq!(outcome.reading().tariff, 6.84);
    }

    #[test]
    fn test_invalid_input_names_the_field() {
        let result = create_reading("100", "abc", "5", &now(), "site");
        match result {
            Err(Error::InvalidInput { field, value }) => {
                assert_eq!(field, "current reading");
                assert_eq!(value, "abc");
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        assert!(matches!(
            create_reading("inf", "100", "5", &now(), "site"),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            create_reading("1", "100", "NaN", &now(), "site"),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            create_reading("", "100", "5", &now(), "site"),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_format_receipt() {
        let reading = compute_reading(1200.0, 1350.0, 6.84, &now(), "site").into_reading();
        let receipt = format_receipt(&reading, &Utc);
        assert!(receipt.contains("Consumed: 150.0"));
        assert!(receipt.contains("Amount due: 1026.00"));
        assert!(receipt.contains("Date: 20.01.2026"));
        assert!(receipt.contains("Meter: 1200 -> 1350"));
    }
}
