//! Text codec - Plain-text backup format for the reading history.
//!
//! One reading per line:
//!
//! ```text
//! 31.12.2025 1350 150 6.84 1026.00
//! ```
//!
//! `date current consumption tariff amount`, space separated. The previous meter
//! value is not stored; decoding rebuilds it as `current - consumption`. A line
//! starting with `META|` carries the tariff setting and its change date and is
//! never counted as a record.
//!
//! Decoding is deliberately forgiving because export files get edited by hand:
//! each bad line is counted and dropped, and only a file with no good lines at all
//! is an error.

use crate::{
    core::calendar,
    entities::reading,
    errors::{Error, Result},
};
use chrono::{NaiveDate, TimeZone};

/// Prefix of the optional metadata line.
pub const META_PREFIX: &str = "META|";

/// Minimum number of whitespace-separated fields in a record line.
const RECORD_FIELDS: usize = 5;

/// Tariff setting carried in a `META|<tariff>|<dd.mm.yyyy>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportMetadata {
    /// Tariff exactly as written in the file
    pub tariff: String,
    /// Date the tariff took effect
    pub tariff_date: NaiveDate,
}

/// Successful decode result.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedHistory {
    /// Parsed readings in file order, all with `id == 0`
    pub readings: Vec<reading::Model>,
    /// Non-blank, non-metadata lines that could not be parsed
    pub skipped: usize,
    /// First well-formed metadata line, if any
    pub metadata: Option<ImportMetadata>,
}

/// Formats readings one per line, in the order given.
///
/// Meter values and consumption are written as integers (truncated), tariff
/// and amount with two decimals.
#[must_use]
pub fn encode<Tz: TimeZone>(readings: &[reading::Model], tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    readings
        .iter()
        .map(|r| encode_line(r, tz))
        .collect::<Vec<_>>()
        .join("\n")
}

fn encode_line<Tz: TimeZone>(reading: &reading::Model, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} {:.0} {:.0} {:.2} {:.2}",
        calendar::format_day(reading.date, tz),
        whole(reading.current_reading),
        whole(reading.consumption),
        reading.tariff,
        reading.amount
    )
}

/// Drops the fractional part; `-0.4` becomes `0`, never `-0`.
#[must_use]
pub fn whole(value: f64) -> f64 {
    value.trunc() + 0.0
}

/// Formats the metadata line for a tariff and its change date.
#[must_use]
pub fn encode_metadata(tariff: &str, tariff_date: NaiveDate) -> String {
    format!(
        "{META_PREFIX}{tariff}|{}",
        tariff_date.format(calendar::DAY_FORMAT)
    )
}

/// Parses exported text back into readings.
///
/// # Arguments
/// * `text` - File contents
/// * `tz` - Time zone the dates were written in; each reading is dated at local midnight
/// * `address` - Site label for the decoded readings
///
/// # Errors
/// Returns [`Error::NoValidRecords`] with the number of dropped lines when no
/// line could be parsed.
pub fn decode<Tz: TimeZone>(text: &str, tz: &Tz, address: &str) -> Result<DecodedHistory> {
    let mut readings = Vec::new();
    let mut skipped = 0;
    let mut metadata = None;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.starts_with(META_PREFIX) {
            if metadata.is_none() {
                metadata = parse_metadata(line);
            }
            continue;
        }

        match parse_line(line, tz, address) {
            Some(reading) => readings.push(reading),
            None => {
                tracing::debug!("Skipping malformed history line: {line:?}");
                skipped += 1;
            }
        }
    }

    if readings.is_empty() {
        return Err(Error::NoValidRecords { skipped });
    }

    Ok(DecodedHistory {
        readings,
        skipped,
        metadata,
    })
}

fn parse_line<Tz: TimeZone>(line: &str, tz: &Tz, address: &str) -> Option<reading::Model> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < RECORD_FIELDS {
        return None;
    }

    let day = calendar::parse_day(fields[0])?;
    let current = parse_decimal(fields[1])?;
    let consumption = parse_decimal(fields[2])?;
    let tariff = parse_decimal(fields[3])?;
    let amount = parse_decimal(fields[4])?;

    Some(reading::Model {
        id: 0,
        date: calendar::day_start_millis(day, tz)?,
        previous_reading: current - consumption,
        current_reading: current,
        consumption,
        tariff,
        amount,
        address: address.to_string(),
    })
}

fn parse_metadata(line: &str) -> Option<ImportMetadata> {
    let mut parts = line.strip_prefix(META_PREFIX)?.split('|');
    let tariff = parts.next()?.trim();
    let tariff_date = calendar::parse_day(parts.next()?)?;

    // Only keep a tariff that is actually a number
    parse_decimal(tariff)?;

    Some(ImportMetadata {
        tariff: tariff.replace(',', "."),
        tariff_date,
    })
}

fn parse_decimal(token: &str) -> Option<f64> {
    token
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::reading_on;
    use chrono::Utc;

    #[test]
    fn test_encode_format() {
        let readings = vec![
            reading_on(2026, 1, 1, 50.0, 6.84),
            reading_on(2025, 12, 31, 150.0, 6.95),
        ];

        let text = encode(&readings, &Utc);
        assert_eq!(
            text,
            "01.01.2026 1050 50 6.84 342.00\n31.12.2025 1150 150 6.95 1042.50"
        );
    }

    #[test]
    fn test_encode_truncates_meter_values() {
        let mut reading = reading_on(2026, 2, 3, 10.9, 6.84);
        reading.current_reading = 1234.99;
        let text = encode(&[reading], &Utc);
        assert!(text.starts_with("03.02.2026 1234 10 6.84 "));
    }

    #[test]
    fn test_encode_small_negative_consumption_as_zero() {
        let mut reading = reading_on(2026, 1, 1, -0.5, 6.84);
        reading.current_reading = 999.5;
        let text = encode(&[reading], &Utc);
        assert_eq!(text, "01.01.2026 999 0 6.84 -3.42");
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode(&[], &Utc), "");
    }

    #[test]
    fn test_decode_empty_input() {
        for text in ["", "   \n  ", "\n\n"] {
            match decode(text, &Utc, "site") {
                Err(Error::NoValidRecords { skipped }) => assert_eq!(skipped, 0),
                other => panic!("expected NoValidRecords, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_decode_skips_bad_lines() {
        let text = "31.12.2025 100 50 6.84 342.00\nGARBAGE\n01.01.2026 150 50 6.84 342.00";
        let decoded = decode(text, &Utc, "site").unwrap();

        assert_eq!(decoded.readings.len(), 2);
        assert_eq!(decoded.skipped, 1);
        assert!(decoded.metadata.is_none());
    }

    #[test]
    fn test_decode_reconstructs_previous() {
        let decoded = decode("15.03.2026 1350 150 6,84 1026,00", &Utc, "site").unwrap();
        let reading = &decoded.readings[0];

        assert_eq!(reading.id, 0);
        assert_eq!(reading.current_reading, 1350.0);
        assert_eq!(reading.consumption, 150.0);
        assert_eq!(reading.previous_reading, 1200.0);
        assert_eq!(reading.tariff, 6.84);
        assert_eq!(reading.amount, 1026.0);
        assert_eq!(reading.address, "site");
        assert_eq!(calendar::format_day(reading.date, &Utc), "15.03.2026");
    }

    #[test]
    fn test_decode_counts_unparsable_fields() {
        let text = "\
            15.03.2026 1350 150 6.84 1026.00\n\
            15.02.2026 abc 150 6.84 1026.00\n\
            2026-01-15 1050 150 6.84 1026.00\n\
            15.12.2025 900 150\n";
        let decoded = decode(text, &Utc, "site").unwrap();
        assert_eq!(decoded.readings.len(), 1);
        assert_eq!(decoded.skipped, 3);
    }

    #[test]
    fn test_decode_tolerates_extra_whitespace_and_fields() {
        let decoded = decode("  15.03.2026\t1350   150 6.84 1026.00 extra  ", &Utc, "site").unwrap();
        assert_eq!(decoded.readings.len(), 1);
        assert_eq!(decoded.skipped, 0);
    }

    #[test]
    fn test_decode_all_bad_reports_count() {
        match decode("GARBAGE\nmore garbage\n", &Utc, "site") {
            Err(Error::NoValidRecords { skipped }) => assert_eq!(skipped, 2),
            other => panic!("expected NoValidRecords, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_metadata_line() {
        let text = "META|6.95|25.01.2026\n15.03.2026 1350 150 6.95 1042.50";
        let decoded = decode(text, &Utc, "site").unwrap();

        assert_eq!(decoded.readings.len(), 1);
        assert_eq!(decoded.skipped, 0);
        let metadata = decoded.metadata.unwrap();
        assert_eq!(metadata.tariff, "6.95");
        assert_eq!(
            metadata.tariff_date,
            NaiveDate::from_ymd_opt(2026, 1, 25).unwrap()
        );
    }

    #[test]
    fn test_metadata_alone_is_not_a_record() {
        match decode("META|6.95|25.01.2026\n", &Utc, "site") {
            Err(Error::NoValidRecords { skipped }) => assert_eq!(skipped, 0),
            other => panic!("expected NoValidRecords, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_metadata_is_ignored() {
        let text = "META|oops\n15.03.2026 1350 150 6.95 1042.50";
        let decoded = decode(text, &Utc, "site").unwrap();
        assert!(decoded.metadata.is_none());
        assert_eq!(decoded.skipped, 0);
    }

    #[test]
    fn test_encode_metadata() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 25).unwrap();
        assert_eq!(encode_metadata("6.95", date), "META|6.95|25.01.2026");
    }

    #[test]
    fn test_round_trip_keeps_exported_fields() {
        let mut fractional = reading_on(2025, 11, 10, 99.5, 6.5);
        fractional.previous_reading = 1000.25;
        fractional.current_reading = 1099.75;
        let readings = vec![reading_on(2026, 1, 10, 120.0, 6.84), fractional];

        let decoded = decode(&encode(&readings, &Utc), &Utc, "site").unwrap();
        assert_eq!(decoded.readings.len(), 2);

        for (original, restored) in readings.iter().zip(&decoded.readings) {
            assert_eq!(restored.date, original.date);
            assert_eq!(restored.current_reading, original.current_reading.trunc());
            assert_eq!(restored.consumption, original.consumption.trunc());
            assert_eq!(restored.tariff, (original.tariff * 100.0).round() / 100.0);
            assert_eq!(restored.amount, (original.amount * 100.0).round() / 100.0);
        }

        // Integer readings come back whole, fractional ones lose `previous_reading`
        assert_eq!(decoded.readings[0].previous_reading, readings[0].previous_reading);
        assert_ne!(decoded.readings[1].previous_reading, readings[1].previous_reading);
    }
}
