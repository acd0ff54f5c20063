//! Shared test utilities for `MeterBuddy`.
//!
//! This module provides helpers for setting up test databases and building
//! readings with predictable values.

use crate::{core::store, entities::reading, errors::Result};
use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all database tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds an unsaved reading dated at UTC midnight of the given day.
///
/// # Defaults
/// * `previous_reading`: 1000.0
/// * `current_reading`: 1000.0 + `consumption`
/// * `amount`: `consumption * tariff`
/// * `address`: "test"
#[allow(clippy::missing_panics_doc)]
pub fn reading_on(year: i32, month: u32, day: u32, consumption: f64, tariff: f64) -> reading::Model {
    #[allow(clippy::unwrap_used)]
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt).timestamp_millis())
        .unwrap();

    reading::Model {
        id: 0,
        date,
        previous_reading: 1000.0,
        current_reading: 1000.0 + consumption,
        consumption,
        tariff,
        amount: consumption * tariff,
        address: "test".to_string(),
    }
}

/// Stores a reading built by [`reading_on`] and returns it with its new id.
pub async fn insert_reading_on(
    db: &DatabaseConnection,
    year: i32,
    month: u32,
    day: u32,
    consumption: f64,
    tariff: f64,
) -> Result<reading::Model> {
    let mut reading = reading_on(year, month, day, consumption, tariff);
    reading.id = store::insert(db, &reading).await?;
    Ok(reading)
}
