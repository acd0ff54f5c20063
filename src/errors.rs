//! Unified error types and result handling for `meter-buddy`.

use thiserror::Error;

/// Every failure the library can report.
///
/// A meter reading lower than the previous one is not an error; see
/// [`crate::core::reading::ReadingOutcome::PossibleMeterReset`].
#[derive(Debug, Error)]
pub enum Error {
    /// A user-entered value did not parse as a finite number.
    #[error("Invalid value for {field}: {value:?}")]
    InvalidInput {
        /// Which input was rejected (e.g. `"current reading"`)
        field: &'static str,
        /// The raw text as entered
        value: String,
    },

    /// An import found no usable lines at all.
    #[error("No valid records found (malformed lines: {skipped})")]
    NoValidRecords {
        /// Number of non-blank lines that were dropped
        skipped: usize,
    },

    /// The caller tried to override a field that is locked in settings.
    #[error("The {field} field is locked; unlock it first")]
    FieldLocked {
        /// Human-readable field name
        field: &'static str,
    },

    /// Configuration file or stored setting could not be used.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Anything coming back from `SeaORM`.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File system errors during import/export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
