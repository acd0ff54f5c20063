//! Core business logic - Framework-agnostic reading, statistics and backup operations
//!
//! The pure modules (`reading`, `period`, `statistics`, `codec`, `reminder`,
//! `calendar`) never touch the database. `store` and `settings` own persistence,
//! and `history` combines both into the use cases the CLI calls.

/// Calendar helpers and month names
pub mod calendar;
/// Plain-text export and import format
pub mod codec;
/// Use cases combining the engine, views and stores
pub mod history;
/// History filter by named period
pub mod period;
/// Reading engine: validation and billing of a single reading
pub mod reading;
/// Monthly reminder planning
pub mod reminder;
/// Settings store with defaults
pub mod settings;
/// Statistics, forecast and tariff timeline
pub mod statistics;
/// Reading store
pub mod store;

pub use crate::entities::reading::Model as Reading;
