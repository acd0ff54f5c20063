/// Application settings loaded from `meter-buddy.toml`
pub mod app;

/// Database configuration and connection management
pub mod database;
