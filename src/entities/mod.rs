//! Entity module - Contains the SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod reading;
pub mod setting;

pub use reading::{Column as ReadingColumn, Entity as Reading, Model as ReadingModel};
pub use setting::{Column as SettingColumn, Entity as Setting, Model as SettingModel};
