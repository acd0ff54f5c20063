//! Reading entity - One recorded meter value and the bill it produced.
//!
//! `consumption` and `amount` are computed once when the reading is created and
//! stored as-is; nothing re-derives them later. `date` is epoch milliseconds.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reading database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "readings")]
pub struct Model {
    /// Assigned by the store on insert; `0` until the reading is persisted
    #[sea_orm(primary_key)]
    pub id: i64,
    /// When the reading was recorded, in epoch milliseconds
    pub date: i64,
    /// Meter value at the previous reading
    pub previous_reading: f64,
    /// Meter value now
    pub current_reading: f64,
    /// `current_reading - previous_reading`
    pub consumption: f64,
    /// Rate in currency per unit at the time of the reading
    pub tariff: f64,
    /// `consumption * tariff`
    pub amount: f64,
    /// Free-text site label
    pub address: String,
}

/// Readings stand alone
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
