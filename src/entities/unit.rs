//! Unit entity - Units of measure with conversion factors.
//!
//! A unit either is a base unit (`base_unit_id` is `None`) or converts into
//! one via `factor`: a quantity expressed in this unit divided by `factor`
//! yields the quantity in the base unit. The `base_unit_id` graph is expected
//! to be a forest.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Unit database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "units")]
pub struct Model {
    /// Unique identifier for the unit
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the unit (e.g., "g", "kg", "piece")
    pub name: String,
    /// The base unit this unit converts into; `None` for base units
    pub base_unit_id: Option<i64>,
    /// Conversion divisor: `base_quantity = quantity / factor`
    pub factor: f64,
}

/// Defines relationships between Unit and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Non-base units point at their base unit
    #[sea_orm(belongs_to = "Entity", from = "Column::BaseUnitId", to = "Column::Id")]
    BaseUnit,
}

impl ActiveModelBehavior for ActiveModel {}
