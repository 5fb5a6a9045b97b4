//! `IngredientPrice` entity - One row of an ingredient's price history.
//!
//! Exactly one of `price` and `base_product_id` is set, never both and never
//! neither; this is enforced at write time, not by the schema. `price` is
//! stored per base unit and `quantity` in base units, so rows entered in
//! different display units compare directly. Rows are append-only; the row
//! with the highest `time_stamp` is the ingredient's current price.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ingredient price database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredient_prices")]
pub struct Model {
    /// Unique identifier for the price row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Ingredient this price row belongs to
    pub ingredient_id: i64,
    /// When the price row was recorded
    pub time_stamp: DateTimeUtc,
    /// Direct price per base unit; `None` when the price derives from a base product
    pub price: Option<f64>,
    /// Quantity the price applies to, in base units
    pub quantity: f64,
    /// Unit the quantity was originally entered in
    pub unit_id: i64,
    /// Product whose computed cost serves as this ingredient's price.
    /// Resolved by the engine, not a schema-level foreign key: product
    /// deletion is guarded against current rows only, so historic rows may
    /// keep a reference to a product that no longer exists.
    pub base_product_id: Option<i64>,
}

/// Defines relationships between `IngredientPrice` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each price row belongs to one ingredient
    #[sea_orm(
        belongs_to = "super::ingredient::Entity",
        from = "Column::IngredientId",
        to = "super::ingredient::Column::Id"
    )]
    Ingredient,
    /// Unit the row was entered in
    #[sea_orm(
        belongs_to = "super::unit::Entity",
        from = "Column::UnitId",
        to = "super::unit::Column::Id"
    )]
    Unit,
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredient.def()
    }
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
