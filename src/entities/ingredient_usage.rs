//! `IngredientUsage` entity - The edge of the recipe dependency graph.
//!
//! "Product P uses ingredient I in amount Q." Quantities are stored in base
//! units; `unit_id` records the unit the amount was entered in for display.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ingredient usage database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredient_usage")]
pub struct Model {
    /// Unique identifier for the usage
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Amount consumed, in base units
    pub quantity: f64,
    /// Unit the amount was originally entered in
    pub unit_id: i64,
    /// Ingredient being consumed
    pub ingredient_id: i64,
    /// Product whose recipe consumes the ingredient
    pub product_id: i64,
}

/// Defines relationships between `IngredientUsage` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each usage belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Each usage consumes one ingredient
    #[sea_orm(
        belongs_to = "super::ingredient::Entity",
        from = "Column::IngredientId",
        to = "super::ingredient::Column::Id"
    )]
    Ingredient,
    /// Unit the amount was entered in
    #[sea_orm(
        belongs_to = "super::unit::Entity",
        from = "Column::UnitId",
        to = "super::unit::Column::Id"
    )]
    Unit,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
