//! Ingredient entity - A purchasable or derived input with a price history.
//!
//! Ingredients own an append-only history of `ingredient_price` rows; the
//! newest row is the current price. Products consume ingredients through
//! `ingredient_usage` edges.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ingredient database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    /// Unique identifier for the ingredient
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the ingredient
    pub name: String,
}

/// Defines relationships between Ingredient and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Price history rows owned by this ingredient
    #[sea_orm(has_many = "super::ingredient_price::Entity")]
    IngredientPrice,
    /// Recipe edges consuming this ingredient
    #[sea_orm(has_many = "super::ingredient_usage::Entity")]
    IngredientUsage,
}

impl Related<super::ingredient_price::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientPrice.def()
    }
}

impl Related<super::ingredient_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientUsage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
