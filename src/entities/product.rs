//! Product entity - A sellable item assembled from ingredient usages.
//!
//! `price` is the externally charged price and `multiplicator` derives a
//! suggested price from the computed cost; neither feeds back into cost
//! resolution. A product can also serve as the base product of an
//! ingredient's price, nesting one recipe inside another.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the product
    pub name: String,
    /// Externally charged price
    pub price: f64,
    /// Margin factor: suggested price = cost × multiplicator
    pub multiplicator: f64,
    /// Category the product belongs to
    pub category_id: i64,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// Recipe edges owned by this product
    #[sea_orm(has_many = "super::ingredient_usage::Entity")]
    IngredientUsage,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::ingredient_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientUsage.def()
    }
}

impl Related<super::product_cost::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_cost::Relation::Product.def().rev()
    }
}

impl ActiveModelBehavior for ActiveModel {}
