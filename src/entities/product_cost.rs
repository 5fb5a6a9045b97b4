//! `ProductCost` entity - The materialized per-product cost cache.
//!
//! One row per product, created lazily on first computation and overwritten
//! on every recomputation. Rows are derived state owned by the cost engine:
//! they are never an input to recomputation and carry no TTL; correctness
//! depends entirely on mutation-triggered invalidation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product cost cache database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_costs")]
pub struct Model {
    /// Product this cached cost belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i64,
    /// Total cost of one unit of the product
    pub cost: f64,
}

/// Defines relationships between `ProductCost` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each cache row belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
