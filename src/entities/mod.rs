//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod ingredient;
pub mod ingredient_price;
pub mod ingredient_usage;
pub mod product;
pub mod product_cost;
pub mod unit;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use ingredient::{Column as IngredientColumn, Entity as Ingredient, Model as IngredientModel};
pub use ingredient_price::{
    Column as IngredientPriceColumn, Entity as IngredientPrice, Model as IngredientPriceModel,
};
pub use ingredient_usage::{
    Column as IngredientUsageColumn, Entity as IngredientUsage, Model as IngredientUsageModel,
};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use product_cost::{
    Column as ProductCostColumn, Entity as ProductCost, Model as ProductCostModel,
};
pub use unit::{Column as UnitColumn, Entity as Unit, Model as UnitModel};
