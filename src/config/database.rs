//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! It provides functions for establishing database connections and creating all necessary tables
//! based on the entity definitions. The module uses `SeaORM`'s `Schema::create_table_from_entity`
//! method to automatically generate SQL statements from the entity models, ensuring that the
//! database schema matches the Rust struct definitions without requiring manual SQL.

use crate::entities::{
    Category, Ingredient, IngredientPrice, IngredientUsage, Product, ProductCost, Unit,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/costbook.sqlite".to_string())
}

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
/// This function handles connection errors and provides a clean interface for database access
/// throughout the application.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url())
        .await
        .map_err(Into::into)
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// Referenced tables are created before their referrers so the generated
/// foreign keys resolve: units and categories first, then ingredients and
/// products, then price rows, usage edges, and the cost cache.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let unit_table = schema.create_table_from_entity(Unit);
    let category_table = schema.create_table_from_entity(Category);
    let ingredient_table = schema.create_table_from_entity(Ingredient);
    let product_table = schema.create_table_from_entity(Product);
    let ingredient_price_table = schema.create_table_from_entity(IngredientPrice);
    let ingredient_usage_table = schema.create_table_from_entity(IngredientUsage);
    let product_cost_table = schema.create_table_from_entity(ProductCost);

    db.execute(builder.build(&unit_table)).await?;
    db.execute(builder.build(&category_table)).await?;
    db.execute(builder.build(&ingredient_table)).await?;
    db.execute(builder.build(&product_table)).await?;
    db.execute(builder.build(&ingredient_price_table)).await?;
    db.execute(builder.build(&ingredient_usage_table)).await?;
    db.execute(builder.build(&product_cost_table)).await?;

    Ok(())
}
