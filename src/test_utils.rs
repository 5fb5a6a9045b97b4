//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{category, ingredient, product, unit},
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test unit with factor 1.0, i.e. a base unit.
pub async fn create_test_unit(db: &DatabaseConnection, name: &str) -> Result<entities::UnitModel> {
    unit::create_unit(db, name.to_string(), None, 1.0).await
}

/// Creates a test category with a default VAT rate.
pub async fn create_test_category(db: &DatabaseConnection) -> Result<entities::CategoryModel> {
    category::create_category(db, "Test Category".to_string(), 19).await
}

/// Creates a test product in a fresh category.
///
/// # Defaults
/// * price: 0.0 (unchanged until edited)
/// * multiplicator: 1.0
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::ProductModel> {
    let category = create_test_category(db).await?;
    product::create_product(db, name.to_string(), category.id).await
}

/// Creates an ingredient with a direct price per one unit of `unit_id`.
pub async fn create_priced_ingredient(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    unit_id: i64,
) -> Result<ingredient::IngredientWithPrices> {
    let row = ingredient::create_ingredient(db, name.to_string()).await?;
    ingredient::update_ingredient_with_price(
        db,
        ingredient::UpdateIngredientParams {
            id: row.id,
            name: name.to_string(),
            price: Some(price),
            quantity: 1.0,
            unit_id,
            base_product_id: None,
        },
    )
    .await
}

/// Creates an ingredient whose price derives from a base product.
pub async fn create_derived_ingredient(
    db: &DatabaseConnection,
    name: &str,
    base_product_id: i64,
    unit_id: i64,
) -> Result<ingredient::IngredientWithPrices> {
    let row = ingredient::create_ingredient(db, name.to_string()).await?;
    ingredient::update_ingredient_with_price(
        db,
        ingredient::UpdateIngredientParams {
            id: row.id,
            name: name.to_string(),
            price: None,
            quantity: 1.0,
            unit_id,
            base_product_id: Some(base_product_id),
        },
    )
    .await
}

/// Sets up a complete test environment with a base unit.
/// Returns (db, unit) for common test scenarios.
pub async fn setup_with_unit() -> Result<(DatabaseConnection, entities::UnitModel)> {
    let db = setup_test_db().await?;
    let unit = create_test_unit(&db, "unit").await?;
    Ok((db, unit))
}
