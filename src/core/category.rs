//! Category business logic - Handles product category operations.
//!
//! Categories carry a name and a VAT rate. The cost engine only passes them
//! through; this module exists so products always reference a real category.

use crate::{
    entities::{Category, Product, category, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Retrieves all categories, ordered by id.
pub async fn get_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific category by its unique ID.
pub async fn get_category(db: &DatabaseConnection, category_id: i64) -> Result<category::Model> {
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })
}

/// Creates a new category.
pub async fn create_category(
    db: &DatabaseConnection,
    name: String,
    vat: i64,
) -> Result<category::Model> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Category name cannot be empty".to_string(),
        });
    }

    let category = category::ActiveModel {
        name: Set(name.trim().to_string()),
        vat: Set(vat),
        ..Default::default()
    };
    category.insert(db).await.map_err(Into::into)
}

/// Updates an existing category's name and VAT rate.
pub async fn update_category(
    db: &DatabaseConnection,
    category_id: i64,
    name: String,
    vat: i64,
) -> Result<category::Model> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Category name cannot be empty".to_string(),
        });
    }

    let mut category: category::ActiveModel = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?
        .into();

    category.name = Set(name.trim().to_string());
    category.vat = Set(vat);

    category.update(db).await.map_err(Into::into)
}

/// Deletes a category, refusing while any product still belongs to it.
pub async fn delete_category(db: &DatabaseConnection, category_id: i64) -> Result<()> {
    let category = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    let products = Product::find()
        .filter(product::Column::CategoryId.eq(category_id))
        .all(db)
        .await?;

    if !products.is_empty() {
        let names: Vec<String> = products.into_iter().map(|product| product.name).collect();
        return Err(Error::StillInUse {
            entity: "category",
            id: category_id,
            used_by: names.join(", "),
        });
    }

    category.delete(db).await?;
    Ok(())
}
