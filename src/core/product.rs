//! Product business logic - product management and cost-cache reads.
//!
//! Read paths serve costs straight from the materialized cache and only fall
//! back to the calculator when a row is missing. Deletion refuses while some
//! ingredient's current price still derives from the product.

use crate::{
    core::{cost, ingredient},
    entities::{
        Ingredient, IngredientPrice, IngredientUsage, Product, ProductCost, category,
        ingredient_price, ingredient_usage, product,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// A product together with its computed total cost.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductWithCost {
    /// The product itself
    pub product: product::Model,
    /// Total cost resolved through the ingredient graph
    pub cost: f64,
}

/// Retrieves a specific product by its unique ID.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product in a category.
///
/// The externally charged price starts at zero and the margin factor at one
/// until the product is edited.
pub async fn create_product(
    db: &DatabaseConnection,
    name: String,
    category_id: i64,
) -> Result<product::Model> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Product name cannot be empty".to_string(),
        });
    }

    category::Entity::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    let product = product::ActiveModel {
        name: Set(name.trim().to_string()),
        price: Set(0.0),
        multiplicator: Set(1.0),
        category_id: Set(category_id),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Updates a product's name, category, charged price and margin factor.
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    name: String,
    category_id: i64,
    price: f64,
    multiplicator: f64,
) -> Result<product::Model> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Product name cannot be empty".to_string(),
        });
    }

    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidAmount { amount: price });
    }

    if !multiplicator.is_finite() || multiplicator < 0.0 {
        return Err(Error::InvalidAmount {
            amount: multiplicator,
        });
    }

    category::Entity::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    product.name = Set(name.trim().to_string());
    product.category_id = Set(category_id);
    product.price = Set(price);
    product.multiplicator = Set(multiplicator);

    product.update(db).await.map_err(Into::into)
}

/// Deletes a product together with its recipe edges and cache row.
///
/// Refuses while any ingredient's current price derives from this product;
/// deleting it would leave those ingredients unpriceable.
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    let dependents = ingredients_derived_from_product(&txn, product_id).await?;
    if !dependents.is_empty() {
        return Err(Error::StillInUse {
            entity: "product",
            id: product_id,
            used_by: dependents.join(", "),
        });
    }

    IngredientUsage::delete_many()
        .filter(ingredient_usage::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    if let Some(cache_row) = ProductCost::find_by_id(product_id).one(&txn).await? {
        cache_row.delete(&txn).await?;
    }
    product.delete(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Retrieves one product with its cost, filling the cache on a miss.
pub async fn get_product_with_cost(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<ProductWithCost> {
    let product = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    let cost = cost::cached_or_recomputed_cost(db, product_id).await?;
    Ok(ProductWithCost { product, cost })
}

/// Retrieves all products with their costs, ordered by id.
///
/// Costs come from the cache in one joined query; the calculator only runs
/// for products whose cache row is missing.
pub async fn get_products_with_cost(db: &DatabaseConnection) -> Result<Vec<ProductWithCost>> {
    let rows = Product::find()
        .find_also_related(ProductCost)
        .order_by_asc(product::Column::Id)
        .all(db)
        .await?;

    let mut out = Vec::with_capacity(rows.len());
    for (product, cache_row) in rows {
        let cost = match cache_row {
            Some(row) => row.cost,
            None => cost::cached_or_recomputed_cost(db, product.id).await?,
        };
        out.push(ProductWithCost { product, cost });
    }
    Ok(out)
}

/// Every product whose recipe has at least one usage of the ingredient.
///
/// This is the fan-out set for price-change cascades and the deletion guard
/// for ingredients.
pub async fn get_products_using_ingredient<C>(
    db: &C,
    ingredient_id: i64,
) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    let usages = IngredientUsage::find()
        .filter(ingredient_usage::Column::IngredientId.eq(ingredient_id))
        .all(db)
        .await?;

    let mut ids: Vec<i64> = usages.iter().map(|usage| usage.product_id).collect();
    ids.sort_unstable();
    ids.dedup();

    Product::find()
        .filter(product::Column::Id.is_in(ids))
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Names of ingredients whose *current* price derives from the product.
///
/// Historic rows referencing the product do not count; only the newest row
/// per ingredient decides.
async fn ingredients_derived_from_product<C>(db: &C, product_id: i64) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    let referencing = IngredientPrice::find()
        .filter(ingredient_price::Column::BaseProductId.eq(product_id))
        .all(db)
        .await?;

    let mut names = Vec::new();
    for row in referencing {
        let Some(current) = ingredient::latest_price(db, row.ingredient_id).await? else {
            continue;
        };
        if current.id != row.id {
            continue;
        }
        if let Some(ingredient_row) = Ingredient::find_by_id(row.ingredient_id).one(db).await? {
            names.push(ingredient_row.name);
        }
    }
    names.sort();
    names.dedup();
    Ok(names)
}
