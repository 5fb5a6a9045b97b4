//! Ingredient usage business logic - the edges of the recipe graph.
//!
//! Every mutation here is one transaction: the cycle walk (for new edges),
//! the write itself, and the cost recomputation of the owning product either
//! all commit or all roll back. Quantities arrive in display units and are
//! normalized to base units before persistence.

use crate::{
    core::{cost, ingredient, unit},
    entities::{
        Ingredient, IngredientUsage, Product, ingredient_price, ingredient_usage,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Retrieves all usages of a product's recipe, ordered by id.
pub async fn get_usages_for_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Vec<ingredient_usage::Model>> {
    IngredientUsage::find()
        .filter(ingredient_usage::Column::ProductId.eq(product_id))
        .order_by_asc(ingredient_usage::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific usage by its unique ID.
pub async fn get_usage(
    db: &DatabaseConnection,
    usage_id: i64,
) -> Result<Option<ingredient_usage::Model>> {
    IngredientUsage::find_by_id(usage_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// A product's usages paired with each ingredient's current price.
///
/// This is the view the cost calculation and the cycle walks operate on:
/// one row per usage, in insertion order, with `None` when the ingredient
/// has no price history at all.
pub(crate) async fn usages_with_current_price<C>(
    db: &C,
    product_id: i64,
) -> Result<Vec<(ingredient_usage::Model, Option<ingredient_price::Model>)>>
where
    C: ConnectionTrait,
{
    let usages = IngredientUsage::find()
        .filter(ingredient_usage::Column::ProductId.eq(product_id))
        .order_by_asc(ingredient_usage::Column::Id)
        .all(db)
        .await?;

    let mut out = Vec::with_capacity(usages.len());
    for usage in usages {
        let price = ingredient::latest_price(db, usage.ingredient_id).await?;
        out.push((usage, price));
    }
    Ok(out)
}

/// Adds an ingredient to a product's recipe.
///
/// The preventive cycle walk runs first, inside the same transaction as the
/// insert: if the ingredient's price chain already resolves back to this
/// product the edge is rejected and nothing is written. On success the
/// owning product's cost is recomputed before the commit.
///
/// # Errors
/// Returns [`Error::CircularReference`] when the edge would close a cycle,
/// [`Error::InvalidAmount`] for non-positive quantities, and not-found
/// errors for dangling ids.
pub async fn put_ingredient_usage(
    db: &DatabaseConnection,
    ingredient_id: i64,
    product_id: i64,
    unit_id: i64,
    quantity: f64,
) -> Result<ingredient_usage::Model> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(Error::InvalidAmount { amount: quantity });
    }

    let txn = db.begin().await?;

    Ingredient::find_by_id(ingredient_id)
        .one(&txn)
        .await?
        .ok_or(Error::IngredientNotFound { id: ingredient_id })?;
    Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    if cost::check_circular_dependency(&txn, product_id, ingredient_id).await? {
        return Err(Error::CircularReference {
            product_id,
            ingredient_id,
        });
    }

    let unit_row = unit::get_unit(&txn, unit_id)
        .await?
        .ok_or(Error::UnitNotFound { id: unit_id })?;
    let base_quantity = unit::to_base_quantity(&unit_row, quantity);

    let usage = ingredient_usage::ActiveModel {
        quantity: Set(base_quantity),
        unit_id: Set(unit_id),
        ingredient_id: Set(ingredient_id),
        product_id: Set(product_id),
        ..Default::default()
    };
    let usage = usage.insert(&txn).await?;

    cost::recompute_product_cost(&txn, product_id).await?;

    txn.commit().await?;
    Ok(usage)
}

/// Changes the amount or unit of an existing recipe edge and recomputes the
/// owning product's cost, atomically.
pub async fn update_ingredient_usage(
    db: &DatabaseConnection,
    usage_id: i64,
    unit_id: i64,
    quantity: f64,
) -> Result<ingredient_usage::Model> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(Error::InvalidAmount { amount: quantity });
    }

    let txn = db.begin().await?;

    let usage = IngredientUsage::find_by_id(usage_id)
        .one(&txn)
        .await?
        .ok_or(Error::UsageNotFound { id: usage_id })?;

    let unit_row = unit::get_unit(&txn, unit_id)
        .await?
        .ok_or(Error::UnitNotFound { id: unit_id })?;
    let base_quantity = unit::to_base_quantity(&unit_row, quantity);

    let mut active: ingredient_usage::ActiveModel = usage.into();
    active.quantity = Set(base_quantity);
    active.unit_id = Set(unit_id);
    let usage = active.update(&txn).await?;

    cost::recompute_product_cost(&txn, usage.product_id).await?;

    txn.commit().await?;
    Ok(usage)
}

/// Removes a recipe edge and recomputes the owning product's cost,
/// atomically.
pub async fn delete_ingredient_usage(db: &DatabaseConnection, usage_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let usage = IngredientUsage::find_by_id(usage_id)
        .one(&txn)
        .await?
        .ok_or(Error::UsageNotFound { id: usage_id })?;

    let product_id = usage.product_id;
    usage.delete(&txn).await?;

    cost::recompute_product_cost(&txn, product_id).await?;

    txn.commit().await?;
    Ok(())
}
