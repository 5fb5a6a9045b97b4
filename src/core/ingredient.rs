//! Ingredient business logic - price history and the diff-gated upsert.
//!
//! An ingredient's price is the newest row of its append-only history. The
//! central operation here is [`update_ingredient_with_price`]: one
//! transaction that renames the ingredient if needed, normalizes the desired
//! price into base units, inserts a new price row only when something
//! materially changed, and recomputes every product consuming the
//! ingredient. Derived prices (base-product references) pass the cycle walk
//! before they are applied.

use crate::{
    core::{cost, product, unit},
    entities::{Ingredient, IngredientPrice, Product, ingredient, ingredient_price},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use tracing::debug;

/// An ingredient together with its most recent price rows.
///
/// Derived rows returned from the read operations have their `price` field
/// filled with the base product's cached cost, so callers can display an
/// effective price without resolving the reference themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct IngredientWithPrices {
    /// The ingredient itself
    pub ingredient: ingredient::Model,
    /// Most recent price rows, newest first
    pub prices: Vec<ingredient_price::Model>,
}

/// Parameters for [`update_ingredient_with_price`].
///
/// `price` and `quantity` are in the caller's display unit; normalization
/// into base units happens inside the operation. Exactly one of `price` and
/// `base_product_id` must be set.
#[derive(Clone, Debug)]
pub struct UpdateIngredientParams {
    /// Ingredient to update
    pub id: i64,
    /// Desired name
    pub name: String,
    /// Desired direct price for `quantity` of the ingredient
    pub price: Option<f64>,
    /// Quantity the price applies to, in the unit `unit_id`
    pub quantity: f64,
    /// Unit the quantity is expressed in
    pub unit_id: i64,
    /// Product whose cost should serve as the price instead
    pub base_product_id: Option<i64>,
}

/// Creates a new ingredient with no price history.
pub async fn create_ingredient(db: &DatabaseConnection, name: String) -> Result<ingredient::Model> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Ingredient name cannot be empty".to_string(),
        });
    }

    let ingredient = ingredient::ActiveModel {
        name: Set(name.trim().to_string()),
        ..Default::default()
    };
    ingredient.insert(db).await.map_err(Into::into)
}

/// The ingredient's current price: the newest row of its history.
///
/// Modeled as a query rather than a denormalized pointer so the history and
/// the current price cannot diverge. Row id breaks timestamp ties.
pub async fn latest_price<C>(
    db: &C,
    ingredient_id: i64,
) -> Result<Option<ingredient_price::Model>>
where
    C: ConnectionTrait,
{
    IngredientPrice::find()
        .filter(ingredient_price::Column::IngredientId.eq(ingredient_id))
        .order_by_desc(ingredient_price::Column::TimeStamp)
        .order_by_desc(ingredient_price::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// The ingredient's most recent `limit` price rows, newest first.
pub async fn price_history<C>(
    db: &C,
    ingredient_id: i64,
    limit: u64,
) -> Result<Vec<ingredient_price::Model>>
where
    C: ConnectionTrait,
{
    IngredientPrice::find()
        .filter(ingredient_price::Column::IngredientId.eq(ingredient_id))
        .order_by_desc(ingredient_price::Column::TimeStamp)
        .order_by_desc(ingredient_price::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all ingredients with their most recent `price_limit` price
/// rows, derived rows resolved to an effective price.
pub async fn get_ingredients_with_prices(
    db: &DatabaseConnection,
    price_limit: u64,
) -> Result<Vec<IngredientWithPrices>> {
    let ingredients = Ingredient::find()
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await?;

    let mut out = Vec::with_capacity(ingredients.len());
    for ingredient in ingredients {
        let prices = price_history(db, ingredient.id, price_limit).await?;
        out.push(IngredientWithPrices { ingredient, prices });
    }

    resolve_base_product_prices(db, &mut out).await?;
    Ok(out)
}

/// Retrieves one ingredient with its most recent `price_limit` price rows.
pub async fn get_ingredient_with_prices(
    db: &DatabaseConnection,
    ingredient_id: i64,
    price_limit: u64,
) -> Result<IngredientWithPrices> {
    let ingredient = Ingredient::find_by_id(ingredient_id)
        .one(db)
        .await?
        .ok_or(Error::IngredientNotFound { id: ingredient_id })?;

    let prices = price_history(db, ingredient_id, price_limit).await?;
    let mut out = vec![IngredientWithPrices { ingredient, prices }];
    resolve_base_product_prices(db, &mut out).await?;
    Ok(out.remove(0))
}

/// Fills the `price` field of derived price rows with the referenced
/// product's cached cost, computing the cost on a cache miss.
///
/// Historic rows may reference a product that has since been deleted; those
/// stay unresolved instead of failing the read.
async fn resolve_base_product_prices(
    db: &DatabaseConnection,
    ingredients: &mut [IngredientWithPrices],
) -> Result<()> {
    for entry in ingredients.iter_mut() {
        for price in entry.prices.iter_mut() {
            let Some(base_product_id) = price.base_product_id else {
                continue;
            };
            if Product::find_by_id(base_product_id).one(db).await?.is_none() {
                continue;
            }
            let product_cost = cost::cached_or_recomputed_cost(db, base_product_id).await?;
            price.price = Some(product_cost);
        }
    }
    Ok(())
}

/// Updates an ingredient's name and price inside one transaction, inserting
/// a new price row only when the normalized state actually changed.
///
/// The desired price is normalized before comparison:
/// `base_unit_quantity = quantity / factor`, and for direct prices
/// `base_unit_price = price / base_unit_quantity`. A new row is inserted
/// only if there is no current price, or the normalized price, base
/// product, normalized quantity or unit differs. Resubmitting an unchanged
/// form is a no-op and the history does not grow.
///
/// A newly introduced base-product reference must pass the cycle walk, and
/// any inserted row triggers a cost recomputation of every product using
/// this ingredient. All of it commits or rolls back together.
///
/// # Errors
/// Returns an error if both or neither of `price`/`base_product_id` are
/// set, quantities or prices are not finite and positive, the ingredient,
/// unit or base product does not resolve, or the reference would create a
/// circular dependency.
pub async fn update_ingredient_with_price(
    db: &DatabaseConnection,
    params: UpdateIngredientParams,
) -> Result<IngredientWithPrices> {
    // Exactly one price source, validated before any computation
    match (params.price, params.base_product_id) {
        (Some(_), None) | (None, Some(_)) => {}
        _ => return Err(Error::AmbiguousPriceSource),
    }

    if !params.quantity.is_finite() || params.quantity <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: params.quantity,
        });
    }

    if let Some(price) = params.price {
        if !price.is_finite() || price < 0.0 {
            return Err(Error::InvalidAmount { amount: price });
        }
    }

    let txn = db.begin().await?;

    let mut ingredient = Ingredient::find_by_id(params.id)
        .one(&txn)
        .await?
        .ok_or(Error::IngredientNotFound { id: params.id })?;

    let current = latest_price(&txn, params.id).await?;

    if ingredient.name != params.name {
        let mut active: ingredient::ActiveModel = ingredient.into();
        active.name = Set(params.name.clone());
        ingredient = active.update(&txn).await?;
    }

    let unit_row = unit::get_unit(&txn, params.unit_id)
        .await?
        .ok_or(Error::UnitNotFound { id: params.unit_id })?;

    let base_unit_quantity = unit::to_base_quantity(&unit_row, params.quantity);
    let base_unit_price = params.price.map(|price| price / base_unit_quantity);

    let changed = match &current {
        None => true,
        Some(row) => {
            row.price != base_unit_price
                || row.base_product_id != params.base_product_id
                || row.quantity != base_unit_quantity
                || row.unit_id != params.unit_id
        }
    };

    if changed {
        if let Some(base_product_id) = params.base_product_id {
            let already_referenced =
                current.as_ref().and_then(|row| row.base_product_id) == Some(base_product_id);
            if !already_referenced {
                Product::find_by_id(base_product_id)
                    .one(&txn)
                    .await?
                    .ok_or(Error::ProductNotFound {
                        id: base_product_id,
                    })?;
                if cost::product_consumes_ingredient(&txn, base_product_id, params.id).await? {
                    return Err(Error::CircularReference {
                        product_id: base_product_id,
                        ingredient_id: params.id,
                    });
                }
            }
        }

        debug!(
            ingredient_id = params.id,
            price = ?base_unit_price,
            base_product_id = ?params.base_product_id,
            "inserting new ingredient price"
        );

        let row = ingredient_price::ActiveModel {
            ingredient_id: Set(params.id),
            time_stamp: Set(chrono::Utc::now()),
            price: Set(base_unit_price),
            quantity: Set(base_unit_quantity),
            unit_id: Set(params.unit_id),
            base_product_id: Set(params.base_product_id),
            ..Default::default()
        };
        row.insert(&txn).await?;

        // One hop: every product using this ingredient. Transitive fan-out
        // happens inside the recompute cascade itself.
        let affected = product::get_products_using_ingredient(&txn, params.id).await?;
        for affected_product in affected {
            cost::recompute_product_cost(&txn, affected_product.id).await?;
        }
    }

    let prices = price_history(&txn, params.id, 1).await?;
    txn.commit().await?;

    let mut out = vec![IngredientWithPrices { ingredient, prices }];
    resolve_base_product_prices(db, &mut out).await?;
    Ok(out.remove(0))
}

/// Deletes an ingredient and its price history, refusing while any product
/// still uses it.
pub async fn delete_ingredient(db: &DatabaseConnection, ingredient_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let ingredient = Ingredient::find_by_id(ingredient_id)
        .one(&txn)
        .await?
        .ok_or(Error::IngredientNotFound { id: ingredient_id })?;

    let users = product::get_products_using_ingredient(&txn, ingredient_id).await?;
    if !users.is_empty() {
        let names: Vec<String> = users.into_iter().map(|product| product.name).collect();
        return Err(Error::StillInUse {
            entity: "ingredient",
            id: ingredient_id,
            used_by: names.join(", "),
        });
    }

    IngredientPrice::delete_many()
        .filter(ingredient_price::Column::IngredientId.eq(ingredient_id))
        .exec(&txn)
        .await?;
    ingredient.delete(&txn).await?;

    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::usage;
    use crate::entities::ProductCost;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_update_ingredient_with_price_validation() -> Result<()> {
        // No scripted results: reaching the store would fail the test, so
        // these errors prove validation runs before the first query.
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        // Neither price nor base product
        let result = update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: 1,
                name: "Flour".to_string(),
                price: None,
                quantity: 1.0,
                unit_id: 1,
                base_product_id: None,
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::AmbiguousPriceSource));

        // Both price and base product
        let result = update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: 1,
                name: "Flour".to_string(),
                price: Some(1.0),
                quantity: 1.0,
                unit_id: 1,
                base_product_id: Some(1),
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::AmbiguousPriceSource));

        // Zero quantity would divide the price by zero
        let result = update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: 1,
                name: "Flour".to_string(),
                price: Some(1.0),
                quantity: 0.0,
                unit_id: 1,
                base_product_id: None,
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: 0.0 }
        ));

        // NaN quantity
        let result = update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: 1,
                name: "Flour".to_string(),
                price: Some(1.0),
                quantity: f64::NAN,
                unit_id: 1,
                base_product_id: None,
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        // Negative price
        let result = update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: 1,
                name: "Flour".to_string(),
                price: Some(-0.5),
                quantity: 1.0,
                unit_id: 1,
                base_product_id: None,
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -0.5 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_unknown_references() -> Result<()> {
        let (db, unit) = setup_with_unit().await?;
        let ingredient = create_ingredient(&db, "Flour".to_string()).await?;

        // Unknown unit
        let result = update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: ingredient.id,
                name: "Flour".to_string(),
                price: Some(1.0),
                quantity: 1.0,
                unit_id: 999,
                base_product_id: None,
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::UnitNotFound { id: 999 }));

        // Unknown ingredient
        let result = update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: 999,
                name: "Ghost".to_string(),
                price: Some(1.0),
                quantity: 1.0,
                unit_id: unit.id,
                base_product_id: None,
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::IngredientNotFound { id: 999 }
        ));

        // Unknown base product
        let result = update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: ingredient.id,
                name: "Flour".to_string(),
                price: None,
                quantity: 1.0,
                unit_id: unit.id,
                base_product_id: Some(999),
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ProductNotFound { id: 999 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_diff_gate_idempotent() -> Result<()> {
        let (db, unit) = setup_with_unit().await?;
        let ingredient = create_ingredient(&db, "Flour".to_string()).await?;

        let params = UpdateIngredientParams {
            id: ingredient.id,
            name: "Flour".to_string(),
            price: Some(1.5),
            quantity: 1.0,
            unit_id: unit.id,
            base_product_id: None,
        };

        update_ingredient_with_price(&db, params.clone()).await?;
        update_ingredient_with_price(&db, params).await?;

        // Identical resubmission must not grow the history
        let history = price_history(&db, ingredient.id, 10).await?;
        assert_eq!(history.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_price_change_appends_row() -> Result<()> {
        let (db, unit) = setup_with_unit().await?;
        let ingredient = create_ingredient(&db, "Flour".to_string()).await?;

        let mut params = UpdateIngredientParams {
            id: ingredient.id,
            name: "Flour".to_string(),
            price: Some(1.5),
            quantity: 1.0,
            unit_id: unit.id,
            base_product_id: None,
        };
        update_ingredient_with_price(&db, params.clone()).await?;

        params.price = Some(1.8);
        update_ingredient_with_price(&db, params).await?;

        let history = price_history(&db, ingredient.id, 10).await?;
        assert_eq!(history.len(), 2);

        // Newest first
        assert_eq!(history[0].price, Some(1.8));
        assert_eq!(history[1].price, Some(1.5));

        let current = latest_price(&db, ingredient.id).await?.unwrap();
        assert_eq!(current.price, Some(1.8));

        Ok(())
    }

    #[tokio::test]
    async fn test_price_normalization() -> Result<()> {
        let db = setup_test_db().await?;
        let gram = crate::core::unit::create_unit(&db, "g".to_string(), None, 1.0).await?;
        let kilo =
            crate::core::unit::create_unit(&db, "kg".to_string(), Some(gram.id), 0.001).await?;

        let ingredient = create_ingredient(&db, "Sugar".to_string()).await?;

        // 3.00 for 2 kg is 2000 g, so 0.0015 per gram
        update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: ingredient.id,
                name: "Sugar".to_string(),
                price: Some(3.0),
                quantity: 2.0,
                unit_id: kilo.id,
                base_product_id: None,
            },
        )
        .await?;

        let current = latest_price(&db, ingredient.id).await?.unwrap();
        assert_eq!(current.quantity, 2000.0);
        assert_eq!(current.price, Some(3.0 / 2000.0));
        assert_eq!(current.unit_id, kilo.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_diff_gate_same_normalized_price_different_unit() -> Result<()> {
        let db = setup_test_db().await?;
        let gram = crate::core::unit::create_unit(&db, "g".to_string(), None, 1.0).await?;
        let kilo =
            crate::core::unit::create_unit(&db, "kg".to_string(), Some(gram.id), 0.001).await?;

        let ingredient = create_ingredient(&db, "Sugar".to_string()).await?;

        update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: ingredient.id,
                name: "Sugar".to_string(),
                price: Some(2.0),
                quantity: 1000.0,
                unit_id: gram.id,
                base_product_id: None,
            },
        )
        .await?;

        // Same normalized price and quantity, but entered in a different
        // unit: the unit column differs, so a row is appended.
        update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: ingredient.id,
                name: "Sugar".to_string(),
                price: Some(2.0),
                quantity: 1.0,
                unit_id: kilo.id,
                base_product_id: None,
            },
        )
        .await?;

        let history = price_history(&db, ingredient.id, 10).await?;
        assert_eq!(history.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_name_update_without_price_change() -> Result<()> {
        let (db, unit) = setup_with_unit().await?;
        let ingredient = create_ingredient(&db, "Flour".to_string()).await?;

        let mut params = UpdateIngredientParams {
            id: ingredient.id,
            name: "Flour".to_string(),
            price: Some(1.5),
            quantity: 1.0,
            unit_id: unit.id,
            base_product_id: None,
        };
        update_ingredient_with_price(&db, params.clone()).await?;

        params.name = "Whole Wheat Flour".to_string();
        let updated = update_ingredient_with_price(&db, params).await?;

        assert_eq!(updated.ingredient.name, "Whole Wheat Flour");
        // Renaming alone adds no price row
        let history = price_history(&db, ingredient.id, 10).await?;
        assert_eq!(history.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_price_change_cascades_to_users() -> Result<()> {
        let (db, unit) = setup_with_unit().await?;

        let flour = create_priced_ingredient(&db, "Flour", 1.5, unit.id).await?;
        let bread = create_test_product(&db, "Bread").await?;
        usage::put_ingredient_usage(&db, flour.ingredient.id, bread.id, unit.id, 2.0).await?;

        let cached = ProductCost::find_by_id(bread.id).one(&db).await?.unwrap();
        assert_eq!(cached.cost, 3.0);

        update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: flour.ingredient.id,
                name: "Flour".to_string(),
                price: Some(2.0),
                quantity: 1.0,
                unit_id: unit.id,
                base_product_id: None,
            },
        )
        .await?;

        let cached = ProductCost::find_by_id(bread.id).one(&db).await?.unwrap();
        assert_eq!(cached.cost, 4.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_derived_price_rejected_on_cycle() -> Result<()> {
        let (db, unit) = setup_with_unit().await?;

        let flour = create_priced_ingredient(&db, "Flour", 1.5, unit.id).await?;
        let bread = create_test_product(&db, "Bread").await?;
        usage::put_ingredient_usage(&db, flour.ingredient.id, bread.id, unit.id, 2.0).await?;

        // Pointing flour's price at bread would make bread depend on itself
        let result = update_ingredient_with_price(
            &db,
            UpdateIngredientParams {
                id: flour.ingredient.id,
                name: "Flour".to_string(),
                price: None,
                quantity: 1.0,
                unit_id: unit.id,
                base_product_id: Some(bread.id),
            },
        )
        .await;

        match result.unwrap_err() {
            Error::CircularReference {
                product_id,
                ingredient_id,
            } => {
                assert_eq!(product_id, bread.id);
                assert_eq!(ingredient_id, flour.ingredient.id);
            }
            other => panic!("unexpected error: {other}"),
        }

        // The rejected transaction left no new price row behind
        let history = price_history(&db, flour.ingredient.id, 10).await?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].price, Some(1.5));

        Ok(())
    }

    #[tokio::test]
    async fn test_derived_price_resolved_on_read() -> Result<()> {
        let (db, unit) = setup_with_unit().await?;

        let flour = create_priced_ingredient(&db, "Flour", 1.5, unit.id).await?;
        let bread = create_test_product(&db, "Bread").await?;
        usage::put_ingredient_usage(&db, flour.ingredient.id, bread.id, unit.id, 2.0).await?;

        let bread_as_ingredient =
            create_derived_ingredient(&db, "Bread-as-ingredient", bread.id, unit.id).await?;

        let fetched = get_ingredient_with_prices(&db, bread_as_ingredient.ingredient.id, 1).await?;
        assert_eq!(fetched.prices.len(), 1);
        assert_eq!(fetched.prices[0].base_product_id, Some(bread.id));
        // Effective price filled in from the bread cost cache
        assert_eq!(fetched.prices[0].price, Some(3.0));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_ingredient_guard() -> Result<()> {
        let (db, unit) = setup_with_unit().await?;

        let flour = create_priced_ingredient(&db, "Flour", 1.5, unit.id).await?;
        let bread = create_test_product(&db, "Bread").await?;
        usage::put_ingredient_usage(&db, flour.ingredient.id, bread.id, unit.id, 2.0).await?;

        let result = delete_ingredient(&db, flour.ingredient.id).await;
        match result.unwrap_err() {
            Error::StillInUse {
                entity, used_by, ..
            } => {
                assert_eq!(entity, "ingredient");
                assert!(used_by.contains("Bread"));
            }
            other => panic!("unexpected error: {other}"),
        }

        // Unused ingredients delete together with their history
        let spare = create_priced_ingredient(&db, "Spare", 1.0, unit.id).await?;
        delete_ingredient(&db, spare.ingredient.id).await?;
        assert!(
            Ingredient::find_by_id(spare.ingredient.id)
                .one(&db)
                .await?
                .is_none()
        );
        let history = price_history(&db, spare.ingredient.id, 10).await?;
        assert!(history.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_get_ingredients_with_prices() -> Result<()> {
        let (db, unit) = setup_with_unit().await?;

        create_priced_ingredient(&db, "Flour", 1.5, unit.id).await?;
        create_ingredient(&db, "Salt".to_string()).await?;

        let all = get_ingredients_with_prices(&db, 1).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].ingredient.name, "Flour");
        assert_eq!(all[0].prices.len(), 1);
        assert_eq!(all[1].ingredient.name, "Salt");
        assert!(all[1].prices.is_empty());

        Ok(())
    }
}
