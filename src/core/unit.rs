//! Unit business logic - Handles the unit conversion table.
//!
//! Units are a pure lookup table during cost resolution: every quantity is
//! normalized to base units on the way into the database, so the engine never
//! converts during a walk. This module provides unit CRUD, the conversion
//! helper, and idempotent seeding from configuration.

use crate::{
    config::units::UnitConfig,
    entities::{Ingredient, IngredientPrice, IngredientUsage, Product, Unit, unit},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashMap;
use tracing::info;

/// Converts a quantity expressed in `unit` into base units.
///
/// The stored factor is a divisor: a unit with factor 0.001 over base unit
/// "g" turns 2 (kg) into 2000 (g).
pub fn to_base_quantity(unit: &unit::Model, quantity: f64) -> f64 {
    quantity / unit.factor
}

/// Retrieves all units, ordered by id.
pub async fn get_all_units(db: &DatabaseConnection) -> Result<Vec<unit::Model>> {
    Unit::find()
        .order_by_asc(unit::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific unit by its unique ID.
pub async fn get_unit<C>(db: &C, unit_id: i64) -> Result<Option<unit::Model>>
where
    C: ConnectionTrait,
{
    Unit::find_by_id(unit_id).one(db).await.map_err(Into::into)
}

/// Retrieves all units keyed by id, for callers that resolve many units.
pub async fn get_units_map(db: &DatabaseConnection) -> Result<HashMap<i64, unit::Model>> {
    let units = get_all_units(db).await?;
    Ok(units.into_iter().map(|unit| (unit.id, unit)).collect())
}

/// Creates a new unit, validating the factor and the base unit reference.
///
/// # Errors
/// Returns an error if the factor is zero, negative or not finite, or if
/// `base_unit_id` does not resolve to an existing unit.
pub async fn create_unit(
    db: &DatabaseConnection,
    name: String,
    base_unit_id: Option<i64>,
    factor: f64,
) -> Result<unit::Model> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Unit name cannot be empty".to_string(),
        });
    }

    if !factor.is_finite() || factor <= 0.0 {
        return Err(Error::InvalidAmount { amount: factor });
    }

    if let Some(base_id) = base_unit_id {
        Unit::find_by_id(base_id)
            .one(db)
            .await?
            .ok_or(Error::UnitNotFound { id: base_id })?;
    }

    let unit = unit::ActiveModel {
        name: Set(name.trim().to_string()),
        base_unit_id: Set(base_unit_id),
        factor: Set(factor),
        ..Default::default()
    };
    unit.insert(db).await.map_err(Into::into)
}

/// Updates an existing unit's name, base unit and factor.
///
/// # Errors
/// Returns an error if the unit does not exist, the factor is invalid, or
/// the base unit reference does not resolve.
pub async fn update_unit(
    db: &DatabaseConnection,
    unit_id: i64,
    name: String,
    base_unit_id: Option<i64>,
    factor: f64,
) -> Result<unit::Model> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Unit name cannot be empty".to_string(),
        });
    }

    if !factor.is_finite() || factor <= 0.0 {
        return Err(Error::InvalidAmount { amount: factor });
    }

    if let Some(base_id) = base_unit_id {
        Unit::find_by_id(base_id)
            .one(db)
            .await?
            .ok_or(Error::UnitNotFound { id: base_id })?;
    }

    let mut unit: unit::ActiveModel = Unit::find_by_id(unit_id)
        .one(db)
        .await?
        .ok_or(Error::UnitNotFound { id: unit_id })?
        .into();

    unit.name = Set(name.trim().to_string());
    unit.base_unit_id = Set(base_unit_id);
    unit.factor = Set(factor);

    unit.update(db).await.map_err(Into::into)
}

/// Deletes a unit, refusing while any derived unit, price row or usage
/// still references it.
///
/// # Errors
/// Returns [`Error::StillInUse`] naming the referencing units, ingredients
/// and products, or [`Error::UnitNotFound`] if the unit does not exist.
pub async fn delete_unit(db: &DatabaseConnection, unit_id: i64) -> Result<()> {
    let unit = Unit::find_by_id(unit_id)
        .one(db)
        .await?
        .ok_or(Error::UnitNotFound { id: unit_id })?;

    let mut used_by = derived_unit_names(db, unit_id).await?;
    used_by.extend(ingredient_names_using_unit(db, unit_id).await?);
    used_by.extend(product_names_using_unit(db, unit_id).await?);

    if !used_by.is_empty() {
        return Err(Error::StillInUse {
            entity: "unit",
            id: unit_id,
            used_by: used_by.join(", "),
        });
    }

    unit.delete(db).await?;
    Ok(())
}

/// Names of units that convert into this unit.
pub async fn derived_unit_names(db: &DatabaseConnection, unit_id: i64) -> Result<Vec<String>> {
    let units = Unit::find()
        .filter(unit::Column::BaseUnitId.eq(unit_id))
        .all(db)
        .await?;
    Ok(units.into_iter().map(|unit| unit.name).collect())
}

/// Names of ingredients whose price history references the unit.
pub async fn ingredient_names_using_unit(
    db: &DatabaseConnection,
    unit_id: i64,
) -> Result<Vec<String>> {
    use crate::entities::ingredient_price;

    let prices = IngredientPrice::find()
        .filter(ingredient_price::Column::UnitId.eq(unit_id))
        .all(db)
        .await?;

    let mut ids: Vec<i64> = prices.iter().map(|price| price.ingredient_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let ingredients = Ingredient::find()
        .filter(crate::entities::ingredient::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(ingredients
        .into_iter()
        .map(|ingredient| ingredient.name)
        .collect())
}

/// Names of products with a recipe edge entered in the unit.
pub async fn product_names_using_unit(
    db: &DatabaseConnection,
    unit_id: i64,
) -> Result<Vec<String>> {
    use crate::entities::ingredient_usage;

    let usages = IngredientUsage::find()
        .filter(ingredient_usage::Column::UnitId.eq(unit_id))
        .all(db)
        .await?;

    let mut ids: Vec<i64> = usages.iter().map(|usage| usage.product_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let products = Product::find()
        .filter(crate::entities::product::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(products.into_iter().map(|product| product.name).collect())
}

/// Seeds the unit table from configuration, idempotently by name.
///
/// Units already present are left untouched. A `base_unit` reference is
/// resolved by name against units already in the database, so base units
/// must appear before their derived units in the configuration.
pub async fn seed_units(db: &DatabaseConnection, configs: &[UnitConfig]) -> Result<()> {
    for config in configs {
        let existing = Unit::find()
            .filter(unit::Column::Name.eq(config.name.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        let base_unit_id = match &config.base_unit {
            Some(base_name) => {
                let base = Unit::find()
                    .filter(unit::Column::Name.eq(base_name.as_str()))
                    .one(db)
                    .await?
                    .ok_or_else(|| Error::Config {
                        message: format!(
                            "unit '{}' references unknown base unit '{base_name}'",
                            config.name
                        ),
                    })?;
                Some(base.id)
            }
            None => None,
        };

        create_unit(db, config.name.clone(), base_unit_id, config.factor).await?;
        info!(name = %config.name, factor = config.factor, "seeded unit");
    }
    Ok(())
}
