//! Cost resolution engine - cycle walks, recursive costing, cache cascade.
//!
//! Three cooperating pieces live here. The dependency walks
//! ([`check_circular_dependency`], [`product_consumes_ingredient`]) reject
//! mutations that would make a product depend on itself. The recursive cost
//! calculation resolves a product's total cost through its ingredient graph,
//! guarding against cycles with a visited set as the last line of defense.
//! The cache cascade ([`recompute_product_cost`]) persists the computed cost
//! for the requested product and for every base product the walk touched, so
//! the materialized `product_costs` table stays consistent with the graph.
//!
//! Mutation paths call the `ConnectionTrait`-generic functions with their own
//! transaction; nothing here commits or rolls back on its own.

use crate::{
    core::{ingredient, usage},
    entities::{ProductCost, product_cost},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Reports whether adding ingredient `candidate_ingredient_id` to product
/// `target_product_id` would make the product depend on itself.
///
/// The walk starts at the candidate's current price: no price row or a
/// direct price means nothing to traverse. A base-product reference is
/// followed into that product's own ingredient usages and onward through
/// their base-product references. A visited set of product ids keeps the
/// walk finite even if the stored graph already contains a cycle.
///
/// Run this on the same connection as the write it protects so the check
/// sees a consistent snapshot.
pub async fn check_circular_dependency<C>(
    db: &C,
    target_product_id: i64,
    candidate_ingredient_id: i64,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let Some(price) = ingredient::latest_price(db, candidate_ingredient_id).await? else {
        return Ok(false);
    };
    let Some(first_base) = price.base_product_id else {
        return Ok(false);
    };
    if first_base == target_product_id {
        return Ok(true);
    }

    let mut visited: HashSet<i64> = HashSet::new();
    let mut pending = vec![first_base];
    while let Some(product_id) = pending.pop() {
        if !visited.insert(product_id) {
            continue;
        }
        for (_, price) in usage::usages_with_current_price(db, product_id).await? {
            if let Some(base_product_id) = price.and_then(|row| row.base_product_id) {
                if base_product_id == target_product_id {
                    return Ok(true);
                }
                pending.push(base_product_id);
            }
        }
    }
    Ok(false)
}

/// Reports whether `product_id`'s ingredient graph transitively consumes
/// `ingredient_id`.
///
/// This is the companion walk for the price-edge direction: pointing an
/// ingredient's price at base product `B` closes a cycle exactly when `B`
/// already consumes that ingredient somewhere in its graph.
pub async fn product_consumes_ingredient<C>(
    db: &C,
    product_id: i64,
    ingredient_id: i64,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let mut visited: HashSet<i64> = HashSet::new();
    let mut pending = vec![product_id];
    while let Some(current) = pending.pop() {
        if !visited.insert(current) {
            continue;
        }
        for (usage, price) in usage::usages_with_current_price(db, current).await? {
            if usage.ingredient_id == ingredient_id {
                return Ok(true);
            }
            if let Some(base_product_id) = price.and_then(|row| row.base_product_id) {
                pending.push(base_product_id);
            }
        }
    }
    Ok(false)
}

/// Recursively computes a product's total cost from its ingredient usages.
///
/// Every usage is resolved against the ingredient's current price: a
/// base-product reference recurses and multiplies the sub-cost by the usage
/// quantity, a direct price multiplies straight through, and an ingredient
/// with no price fails the whole calculation. `visited` is populated on
/// entry and never pruned; re-entering a product id aborts with
/// [`Error::CircularDependency`]. Accumulation is plain `f64` addition in
/// usage order.
fn calculate_product_cost<'a, C>(
    db: &'a C,
    product_id: i64,
    visited: &'a mut HashSet<i64>,
) -> Pin<Box<dyn Future<Output = Result<f64>> + Send + 'a>>
where
    C: ConnectionTrait,
{
    Box::pin(async move {
        if !visited.insert(product_id) {
            return Err(Error::CircularDependency { product_id });
        }

        let mut total_cost = 0.0;
        for (usage, price) in usage::usages_with_current_price(db, product_id).await? {
            let Some(price) = price else {
                return Err(Error::MissingPrice {
                    ingredient_id: usage.ingredient_id,
                });
            };
            if let Some(base_product_id) = price.base_product_id {
                let sub_cost = calculate_product_cost(db, base_product_id, &mut *visited).await?;
                total_cost += sub_cost * usage.quantity;
            } else if let Some(unit_price) = price.price {
                total_cost += unit_price * usage.quantity;
            } else {
                return Err(Error::MissingPrice {
                    ingredient_id: usage.ingredient_id,
                });
            }
        }

        Ok(total_cost)
    })
}

/// Recomputes and persists a product's cost, cascading to every base product
/// touched by the walk.
///
/// The primary walk runs with a fresh visited set; the set afterwards holds
/// every product id the recursion entered. Each of those is then recomputed
/// and persisted with its own fresh visited set, so legitimately shared
/// sub-dependencies are not misreported as cycles during the secondary
/// passes. Runs on the caller's connection; mutation paths pass their
/// transaction so a failure rolls the whole unit of work back.
pub async fn recompute_product_cost<C>(db: &C, product_id: i64) -> Result<f64>
where
    C: ConnectionTrait,
{
    let mut visited: HashSet<i64> = HashSet::new();
    let cost = calculate_product_cost(db, product_id, &mut visited).await?;
    upsert_product_cost(db, product_id, cost).await?;

    for touched in visited {
        if touched == product_id {
            continue;
        }
        let mut secondary_visited: HashSet<i64> = HashSet::new();
        let sub_cost = calculate_product_cost(db, touched, &mut secondary_visited).await?;
        upsert_product_cost(db, touched, sub_cost).await?;
    }

    debug!(product_id, cost, "updated product cost cache");
    Ok(cost)
}

/// Recomputes a product's cost inside its own transaction.
///
/// Public entry point for callers outside a mutation: the cascade's cache
/// writes either all commit or none do.
pub async fn update_product_cost(db: &DatabaseConnection, product_id: i64) -> Result<f64> {
    let txn = db.begin().await?;
    let cost = recompute_product_cost(&txn, product_id).await?;
    txn.commit().await?;
    Ok(cost)
}

/// Reads a product's cached cost, computing and populating it on a miss.
///
/// The miss path should not happen while every mutation triggers its
/// cascade, but a read must never fail just because the cache row is absent.
pub async fn cached_or_recomputed_cost<C>(db: &C, product_id: i64) -> Result<f64>
where
    C: ConnectionTrait,
{
    match ProductCost::find_by_id(product_id).one(db).await? {
        Some(row) => Ok(row.cost),
        None => recompute_product_cost(db, product_id).await,
    }
}

/// Inserts or overwrites the cache row for one product.
async fn upsert_product_cost<C>(db: &C, product_id: i64, cost: f64) -> Result<()>
where
    C: ConnectionTrait,
{
    match ProductCost::find_by_id(product_id).one(db).await? {
        Some(existing) => {
            let mut row: product_cost::ActiveModel = existing.into();
            row.cost = Set(cost);
            row.update(db).await?;
        }
        None => {
            let row = product_cost::ActiveModel {
                product_id: Set(product_id),
                cost: Set(cost),
            };
            row.insert(db).await?;
        }
    }
    Ok(())
}
