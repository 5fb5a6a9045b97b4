//! Core business logic - framework-agnostic cost resolution operations.
//!
//! Each submodule owns the operations for one slice of the domain. Mutations
//! take a `&DatabaseConnection` and open their own transaction; helpers that
//! must share a caller's transaction are generic over `ConnectionTrait`.

/// Category management
pub mod category;
/// Cost resolution engine - cycle walks, recursive costing, cache cascade
pub mod cost;
/// Ingredient management and the diff-gated price upsert
pub mod ingredient;
/// Product management and cost-cache reads
pub mod product;
/// Unit conversion table management and seeding
pub mod unit;
/// Recipe edges - ingredient usages and their cascades
pub mod usage;
