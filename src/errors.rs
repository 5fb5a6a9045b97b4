//! Unified error types for the cost engine.
//!
//! Validation failures, missing price data, and cycle detections each get
//! their own variant so callers can map them to the right user-facing
//! outcome; store errors are passed through unchanged.

use thiserror::Error;

/// All errors the crate can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or parsing failed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the failure
        message: String,
    },

    /// An amount (price, quantity, factor) is out of range or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending value
        amount: f64,
    },

    /// A price row must carry either a direct price or a base product
    #[error("either a price or a base product must be set, but not both")]
    AmbiguousPriceSource,

    /// Referenced unit does not exist
    #[error("Unit not found: {id}")]
    UnitNotFound {
        /// Unit id that failed to resolve
        id: i64,
    },

    /// Referenced ingredient does not exist
    #[error("Ingredient not found: {id}")]
    IngredientNotFound {
        /// Ingredient id that failed to resolve
        id: i64,
    },

    /// Referenced product does not exist
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Product id that failed to resolve
        id: i64,
    },

    /// Referenced category does not exist
    #[error("Category not found: {id}")]
    CategoryNotFound {
        /// Category id that failed to resolve
        id: i64,
    },

    /// Referenced ingredient usage does not exist
    #[error("Ingredient usage not found: {id}")]
    UsageNotFound {
        /// Usage id that failed to resolve
        id: i64,
    },

    /// An ingredient reached during cost calculation has no price history
    #[error("no price found for ingredient {ingredient_id}")]
    MissingPrice {
        /// The unpriced ingredient
        ingredient_id: i64,
    },

    /// A product was re-entered during a cost calculation walk
    #[error("circular dependency detected on product {product_id}")]
    CircularDependency {
        /// A product id on the cycle
        product_id: i64,
    },

    /// A rejected mutation that would have introduced a cycle
    #[error(
        "linking ingredient {ingredient_id} to product {product_id} would create a circular dependency"
    )]
    CircularReference {
        /// The product that would have depended on itself
        product_id: i64,
        /// The ingredient whose price chain closes the cycle
        ingredient_id: i64,
    },

    /// Deletion guard: the row is still referenced elsewhere
    #[error("{entity} {id} is still in use by: {used_by}")]
    StillInUse {
        /// Kind of row the guard protected
        entity: &'static str,
        /// Id of the protected row
        id: i64,
        /// Names of the referencing rows
        used_by: String,
    },

    /// Database error from the store
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
