//! Unit seed configuration loading from config.toml
//!
//! This module provides functionality to load the initial unit table from a
//! TOML configuration file. The units defined in config.toml are used to seed
//! the database on first run or when units are missing.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// List of unit configurations to seed
    pub units: Vec<UnitConfig>,
}

/// Configuration for a single unit of measure
#[derive(Debug, Deserialize, Clone)]
pub struct UnitConfig {
    /// Name of the unit (e.g., "g", "kg")
    pub name: String,
    /// Name of the base unit this unit converts into; omit for base units
    pub base_unit: Option<String>,
    /// Conversion divisor into the base unit (e.g., 0.001 for "kg" over "g")
    pub factor: f64,
}

/// Loads unit configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads unit configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}
