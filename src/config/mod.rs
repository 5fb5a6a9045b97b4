/// Database configuration and connection management
pub mod database;

/// Unit seed configuration loading from config.toml
pub mod units;
