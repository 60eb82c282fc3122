//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `THOUGHT_PLANNER` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use thought_planner::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Max depth: {}", config.planner.max_depth);
//! ```

mod database;
mod error;
mod logging;
mod tenancy;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use tenancy::TenancyConfig;

use serde::Deserialize;

use crate::domain::planning::PlannerConfig;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a planner
/// running on the in-memory store with no default tenant.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Planner tunables (weights, branching, depth, pruning, TTL)
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,

    /// PostgreSQL connection; the in-memory store is used when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Tenant resolution
    #[serde(default)]
    pub tenancy: TenancyConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `THOUGHT_PLANNER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `THOUGHT_PLANNER__PLANNER__MAX_DEPTH=4` -> `planner.max_depth = 4`
    /// - `THOUGHT_PLANNER__PLANNER__WEIGHTS__RISK=0.5` -> `planner.weights.risk = 0.5`
    /// - `THOUGHT_PLANNER__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("THOUGHT_PLANNER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.planner.validate()?;
        self.logging.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.tenancy.validate()?;
        Ok(())
    }
}
