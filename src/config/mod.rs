//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `COVERBOT`
//! prefix and `__` as the nesting separator.
//!
//! # Example
//!
//! ```no_run
//! use coverbot::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod error;
mod services;
mod validation;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use services::ServicesConfig;
pub use validation::ValidationConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// LLM endpoint configuration (extraction + intent agents)
    #[serde(default)]
    pub ai: AiConfig,

    /// Policy platform configuration
    #[serde(default)]
    pub services: ServicesConfig,

    /// Validation thresholds
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present (for development)
    /// 2. Reads environment variables with the `COVERBOT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `COVERBOT__AI__API_KEY=...` -> `ai.api_key = ...`
    /// - `COVERBOT__SERVICES__BASE_URL=...` -> `services.base_url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the
    /// expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("COVERBOT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.services.validate()?;
        self.validation.validate()?;
        Ok(())
    }
}
