//! Policy platform configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Configuration of the external policy platform.
#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    /// Platform base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// OAuth client id for the token endpoint
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret for the token endpoint
    #[serde(default)]
    pub client_secret: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ServicesConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate platform configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !self.base_url.starts_with("http") {
            return Err(ValidationError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(())
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.customer.example-platform.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_services_config_defaults_validate() {
        assert!(ServicesConfig::default().validate().is_ok());
    }
}
