//! Validation threshold configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::collection::ValidationRules;

/// Thresholds applied by the field validators and underwriting.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Minimum age of a policy holder
    #[serde(default = "default_age_min")]
    pub age_min: u32,

    /// Maximum age of a policy holder
    #[serde(default = "default_age_max")]
    pub age_max: u32,

    /// Claims above this count fail underwriting
    #[serde(default = "default_max_claim_count")]
    pub max_claim_count: u32,
}

impl ValidationConfig {
    /// Convert into the domain's rule set.
    pub fn rules(&self) -> ValidationRules {
        ValidationRules {
            age_min: self.age_min,
            age_max: self.age_max,
            max_claim_count: self.max_claim_count,
        }
    }

    /// Validate the thresholds
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.age_min >= self.age_max {
            return Err(ValidationError::InvalidAgeBounds);
        }
        Ok(())
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            age_min: default_age_min(),
            age_max: default_age_max(),
            max_claim_count: default_max_claim_count(),
        }
    }
}

fn default_age_min() -> u32 {
    18
}

fn default_age_max() -> u32 {
    99
}

fn default_max_claim_count() -> u32 {
    2
}
