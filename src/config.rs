//! Model configuration.
//!
//! `ModelConfig` sizes the lookup tables and sets the default split
//! fraction. Every field has a default, so a partial JSON document (or an
//! empty object) is a valid configuration.

use crate::error::FieldError;
use serde::{Deserialize, Serialize};

fn default_value_rows() -> usize {
    100
}

fn default_community_rows() -> usize {
    32
}

fn default_bonus_rows() -> usize {
    4
}

fn default_fraction() -> f64 {
    0.5
}

/// Table sizes and defaults for a [`CostModel`](crate::CostModel).
///
/// # Examples
///
/// ```rust
/// use sfxcost::ModelConfig;
///
/// let config = ModelConfig::from_json(r#"{ "value_rows": 60 }"#).unwrap();
/// assert_eq!(config.value_rows, 60);
/// assert_eq!(config.community_rows, 32);
/// assert_eq!(config.fraction_default, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Rows in the general value table.
    #[serde(default = "default_value_rows")]
    pub value_rows: usize,

    /// Rows in the community table.
    #[serde(default = "default_community_rows")]
    pub community_rows: usize,

    /// Rows in the component and gesture table.
    #[serde(default = "default_bonus_rows")]
    pub bonus_rows: usize,

    /// Starting split between the DN and FV ledgers.
    #[serde(default = "default_fraction")]
    pub fraction_default: f64,
}

impl ModelConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON and check it.
    pub fn from_json(json: &str) -> Result<Self, FieldError> {
        let config: ModelConfig =
            serde_json::from_str(json).map_err(|e| FieldError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every table has a row to start on and the fraction is a
    /// proportion.
    pub fn validate(&self) -> Result<(), FieldError> {
        for (name, rows) in [
            ("value_rows", self.value_rows),
            ("community_rows", self.community_rows),
            ("bonus_rows", self.bonus_rows),
        ] {
            if rows == 0 {
                return Err(FieldError::Config(format!("{name} must be at least 1")));
            }
        }
        if !(0.0..=1.0).contains(&self.fraction_default) {
            return Err(FieldError::Config(format!(
                "fraction_default must be within 0..=1, got {}",
                self.fraction_default
            )));
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            value_rows: default_value_rows(),
            community_rows: default_community_rows(),
            bonus_rows: default_bonus_rows(),
            fraction_default: default_fraction(),
        }
    }
}
