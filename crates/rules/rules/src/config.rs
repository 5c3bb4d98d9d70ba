//! Engine configuration, loadable from TOML.
//!
//! ```toml
//! equality_tolerance = 1e-6
//! cache_capacity = 512
//! conditions = ["threshold", "range"]
//! ```

use serde::Deserialize;

use crate::error::ConfigError;
use crate::registry::builtins::BUILTIN_CONDITIONS;

/// Settings for building a [`RuleEngine`](crate::RuleEngine).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Relative tolerance used by `==` and `!=` (default: `1e-9`).
    #[serde(default = "default_equality_tolerance")]
    pub equality_tolerance: f64,
    /// Maximum number of compiled rules kept in the compile cache
    /// (default: 256). Zero disables caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    /// Built-in condition types to register. `None` registers all of them.
    #[serde(default)]
    pub conditions: Option<Vec<String>>,
}

fn default_equality_tolerance() -> f64 {
    1e-9
}

fn default_cache_capacity() -> u64 {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            equality_tolerance: default_equality_tolerance(),
            cache_capacity: default_cache_capacity(),
            conditions: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document. An empty document yields the
    /// defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot constrain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.equality_tolerance.is_finite() || self.equality_tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "equality_tolerance must be finite and non-negative, got {}",
                self.equality_tolerance
            )));
        }
        if let Some(conditions) = &self.conditions
            && let Some(unknown) = conditions
                .iter()
                .find(|name| !BUILTIN_CONDITIONS.contains(&name.as_str()))
        {
            return Err(ConfigError::Invalid(format!(
                "unknown built-in condition type `{unknown}`"
            )));
        }
        Ok(())
    }

    /// Whether the built-in `condition_type` should be registered.
    pub fn condition_enabled(&self, condition_type: &str) -> bool {
        self.conditions
            .as_ref()
            .is_none_or(|enabled| enabled.iter().any(|name| name == condition_type))
    }
}
