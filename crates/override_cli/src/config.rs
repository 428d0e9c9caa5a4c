//! Configuration management for the override-timeline CLI.
//!
//! The CLI reads a single TOML file holding the rule snapshot and display
//! preferences. The snapshot is validated by the engine before any command
//! runs.

use std::{
    fs,
    path::{Path, PathBuf},
};

use override_engine::{OverrideRule, RuleSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "timeline.toml";

/// Number of days shown by `forecast` and `grid` when not given.
pub const DEFAULT_FORECAST_DAYS: u32 = 14;

/// Sampling step of `grid` when not given.
pub const DEFAULT_GRID_STEP_MINUTES: u16 = 60;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Main configuration structure for the CLI.
///
/// # Example TOML Configuration
///
/// ```toml
/// [display]
/// forecast_days = 7
/// grid_step_minutes = 30
///
/// [[rules]]
/// type = "standard"
/// setting_name = "thermostat"
/// value = "20"
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub rules: Vec<OverrideRule>,
}

/// Output preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,

    #[serde(default = "default_grid_step_minutes")]
    pub grid_step_minutes: u16,
}

fn default_forecast_days() -> u32 {
    DEFAULT_FORECAST_DAYS
}

fn default_grid_step_minutes() -> u16 {
    DEFAULT_GRID_STEP_MINUTES
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            forecast_days: DEFAULT_FORECAST_DAYS,
            grid_step_minutes: DEFAULT_GRID_STEP_MINUTES,
        }
    }
}

impl TimelineConfig {
    /// Loads configuration from a TOML file at the specified path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file does not exist, cannot be read, or
    /// contains invalid TOML.
    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(Error::Config(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read configuration file: {}", e)))?;

        let config = Self::from_toml_str(&content)?;

        info!(rules = config.rules.len(), "Configuration loaded from {:?}", path);
        Ok(config)
    }

    /// Parses configuration text. Rules are checked by [`Self::snapshot`], not
    /// here.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the text is not valid TOML or does not match
    /// the rule schema.
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration file: {}", e)))
    }

    /// Validates the rules and returns them as an engine snapshot.
    pub fn snapshot(&self) -> Result<RuleSet, Error> {
        Ok(RuleSet::new(self.rules.clone())?)
    }
}

/// Resolves the configuration path, falling back to the default file name in
/// the current directory.
pub fn get_config_path(config_path: Option<&str>) -> PathBuf {
    match config_path {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(DEFAULT_CONFIG_FILENAME),
    }
}
