// Optional TOML configuration for search defaults.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use calscope_engine::query::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_ITEMS};

use crate::CliError;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub search: SearchSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchSection {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for SearchSection {
    fn default() -> Self {
        Self { max_items: DEFAULT_MAX_ITEMS, batch_size: DEFAULT_BATCH_SIZE }
    }
}

impl CliConfig {
    /// Load from a config file, or built-in defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_toml(&text)
            .map_err(|e| CliError::parse(format!("invalid config {}: {e}", path.display())))?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(text).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.search.batch_size == 0 {
            return Err("search.batch_size must be at least 1".to_string());
        }
        if self.search.max_items == 0 {
            return Err("search.max_items must be at least 1".to_string());
        }
        Ok(())
    }
}
