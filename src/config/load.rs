//! Loading configuration from YAML

use super::schema::EngineConfig;
use super::validate::validate_config;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Load and validate an engine configuration file
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<EngineConfig> {
    let yaml_content = fs::read_to_string(config_path.as_ref()).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read config file {}: {}",
            config_path.as_ref().display(),
            e
        ))
    })?;

    EngineConfig::from_yaml_str(&yaml_content)
}

impl EngineConfig {
    /// Parse and validate YAML held in memory
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)
            .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {}", e)))?;

        validate_config(&config)
            .map_err(|e| Error::ConfigError(format!("Invalid config: {}", e)))?;

        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}
