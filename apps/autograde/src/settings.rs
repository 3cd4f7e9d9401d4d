//! # Settings
//!
//! Loads [`AutogradeConfig`] from a TOML file.
//!
//! - Missing file: defaults, with a warning
//! - Unparseable file: error, the service does not start
//! - Parsed file: validated before use

use crate::error::AppError;
use autograde_core::AutogradeConfig;
use std::path::Path;

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Load and validate the configuration at `path`.
pub fn load_config(path: &Path) -> Result<AutogradeConfig, AppError> {
    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "config file not found, using defaults"
        );
        return Ok(AutogradeConfig::default());
    }

    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(AppError::Config(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_CONFIG_FILE_SIZE
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Parse and validate a TOML document.
pub fn parse_config(content: &str) -> Result<AutogradeConfig, AppError> {
    let config: AutogradeConfig =
        toml::from_str(content).map_err(|e| AppError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Render a configuration as TOML.
pub fn render_toml(config: &AutogradeConfig) -> Result<String, AppError> {
    toml::to_string(config).map_err(|e| AppError::Config(e.to_string()))
}
