use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::GeneratorConfig;

/// Error type for loading and saving configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// On-disk config encoding, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// `.yaml`/`.yml` select YAML; everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Json,
        }
    }
}

/// Load and validate a generator config from disk.
pub fn load_config(path: &Path) -> Result<GeneratorConfig, ConfigError> {
    let body = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let config: GeneratorConfig = match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::from_str(&body)?,
        ConfigFormat::Yaml => serde_yaml::from_str(&body)?,
    };
    config.validate()?;
    Ok(config)
}

/// Serialize a config to disk, creating the parent directory if needed.
pub fn save_config(path: &Path, config: &GeneratorConfig) -> Result<(), ConfigError> {
    let body = match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|source| ConfigError::Write { path: parent.to_path_buf(), source })?;
    }
    fs::write(path, body).map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
}
