//! Server configuration
//!
//! Read from the TOML file named by `EDITORIAL_CONFIG` (if set); the
//! listen address can be overridden with `EDITORIAL_ADDR`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use editorial_core::config::ConfigError;
use editorial_core::directory::RosterError;
use editorial_core::{EditorialConfig, StorageError};

pub const CONFIG_ENV: &str = "EDITORIAL_CONFIG";
pub const ADDR_ENV: &str = "EDITORIAL_ADDR";

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,
    /// SQLite database; in-memory storage when absent
    pub database_path: Option<PathBuf>,
    /// TOML roster of journal members
    pub roster_path: Option<PathBuf>,
    /// Engine configuration
    pub editorial: EditorialConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            database_path: None,
            roster_path: None,
            editorial: EditorialConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ServerError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ServerError::Config(ConfigError::Parse(e.to_string())))?;
        config.editorial.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ServerError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load from the environment, falling back to defaults
    pub fn from_env() -> Result<Self, ServerError> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };
        if let Ok(addr) = std::env::var(ADDR_ENV) {
            config.addr = addr;
        }
        Ok(config)
    }
}

/// Errors raised while starting the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Unsupported(String),
}
