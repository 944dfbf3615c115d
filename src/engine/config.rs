//! Bolt Configuration Module
//! Handles loading and saving bolt.config.json

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "bolt.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Invalid config format: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub server: ServerConfig,
    pub relational: RelationalConfig,
    pub wide_column: WideColumnConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationalConfig {
    pub path: PathBuf,
    #[serde(default = "default_partition_key_column")]
    pub partition_key_column: String,
    #[serde(default = "default_row_key_column")]
    pub row_key_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WideColumnConfig {
    pub path: PathBuf,
}

fn default_port() -> u16 {
    54330
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_partition_key_column() -> String {
    "PartitionKey".to_string()
}

fn default_row_key_column() -> String {
    "RowKey".to_string()
}

impl Config {
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = project_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }
        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, project_dir: &Path) -> Result<(), ConfigError> {
        let config_path = project_dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn default_for_project() -> Self {
        Self {
            version: "0.1.0".to_string(),
            server: ServerConfig::default(),
            relational: RelationalConfig {
                path: PathBuf::from("./data/bolt.db"),
                partition_key_column: default_partition_key_column(),
                row_key_column: default_row_key_column(),
            },
            wide_column: WideColumnConfig {
                path: PathBuf::from("./data/tables"),
            },
        }
    }

    /// Resolve a configured path against the project directory
    pub fn resolve(&self, project_dir: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            project_dir.join(path)
        }
    }
}
