//! Configuration loading errors.

use thiserror::Error;

/// Errors raised while building a [`ValidatorConfig`](crate::config::ValidatorConfig)
/// from a file or string.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(String),
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
    #[error("Invalid supported version: {0}")]
    InvalidVersion(String),
    #[error("Invalid app mode: {0}")]
    InvalidAppMode(String),
    #[error("Invalid node type definition '{node_type}': {reason}")]
    InvalidNodeType { node_type: String, reason: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}
