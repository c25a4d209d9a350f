//! Validator configuration.
//!
//! A [`ValidatorConfig`] bundles every process-wide constant the engine reads:
//! the supported DSL version, the recognized app modes, the node-type registry
//! and optional check toggles. It is built once and shared by reference; the
//! engine never mutates it.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::dsl::schema::{AppMode, FormatVersion};
use crate::dsl::validation::known_types::{FieldSpec, NodeTypeRegistry, NodeTypeSpec};
use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    pub supported_version: FormatVersion,
    /// Recognized modes, in advertised order.
    pub app_modes: Vec<AppMode>,
    pub registry: NodeTypeRegistry,
    /// Run the editor layout and `features` checks.
    pub frontend_checks: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            supported_version: FormatVersion::default(),
            app_modes: AppMode::ALL.to_vec(),
            registry: NodeTypeRegistry::dify(),
            frontend_checks: false,
        }
    }
}

/// On-disk form of [`ValidatorConfig`].
///
/// ```toml
/// supported_version = "0.4.0"
/// frontend_checks = true
///
/// [node_types.my-step]
/// role = "step"
/// fields = [{ name = "title", shape = "string" }, { name = "endpoint", shape = "string" }]
/// ```
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    supported_version: Option<String>,
    app_modes: Option<Vec<String>>,
    frontend_checks: bool,
    /// Start from the builtin Dify table before applying `node_types`.
    builtin_node_types: bool,
    node_types: BTreeMap<String, NodeTypeSpec>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        ConfigFile {
            supported_version: None,
            app_modes: None,
            frontend_checks: false,
            builtin_node_types: true,
            node_types: BTreeMap::new(),
        }
    }
}

impl ValidatorConfig {
    /// The default configuration, built on first use.
    pub fn global() -> &'static ValidatorConfig {
        static DEFAULT: OnceLock<ValidatorConfig> = OnceLock::new();
        DEFAULT.get_or_init(ValidatorConfig::default)
    }

    pub fn with_frontend_checks(mut self, enabled: bool) -> Self {
        self.frontend_checks = enabled;
        self
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Self::from_file(file)
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFile = serde_json::from_str(content)?;
        Self::from_file(file)
    }

    /// Load from a `.toml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    fn from_file(file: ConfigFile) -> ConfigResult<Self> {
        let mut config = ValidatorConfig {
            frontend_checks: file.frontend_checks,
            ..ValidatorConfig::default()
        };

        if let Some(version) = file.supported_version {
            config.supported_version = version
                .parse()
                .map_err(|e| ConfigError::InvalidVersion(format!("{}", e)))?;
        }

        if let Some(modes) = file.app_modes {
            let mut parsed = Vec::with_capacity(modes.len());
            for mode in modes {
                let mode: AppMode = mode.parse().map_err(ConfigError::InvalidAppMode)?;
                if !parsed.contains(&mode) {
                    parsed.push(mode);
                }
            }
            config.app_modes = parsed;
        }

        if !file.builtin_node_types {
            config.registry = NodeTypeRegistry::empty();
        }
        for (name, spec) in file.node_types {
            check_fields(&name, &spec.fields)?;
            config.registry.insert(name, spec);
        }

        tracing::debug!(
            version = %config.supported_version,
            node_types = config.registry.len(),
            frontend_checks = config.frontend_checks,
            "validator config loaded"
        );
        Ok(config)
    }

    pub fn recognizes(&self, mode: AppMode) -> bool {
        self.app_modes.contains(&mode)
    }
}

fn check_fields(node_type: &str, fields: &[FieldSpec]) -> ConfigResult<()> {
    for field in fields {
        if field.name.trim().is_empty() {
            return Err(ConfigError::InvalidNodeType {
                node_type: node_type.to_string(),
                reason: "field with empty name".to_string(),
            });
        }
        check_fields(node_type, &field.fields)?;
    }
    Ok(())
}
