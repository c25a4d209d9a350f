//! Tool-style entry points over a [`ValidatorConfig`].

use std::borrow::Cow;

use serde::Serialize;

use crate::config::ValidatorConfig;
use crate::dsl::inventory::{self, NodeListing};
use crate::dsl::parser::{load_document, DslFormat};
use crate::error::DslResult;
use crate::dsl::validation::known_types::{FieldSpec, NodeRole, NodeTypeLookup};
use crate::dsl::validation::{self, ValidationResult};

/// Validates Dify app documents against one configuration.
///
/// Holds no per-call state; a single instance can be shared across threads.
///
/// ```rust
/// use dslcheck::DslValidator;
///
/// let validator = DslValidator::default();
/// let result = validator.validate("app: [unclosed");
/// assert!(!result.success);
/// assert_eq!(result.errors[0].code.as_str(), "parse_error");
/// ```
#[derive(Debug, Clone)]
pub struct DslValidator {
    config: Cow<'static, ValidatorConfig>,
}

impl Default for DslValidator {
    fn default() -> Self {
        DslValidator {
            config: Cow::Borrowed(ValidatorConfig::global()),
        }
    }
}

impl DslValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        DslValidator {
            config: Cow::Owned(config),
        }
    }

    pub fn builder() -> DslValidatorBuilder {
        DslValidatorBuilder {
            config: None,
            frontend_checks: None,
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a YAML document.
    pub fn validate(&self, content: &str) -> ValidationResult {
        self.validate_with_format(content, DslFormat::Yaml)
    }

    pub fn validate_with_format(&self, content: &str, format: DslFormat) -> ValidationResult {
        validation::validate_dsl(content, format, &self.config)
    }

    /// Validate raw bytes. Input that is not UTF-8 yields a `parse_error`.
    pub fn validate_bytes(&self, bytes: &[u8], format: DslFormat) -> ValidationResult {
        validation::validate_dsl_bytes(bytes, format, &self.config)
    }

    pub fn supported_dsl_version(&self) -> String {
        self.config.supported_version.to_string()
    }

    pub fn supported_app_modes(&self) -> Vec<&'static str> {
        self.config.app_modes.iter().map(|m| m.as_str()).collect()
    }

    /// Summarize the nodes of a document without validating it.
    ///
    /// Fails only when the document cannot be loaded at all.
    pub fn list_nodes(&self, content: &str, format: DslFormat) -> DslResult<NodeListing> {
        let root = load_document(content, format)?;
        let listing = inventory::list_nodes(&root);
        tracing::debug!(count = listing.count, "listed workflow nodes");
        Ok(listing)
    }

    /// Describe what the registry expects of a node type.
    pub fn node_schema(&self, node_type: &str) -> NodeSchemaInfo {
        let registry = &self.config.registry;
        let available_types = || registry.type_names().map(str::to_string).collect();

        match registry.lookup(node_type) {
            NodeTypeLookup::Known(spec) => NodeSchemaInfo {
                node_type: node_type.to_string(),
                known: true,
                plugin: false,
                role: Some(spec.role),
                required_fields: spec.fields.clone(),
                available_types: Vec::new(),
            },
            NodeTypeLookup::Plugin => NodeSchemaInfo {
                node_type: node_type.to_string(),
                known: false,
                plugin: true,
                role: Some(NodeRole::Step),
                required_fields: Vec::new(),
                available_types: available_types(),
            },
            NodeTypeLookup::Unknown => NodeSchemaInfo {
                node_type: node_type.to_string(),
                known: false,
                plugin: false,
                role: None,
                required_fields: Vec::new(),
                available_types: available_types(),
            },
        }
    }
}

/// Registry description of a single node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSchemaInfo {
    pub node_type: String,
    pub known: bool,
    /// `plugin.*` types are accepted without a field table.
    pub plugin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<NodeRole>,
    pub required_fields: Vec<FieldSpec>,
    /// Registered type names, filled in when `known` is false.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available_types: Vec<String>,
}

pub struct DslValidatorBuilder {
    config: Option<ValidatorConfig>,
    frontend_checks: Option<bool>,
}

impl DslValidatorBuilder {
    pub fn config(mut self, config: ValidatorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn frontend_checks(mut self, enabled: bool) -> Self {
        self.frontend_checks = Some(enabled);
        self
    }

    pub fn build(self) -> DslValidator {
        match (self.config, self.frontend_checks) {
            (None, None) => DslValidator::default(),
            (config, frontend) => {
                let mut config = config.unwrap_or_else(|| ValidatorConfig::global().clone());
                if let Some(enabled) = frontend {
                    config.frontend_checks = enabled;
                }
                DslValidator::new(config)
            }
        }
    }
}

/// Validate a YAML document with the default configuration.
pub fn validate_dsl(content: &str) -> ValidationResult {
    DslValidator::default().validate(content)
}

pub fn supported_dsl_version() -> String {
    DslValidator::default().supported_dsl_version()
}

pub fn supported_app_modes() -> Vec<&'static str> {
    DslValidator::default().supported_app_modes()
}
