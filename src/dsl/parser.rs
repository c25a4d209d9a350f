//! Document loader: converts raw YAML/JSON/TOML text into a [`StructuralNode`].

use std::collections::BTreeMap;
use std::str::FromStr;

use super::structural::{Scalar, StructuralNode};
use crate::error::{DslError, DslResult};

/// Supported DSL input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DslFormat {
    /// YAML format (`.yaml` / `.yml`), the format Dify exports.
    #[default]
    Yaml,
    /// JSON format (`.json`).
    Json,
    /// TOML format (`.toml`).
    Toml,
}

impl DslFormat {
    pub fn name(&self) -> &'static str {
        match self {
            DslFormat::Yaml => "YAML",
            DslFormat::Json => "JSON",
            DslFormat::Toml => "TOML",
        }
    }

    /// Guess the format from a file extension, defaulting to YAML.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "json" => DslFormat::Json,
            "toml" => DslFormat::Toml,
            _ => DslFormat::Yaml,
        }
    }
}

impl FromStr for DslFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(DslFormat::Yaml),
            "json" => Ok(DslFormat::Json),
            "toml" => Ok(DslFormat::Toml),
            other => Err(format!("unknown DSL format: {}", other)),
        }
    }
}

/// Parse DSL content into a structural tree whose root is a mapping.
pub fn load_document(content: &str, format: DslFormat) -> DslResult<StructuralNode> {
    if content.trim().is_empty() {
        return Err(DslError::Empty);
    }

    let syntax = |message: String| DslError::Syntax {
        format: format.name(),
        message,
    };

    let root = match format {
        DslFormat::Yaml => {
            serde_saphyr::from_str::<StructuralNode>(content).map_err(|e| syntax(e.to_string()))?
        }
        DslFormat::Json => {
            serde_json::from_str::<StructuralNode>(content).map_err(|e| syntax(e.to_string()))?
        }
        DslFormat::Toml => {
            // Go through toml::Value so datetimes arrive as plain values
            // instead of the private marker struct toml uses for them.
            let toml_val: toml::Value =
                toml::from_str(content).map_err(|e: toml::de::Error| syntax(e.to_string()))?;
            toml_value_to_node(toml_val)
        }
    };

    match root {
        StructuralNode::Mapping(_) => Ok(root),
        other => Err(DslError::InvalidRoot(other.kind().to_string())),
    }
}

/// Like [`load_document`], for raw bytes that still need UTF-8 decoding.
pub fn load_document_bytes(bytes: &[u8], format: DslFormat) -> DslResult<StructuralNode> {
    let content =
        std::str::from_utf8(bytes).map_err(|e| DslError::InvalidEncoding(e.to_string()))?;
    load_document(content, format)
}

/// Convert a [`toml::Value`] into a [`StructuralNode`].
///
/// TOML has no null; `Datetime` values are stringified.
fn toml_value_to_node(val: toml::Value) -> StructuralNode {
    match val {
        toml::Value::String(s) => StructuralNode::Scalar(Scalar::String(s)),
        toml::Value::Integer(i) => StructuralNode::Scalar(Scalar::Int(i)),
        toml::Value::Float(f) => StructuralNode::Scalar(Scalar::Float(f)),
        toml::Value::Boolean(b) => StructuralNode::Scalar(Scalar::Bool(b)),
        toml::Value::Array(arr) => {
            StructuralNode::Sequence(arr.into_iter().map(toml_value_to_node).collect())
        }
        toml::Value::Table(tbl) => {
            let map: BTreeMap<String, StructuralNode> = tbl
                .into_iter()
                .map(|(k, v)| (k, toml_value_to_node(v)))
                .collect();
            StructuralNode::Mapping(map)
        }
        toml::Value::Datetime(dt) => StructuralNode::Scalar(Scalar::String(dt.to_string())),
    }
}
