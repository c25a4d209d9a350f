//! Staged validation of a Dify app document.
//!
//! Stages run in a fixed order: loader, schema, graph (fields, edges,
//! references, then topology), version and the optional frontend checks.
//! A loader failure is terminal; every later stage reports what it can and
//! the next one works with whatever was extracted.

pub mod frontend;
pub mod known_types;
pub mod layer1_structure;
pub mod layer2_graph;
pub mod layer2_topology;
pub mod layer3_version;
pub mod types;

use crate::config::ValidatorConfig;
use crate::dsl::parser::{load_document, load_document_bytes, DslFormat};
use crate::error::DslResult;
use crate::dsl::schema::UNKNOWN;
use crate::dsl::structural::StructuralNode;

pub use known_types::{FieldShape, FieldSpec, NodeRole, NodeTypeRegistry, NodeTypeSpec};
pub use types::{IssueCode, Severity, ValidationInfo, ValidationIssue, ValidationResult};

pub fn validate_dsl(content: &str, format: DslFormat, config: &ValidatorConfig) -> ValidationResult {
    validate_loaded(load_document(content, format), format, config)
}

/// Like [`validate_dsl`] for undecoded input; bad UTF-8 is a `parse_error`.
pub fn validate_dsl_bytes(bytes: &[u8], format: DslFormat, config: &ValidatorConfig) -> ValidationResult {
    validate_loaded(load_document_bytes(bytes, format), format, config)
}

fn validate_loaded(
    loaded: DslResult<StructuralNode>,
    format: DslFormat,
    config: &ValidatorConfig,
) -> ValidationResult {
    match loaded {
        Ok(root) => validate_document(&root, config),
        Err(err) => {
            tracing::debug!(format = format.name(), error = %err, "document failed to load");
            ValidationResult::parse_failure(err.to_string())
        }
    }
}

pub fn validate_document(root: &StructuralNode, config: &ValidatorConfig) -> ValidationResult {
    let mut issues = Vec::new();

    let (schema_issues, facts) = layer1_structure::validate(root, config);
    issues.extend(schema_issues);

    let edges = facts.edges.unwrap_or_default();
    let (graph_issues, model) = layer2_graph::validate(facts.nodes, edges, &config.registry);
    issues.extend(graph_issues);
    issues.extend(layer2_topology::validate(&model));

    if let Some(version) = &facts.version {
        issues.extend(layer3_version::validate(version, &config.supported_version));
    }

    if config.frontend_checks {
        issues.extend(frontend::validate(root, facts.nodes, facts.mode));
    }

    let info = ValidationInfo {
        dsl_version: facts.version_label.unwrap_or_else(|| UNKNOWN.to_string()),
        app_mode: facts.mode_label.unwrap_or_else(|| UNKNOWN.to_string()),
        node_count: facts.nodes.map_or(0, <[StructuralNode]>::len),
        edge_count: edges.len(),
    };
    let result = ValidationResult::assemble(issues, info);

    tracing::debug!(
        success = result.success,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "validation finished"
    );
    result
}
