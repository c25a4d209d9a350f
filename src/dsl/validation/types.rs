//! Validation diagnostic types.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::dsl::schema::UNKNOWN;

/// Severity level of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Stable, machine-readable issue identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCode {
    ParseError,

    MissingVersion,
    InvalidVersion,
    MissingMode,
    InvalidMode,
    MissingGraph,
    MissingModelConfig,
    UnexpectedKind,

    DuplicateNodeId,
    InvalidNode,
    MissingNodeId,
    MissingNodeData,
    MissingNodeField,
    InvalidNodeField,
    UnknownNodeType,
    InvalidEdge,
    MissingEdgeField,
    DanglingEdge,
    SelfLoopEdge,
    DuplicateEdge,
    EdgeFromExit,
    OrphanNode,
    UnreachableNode,
    MultipleStartNodes,
    MissingStartNode,
    CycleDetected,
    UnknownVariableReference,
    MalformedVariableReference,

    UnsupportedFutureVersion,
    IncompatibleLegacyVersion,
    OutdatedVersion,
    AheadOfSupported,

    MissingNodePosition,
    InvalidNodePosition,
    MissingNodeDimensions,
    MissingFileUploadField,
    InvalidFileUploadField,
    MissingFileUploadConfig,
    MissingImageTransferMethods,
    InvalidSuggestedQuestions,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::ParseError => "parse_error",

            IssueCode::MissingVersion => "schema_error.missing_version",
            IssueCode::InvalidVersion => "schema_error.invalid_version",
            IssueCode::MissingMode => "schema_error.missing_mode",
            IssueCode::InvalidMode => "schema_error.invalid_mode",
            IssueCode::MissingGraph => "schema_error.missing_graph",
            IssueCode::MissingModelConfig => "schema_error.missing_model_config",
            IssueCode::UnexpectedKind => "schema_warning.unexpected_kind",

            IssueCode::DuplicateNodeId => "graph_error.duplicate_node_id",
            IssueCode::InvalidNode => "graph_error.invalid_node",
            IssueCode::MissingNodeId => "graph_error.missing_node_id",
            IssueCode::MissingNodeData => "graph_error.missing_node_data",
            IssueCode::MissingNodeField => "graph_error.missing_node_field",
            IssueCode::InvalidNodeField => "graph_error.invalid_node_field",
            IssueCode::UnknownNodeType => "graph_error.unknown_node_type",
            IssueCode::InvalidEdge => "graph_error.invalid_edge",
            IssueCode::MissingEdgeField => "graph_error.missing_edge_field",
            IssueCode::DanglingEdge => "graph_error.dangling_edge",
            IssueCode::SelfLoopEdge => "graph_error.self_loop_edge",
            IssueCode::DuplicateEdge => "graph_error.duplicate_edge",
            IssueCode::EdgeFromExit => "graph_error.edge_from_exit",
            IssueCode::OrphanNode => "graph_error.orphan_node",
            IssueCode::UnreachableNode => "graph_error.unreachable_node",
            IssueCode::MultipleStartNodes => "graph_error.multiple_start_nodes",
            IssueCode::MissingStartNode => "graph_error.missing_start_node",
            IssueCode::CycleDetected => "graph_error.cycle_detected",
            IssueCode::UnknownVariableReference => "graph_error.unknown_variable_reference",
            IssueCode::MalformedVariableReference => "graph_error.malformed_variable_reference",

            IssueCode::UnsupportedFutureVersion => "version_error.unsupported_future_version",
            IssueCode::IncompatibleLegacyVersion => "version_error.incompatible_legacy_version",
            IssueCode::OutdatedVersion => "version_warning.outdated_version",
            IssueCode::AheadOfSupported => "version_warning.ahead_of_supported",

            IssueCode::MissingNodePosition => "frontend_error.missing_node_position",
            IssueCode::InvalidNodePosition => "frontend_error.invalid_node_position",
            IssueCode::MissingNodeDimensions => "frontend_warning.missing_node_dimensions",
            IssueCode::MissingFileUploadField => "frontend_warning.missing_file_upload_field",
            IssueCode::InvalidFileUploadField => "frontend_warning.invalid_file_upload_field",
            IssueCode::MissingFileUploadConfig => "frontend_warning.missing_file_upload_config",
            IssueCode::MissingImageTransferMethods => {
                "frontend_warning.missing_image_transfer_methods"
            }
            IssueCode::InvalidSuggestedQuestions => "frontend_error.invalid_suggested_questions",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IssueCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl PartialEq<&str> for IssueCode {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// A single validation finding.
///
/// The severity is implied by which list of [`ValidationResult`] holds the
/// issue, so it is not serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    #[serde(skip)]
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    /// Location in the document, e.g. `workflow.graph.edges[3].source`.
    pub path: String,
}

impl ValidationIssue {
    pub fn error(code: IssueCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        ValidationIssue {
            severity: Severity::Error,
            code,
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        ValidationIssue {
            severity: Severity::Warning,
            code,
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Best-effort document metadata, filled in even when validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationInfo {
    pub dsl_version: String,
    pub app_mode: String,
    pub node_count: usize,
    pub edge_count: usize,
}

impl Default for ValidationInfo {
    fn default() -> Self {
        ValidationInfo {
            dsl_version: UNKNOWN.to_string(),
            app_mode: UNKNOWN.to_string(),
            node_count: 0,
            edge_count: 0,
        }
    }
}

/// Aggregated outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub success: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub info: ValidationInfo,
}

impl ValidationResult {
    /// Partition `issues` by severity, keeping relative order in each list.
    pub fn assemble(issues: Vec<ValidationIssue>, info: ValidationInfo) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            issues.into_iter().partition(ValidationIssue::is_error);
        ValidationResult {
            success: errors.is_empty(),
            errors,
            warnings,
            info,
        }
    }

    /// The terminal result for a document that could not be loaded.
    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::assemble(
            vec![ValidationIssue::error(IssueCode::ParseError, message, "")],
            ValidationInfo::default(),
        )
    }

    /// Iterate over every issue, errors first.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues().any(|issue| issue.code == code)
    }

    /// One-line status, e.g. `valid (0 errors, 1 warning)`.
    pub fn summary(&self) -> String {
        format!(
            "{} ({} {}, {} {})",
            if self.success { "valid" } else { "invalid" },
            self.errors.len(),
            plural(self.errors.len(), "error"),
            self.warnings.len(),
            plural(self.warnings.len(), "warning"),
        )
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
