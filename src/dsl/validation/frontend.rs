//! Editor compatibility checks.
//!
//! The Dify canvas refuses to open a graph whose nodes lack a usable
//! `position`, and the app feature panel expects `file_upload` settings to be
//! complete once enabled. None of this matters to execution, so the stage only
//! runs when [`ValidatorConfig::frontend_checks`](crate::config::ValidatorConfig)
//! is set.

use crate::dsl::schema::AppMode;
use crate::dsl::structural::{join_path, StructuralNode};

use super::layer1_structure::NODES_PATH;
use super::types::{IssueCode, ValidationIssue};

const FILE_UPLOAD_LISTS: &[&str] = &[
    "allowed_file_types",
    "allowed_file_extensions",
    "allowed_file_upload_methods",
];

pub fn validate(
    root: &StructuralNode,
    nodes: Option<&[StructuralNode]>,
    mode: Option<AppMode>,
) -> Vec<ValidationIssue> {
    let mut diags = Vec::new();

    for (idx, node) in nodes.unwrap_or_default().iter().enumerate() {
        if node.as_mapping().is_some() {
            check_layout(node, &format!("{}[{}]", NODES_PATH, idx), &mut diags);
        }
    }

    if mode.map_or(false, |m| m.requires_graph()) {
        if let Some(features) = root
            .get_path(&["workflow", "features"])
            .filter(|f| f.as_mapping().is_some())
        {
            check_features(features, "workflow.features", &mut diags);
        }
    }

    tracing::debug!(issues = diags.len(), "frontend checks finished");
    diags
}

fn check_layout(node: &StructuralNode, path: &str, diags: &mut Vec<ValidationIssue>) {
    let label = node.get_str("id").unwrap_or(path);
    let position_path = join_path(path, "position");

    match node.get("position") {
        None => diags.push(ValidationIssue::error(
            IssueCode::MissingNodePosition,
            format!("node '{}' has no canvas position", label),
            position_path,
        )),
        Some(position) if position.as_mapping().is_none() => diags.push(ValidationIssue::error(
            IssueCode::InvalidNodePosition,
            format!(
                "position of node '{}' must be a mapping with numeric x and y, found {}",
                label,
                position.kind()
            ),
            position_path,
        )),
        Some(position) => {
            let numeric = |axis: &str| position.get(axis).and_then(StructuralNode::as_f64).is_some();
            if !numeric("x") || !numeric("y") {
                diags.push(ValidationIssue::error(
                    IssueCode::InvalidNodePosition,
                    format!("position of node '{}' needs numeric 'x' and 'y'", label),
                    position_path,
                ));
            }
        }
    }

    let missing: Vec<&str> = ["width", "height"]
        .into_iter()
        .filter(|key| node.get(key).is_none())
        .collect();
    if !missing.is_empty() {
        diags.push(ValidationIssue::warning(
            IssueCode::MissingNodeDimensions,
            format!("node '{}' is missing {}", label, missing.join(" and ")),
            path,
        ));
    }
}

fn check_features(features: &StructuralNode, path: &str, diags: &mut Vec<ValidationIssue>) {
    if let Some(upload) = features.get("file_upload") {
        let upload_path = join_path(path, "file_upload");

        if upload.get("enabled").and_then(StructuralNode::as_bool) == Some(true) {
            for key in FILE_UPLOAD_LISTS {
                let key_path = join_path(&upload_path, key);
                match upload.get(key) {
                    None => diags.push(ValidationIssue::warning(
                        IssueCode::MissingFileUploadField,
                        format!("file upload is enabled but '{}' is not set", key),
                        key_path,
                    )),
                    Some(value) if value.as_sequence().is_none() => {
                        diags.push(ValidationIssue::warning(
                            IssueCode::InvalidFileUploadField,
                            format!("'{}' must be a sequence, found {}", key, value.kind()),
                            key_path,
                        ))
                    }
                    Some(_) => {}
                }
            }
            if upload.get("fileUploadConfig").is_none() {
                diags.push(ValidationIssue::warning(
                    IssueCode::MissingFileUploadConfig,
                    "file upload is enabled but 'fileUploadConfig' is not set",
                    join_path(&upload_path, "fileUploadConfig"),
                ));
            }
        }

        if let Some(image) = upload.get("image") {
            let enabled = image.get("enabled").and_then(StructuralNode::as_bool) == Some(true);
            if enabled && image.get_sequence("transfer_methods").is_none() {
                diags.push(ValidationIssue::warning(
                    IssueCode::MissingImageTransferMethods,
                    "image upload is enabled but 'transfer_methods' is not a sequence",
                    join_path(&upload_path, "image.transfer_methods"),
                ));
            }
        }
    }

    if let Some(questions) = features.get("suggested_questions") {
        if questions.as_sequence().is_none() {
            diags.push(ValidationIssue::error(
                IssueCode::InvalidSuggestedQuestions,
                format!("suggested_questions must be a sequence, found {}", questions.kind()),
                join_path(path, "suggested_questions"),
            ));
        }
    }
}
