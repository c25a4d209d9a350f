use crate::config::ValidatorConfig;
use crate::dsl::schema::{AppMode, FormatVersion};
use crate::dsl::structural::StructuralNode;

use super::types::{IssueCode, ValidationIssue};

/// What the schema layer managed to extract for the later layers.
#[derive(Debug, Default)]
pub struct SchemaFacts<'a> {
    pub version: Option<FormatVersion>,
    /// Raw version text, kept for `info` even when it does not parse.
    pub version_label: Option<String>,
    pub mode: Option<AppMode>,
    pub mode_label: Option<String>,
    pub nodes: Option<&'a [StructuralNode]>,
    pub edges: Option<&'a [StructuralNode]>,
}

pub const NODES_PATH: &str = "workflow.graph.nodes";
pub const EDGES_PATH: &str = "workflow.graph.edges";

pub fn validate<'a>(
    root: &'a StructuralNode,
    config: &ValidatorConfig,
) -> (Vec<ValidationIssue>, SchemaFacts<'a>) {
    let mut diags = Vec::new();
    let mut facts = SchemaFacts::default();

    check_kind(root, &mut diags);
    check_version(root, &mut diags, &mut facts);
    check_mode(root, config, &mut diags, &mut facts);
    check_graph(root, &mut diags, &mut facts);
    check_model_config(root, &mut diags, &facts);

    tracing::debug!(
        issues = diags.len(),
        version = ?facts.version_label,
        mode = ?facts.mode_label,
        "schema layer finished"
    );
    (diags, facts)
}

fn check_kind(root: &StructuralNode, diags: &mut Vec<ValidationIssue>) {
    match root.get("kind") {
        None => {}
        Some(kind) if kind.is_null() || kind.as_str() == Some("app") => {}
        Some(kind) => diags.push(ValidationIssue::warning(
            IssueCode::UnexpectedKind,
            format!(
                "kind should be 'app', found {}; the document is read as an app",
                describe(kind)
            ),
            "kind",
        )),
    }
}

fn check_version(
    root: &StructuralNode,
    diags: &mut Vec<ValidationIssue>,
    facts: &mut SchemaFacts<'_>,
) {
    let value = match root.get("version") {
        Some(value) if !value.is_null() => value,
        _ => {
            diags.push(ValidationIssue::error(
                IssueCode::MissingVersion,
                "missing required field 'version' (expected a string such as \"0.4.0\")",
                "version",
            ));
            return;
        }
    };

    let Some(text) = value.as_str() else {
        diags.push(ValidationIssue::error(
            IssueCode::InvalidVersion,
            format!(
                "version must be a quoted string such as \"0.4.0\", found {}",
                value.kind()
            ),
            "version",
        ));
        return;
    };

    facts.version_label = Some(text.to_string());
    match text.parse::<FormatVersion>() {
        Ok(version) => facts.version = Some(version),
        Err(e) => diags.push(ValidationIssue::error(
            IssueCode::InvalidVersion,
            format!("invalid version format: {}", e),
            "version",
        )),
    }
}

fn check_mode(
    root: &StructuralNode,
    config: &ValidatorConfig,
    diags: &mut Vec<ValidationIssue>,
    facts: &mut SchemaFacts<'_>,
) {
    let app = match root.get("app") {
        Some(app) if app.as_mapping().is_some() => app,
        Some(app) if !app.is_null() => {
            diags.push(ValidationIssue::error(
                IssueCode::MissingMode,
                format!("'app' must be a mapping containing 'mode', found {}", app.kind()),
                "app",
            ));
            return;
        }
        _ => {
            diags.push(ValidationIssue::error(
                IssueCode::MissingMode,
                "missing 'app' section with the app mode",
                "app",
            ));
            return;
        }
    };

    let value = match app.get("mode") {
        Some(value) if !value.is_null() => value,
        _ => {
            diags.push(ValidationIssue::error(
                IssueCode::MissingMode,
                "missing app mode",
                "app.mode",
            ));
            return;
        }
    };

    let allowed = config
        .app_modes
        .iter()
        .map(AppMode::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let Some(text) = value.as_str() else {
        diags.push(ValidationIssue::error(
            IssueCode::InvalidMode,
            format!("app mode must be a string, found {}. Must be one of: {}", value.kind(), allowed),
            "app.mode",
        ));
        return;
    };

    facts.mode_label = Some(text.to_string());
    match text.parse::<AppMode>() {
        Ok(mode) if config.recognizes(mode) => facts.mode = Some(mode),
        _ => diags.push(ValidationIssue::error(
            IssueCode::InvalidMode,
            format!("invalid app mode: {}. Must be one of: {}", text, allowed),
            "app.mode",
        )),
    }
}

fn check_graph<'a>(
    root: &'a StructuralNode,
    diags: &mut Vec<ValidationIssue>,
    facts: &mut SchemaFacts<'a>,
) {
    // Unknown or invalid modes are held to the workflow shape.
    let required = facts.mode.map(|m| m.requires_graph()).unwrap_or(true);
    let mode_name = facts.mode.map(|m| m.as_str()).unwrap_or("workflow");

    let missing = |path: &str, what: &str| {
        ValidationIssue::error(
            IssueCode::MissingGraph,
            format!("missing {} required for {} apps", what, mode_name),
            path,
        )
    };
    let wrong_shape = |path: &str, expected: &str, found: &StructuralNode| {
        ValidationIssue::error(
            IssueCode::MissingGraph,
            format!("'{}' must be a {}, found {}", path, expected, found.kind()),
            path,
        )
    };

    let workflow = match root.get("workflow") {
        Some(w) if w.is_null() => None,
        other => other,
    };
    let Some(workflow) = workflow else {
        if required {
            diags.push(missing("workflow", "'workflow' section"));
        }
        return;
    };
    if workflow.as_mapping().is_none() {
        diags.push(wrong_shape("workflow", "mapping", workflow));
        return;
    }

    let graph = match workflow.get("graph") {
        Some(g) if !g.is_null() => g,
        _ => {
            if required {
                diags.push(missing("workflow.graph", "'workflow.graph'"));
            }
            return;
        }
    };
    if graph.as_mapping().is_none() {
        diags.push(wrong_shape("workflow.graph", "mapping", graph));
        return;
    }

    // Both collections are extracted independently; only the first problem is
    // reported so a broken container yields one schema issue.
    let mut first_problem = None;
    for (key, path, slot) in [
        ("nodes", NODES_PATH, &mut facts.nodes),
        ("edges", EDGES_PATH, &mut facts.edges),
    ] {
        match graph.get(key) {
            Some(value) => match value.as_sequence() {
                Some(items) => *slot = Some(items),
                None => {
                    first_problem.get_or_insert_with(|| wrong_shape(path, "sequence", value));
                }
            },
            // A graph without connections may leave `edges` out.
            None if key == "edges" => *slot = Some(&[][..]),
            None => {
                first_problem.get_or_insert_with(|| missing(path, &format!("'{}'", path)));
            }
        }
    }
    if let Some(issue) = first_problem {
        diags.push(issue);
    }
}

fn check_model_config(
    root: &StructuralNode,
    diags: &mut Vec<ValidationIssue>,
    facts: &SchemaFacts<'_>,
) {
    let Some(mode) = facts.mode else {
        return;
    };
    if mode.requires_graph() {
        return;
    }
    if root.get_mapping("model_config").is_none() {
        diags.push(ValidationIssue::error(
            IssueCode::MissingModelConfig,
            format!("missing 'model_config' mapping required for {} apps", mode),
            "model_config",
        ));
    }
}

fn describe(node: &StructuralNode) -> String {
    match node.as_str() {
        Some(s) => format!("'{}'", s),
        None => node.kind().to_string(),
    }
}
