use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::dsl::structural::{join_path, Scalar, StructuralNode};

use super::known_types::{
    FieldShape, FieldSpec, NodeRole, NodeTypeLookup, NodeTypeRegistry, NOTE_NODE_KIND,
    RESERVED_NAMESPACES,
};
use super::layer1_structure::{EDGES_PATH, NODES_PATH};
use super::types::{IssueCode, ValidationIssue};

/// A node entry that carried a usable id. Only the first occurrence of an id
/// is kept.
#[derive(Debug, Clone)]
pub struct GraphNode<'a> {
    pub id: String,
    pub node_type: Option<&'a str>,
    pub role: NodeRole,
    /// Child of an iteration/loop container.
    pub nested: bool,
    /// Canvas annotation; ignored by type and topology checks.
    pub note: bool,
    pub path: String,
}

/// An edge whose endpoints both resolve to distinct nodes.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    pub path: String,
}

/// Graph view handed to the topology checks.
#[derive(Debug, Default)]
pub struct GraphModel<'a> {
    pub nodes: Vec<GraphNode<'a>>,
    pub edges: Vec<GraphEdge>,
}

/// Check node entries and edges and build the [`GraphModel`].
///
/// `nodes` is `None` when the document's node collection could not be read.
/// Edge entries are then checked for shape only: without a node list every
/// endpoint would look dangling.
pub fn validate<'a>(
    nodes: Option<&'a [StructuralNode]>,
    edges: &'a [StructuralNode],
    registry: &NodeTypeRegistry,
) -> (Vec<ValidationIssue>, GraphModel<'a>) {
    let mut diags = Vec::new();
    let mut model = GraphModel::default();
    let mut index_of: HashMap<String, usize> = HashMap::new();
    let resolvable = nodes.is_some();
    let nodes = nodes.unwrap_or_default();

    for (idx, entry) in nodes.iter().enumerate() {
        let path = format!("{}[{}]", NODES_PATH, idx);
        if let Some(node) = check_node(entry, &path, registry, &index_of, &model, &mut diags) {
            index_of.insert(node.id.clone(), model.nodes.len());
            model.nodes.push(node);
        }
    }

    let mut edge_keys = HashSet::new();
    let endpoints = resolvable.then_some(&index_of);
    for (idx, entry) in edges.iter().enumerate() {
        let path = format!("{}[{}]", EDGES_PATH, idx);
        if let Some(edge) = check_edge(entry, &path, endpoints, &mut edge_keys, &mut diags) {
            model.edges.push(edge);
        }
    }

    let node_ids: HashSet<&str> = model.nodes.iter().map(|n| n.id.as_str()).collect();
    for (idx, entry) in nodes.iter().enumerate() {
        if entry.get_str("type") == Some(NOTE_NODE_KIND) {
            continue;
        }
        if let Some(data) = entry.get("data").filter(|d| d.as_mapping().is_some()) {
            let path = format!("{}[{}].data", NODES_PATH, idx);
            check_references(data, &path, &node_ids, &mut diags);
        }
    }

    tracing::debug!(
        node_count = nodes.len(),
        edge_count = edges.len(),
        resolved_edges = model.edges.len(),
        issues = diags.len(),
        "graph layer finished"
    );
    (diags, model)
}

fn check_node<'a>(
    entry: &'a StructuralNode,
    path: &str,
    registry: &NodeTypeRegistry,
    index_of: &HashMap<String, usize>,
    model: &GraphModel<'a>,
    diags: &mut Vec<ValidationIssue>,
) -> Option<GraphNode<'a>> {
    if entry.as_mapping().is_none() {
        diags.push(ValidationIssue::error(
            IssueCode::InvalidNode,
            format!("node entry must be a mapping, found {}", entry.kind()),
            path,
        ));
        return None;
    }

    let id = scalar_id(entry.get("id"));
    let label = id.clone().unwrap_or_else(|| path.to_string());
    let mut keep = true;

    match &id {
        None => {
            diags.push(ValidationIssue::error(
                IssueCode::MissingNodeId,
                "node is missing a non-empty 'id'",
                join_path(path, "id"),
            ));
            keep = false;
        }
        Some(id) => {
            if let Some(&first) = index_of.get(id) {
                diags.push(ValidationIssue::error(
                    IssueCode::DuplicateNodeId,
                    format!(
                        "duplicate node id '{}' (first defined at {})",
                        id, model.nodes[first].path
                    ),
                    join_path(path, "id"),
                ));
                keep = false;
            }
        }
    }

    let note = entry.get_str("type") == Some(NOTE_NODE_KIND);
    let data = entry.get("data").filter(|d| d.as_mapping().is_some());
    if data.is_none() {
        diags.push(ValidationIssue::error(
            IssueCode::MissingNodeData,
            format!("node '{}' is missing or has an invalid 'data' mapping", label),
            join_path(path, "data"),
        ));
    }

    let data_path = join_path(path, "data");
    let mut node_type = None;
    let mut role = NodeRole::Step;

    if let (Some(data), false) = (data, note) {
        match data.get_str("type").filter(|t| !t.trim().is_empty()) {
            None => diags.push(ValidationIssue::error(
                IssueCode::MissingNodeField,
                format!("node '{}' is missing required field 'type'", label),
                join_path(&data_path, "type"),
            )),
            Some(ty) => {
                node_type = Some(ty);
                role = registry.role(ty);
                match registry.lookup(ty) {
                    NodeTypeLookup::Known(spec) => {
                        let ctx = FieldContext {
                            label: &label,
                            node_type: ty,
                        };
                        check_fields(data, &spec.fields, &data_path, "", &ctx, diags);
                    }
                    NodeTypeLookup::Plugin => {}
                    NodeTypeLookup::Unknown => diags.push(ValidationIssue::warning(
                        IssueCode::UnknownNodeType,
                        format!(
                            "node '{}' has unknown type '{}'; its fields were not checked. Known types: {}",
                            label,
                            ty,
                            registry.type_names().collect::<Vec<_>>().join(", ")
                        ),
                        join_path(&data_path, "type"),
                    )),
                }
            }
        }
    }

    if !keep {
        return None;
    }

    let nested = entry.get_str("parentId").is_some()
        || data.and_then(|d| d.get("isInIteration")).and_then(StructuralNode::as_bool) == Some(true)
        || data.and_then(|d| d.get("isInLoop")).and_then(StructuralNode::as_bool) == Some(true);

    Some(GraphNode {
        id: id?,
        node_type,
        role,
        nested,
        note,
        path: path.to_string(),
    })
}

struct FieldContext<'c> {
    label: &'c str,
    node_type: &'c str,
}

/// Check `specs` against the mapping `value`.
///
/// `path` is the absolute document path of `value`, `rel` its path relative to
/// the node's `data`, used in messages.
fn check_fields(
    value: &StructuralNode,
    specs: &[FieldSpec],
    path: &str,
    rel: &str,
    ctx: &FieldContext<'_>,
    diags: &mut Vec<ValidationIssue>,
) {
    for spec in specs {
        let field_path = join_path(path, &spec.name);
        let field_rel = join_path(rel, &spec.name);

        let field = match value.get(&spec.name) {
            Some(field) if !field.is_null() => field,
            _ => {
                diags.push(ValidationIssue::error(
                    IssueCode::MissingNodeField,
                    format!(
                        "node '{}' ({}) is missing required field '{}'",
                        ctx.label, ctx.node_type, field_rel
                    ),
                    field_path,
                ));
                continue;
            }
        };

        if !shape_matches(spec.shape, field) {
            diags.push(ValidationIssue::error(
                IssueCode::InvalidNodeField,
                format!(
                    "field '{}' of node '{}' ({}) must be a {}, found {}",
                    field_rel,
                    ctx.label,
                    ctx.node_type,
                    spec.shape.as_str(),
                    field.kind()
                ),
                field_path,
            ));
            continue;
        }

        if spec.fields.is_empty() {
            continue;
        }
        match field {
            StructuralNode::Mapping(_) => {
                check_fields(field, &spec.fields, &field_path, &field_rel, ctx, diags)
            }
            StructuralNode::Sequence(items) => {
                for (idx, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", field_path, idx);
                    let item_rel = format!("{}[{}]", field_rel, idx);
                    if item.as_mapping().is_some() {
                        check_fields(item, &spec.fields, &item_path, &item_rel, ctx, diags);
                    } else {
                        diags.push(ValidationIssue::error(
                            IssueCode::InvalidNodeField,
                            format!(
                                "item '{}' of node '{}' ({}) must be a mapping, found {}",
                                item_rel,
                                ctx.label,
                                ctx.node_type,
                                item.kind()
                            ),
                            item_path,
                        ));
                    }
                }
            }
            StructuralNode::Scalar(_) => {}
        }
    }
}

fn shape_matches(shape: FieldShape, value: &StructuralNode) -> bool {
    match shape {
        FieldShape::Any => true,
        FieldShape::String => value.as_str().is_some(),
        FieldShape::Number => value.as_f64().is_some(),
        FieldShape::Bool => value.as_bool().is_some(),
        FieldShape::Sequence => value.as_sequence().is_some(),
        FieldShape::Mapping => value.as_mapping().is_some(),
    }
}

fn check_edge(
    entry: &StructuralNode,
    path: &str,
    index_of: Option<&HashMap<String, usize>>,
    edge_keys: &mut HashSet<(usize, usize, String)>,
    diags: &mut Vec<ValidationIssue>,
) -> Option<GraphEdge> {
    if entry.as_mapping().is_none() {
        diags.push(ValidationIssue::error(
            IssueCode::InvalidEdge,
            format!("edge entry must be a mapping, found {}", entry.kind()),
            path,
        ));
        return None;
    }

    let mut resolve = |field: &str| -> Option<usize> {
        let field_path = join_path(path, field);
        let Some(id) = scalar_id(entry.get(field)) else {
            diags.push(ValidationIssue::error(
                IssueCode::MissingEdgeField,
                format!("edge is missing a non-empty '{}' node id", field),
                field_path,
            ));
            return None;
        };
        match index_of?.get(&id) {
            Some(&idx) => Some(idx),
            None => {
                diags.push(ValidationIssue::error(
                    IssueCode::DanglingEdge,
                    format!("edge {} '{}' does not match any node id", field, id),
                    field_path,
                ));
                None
            }
        }
    };

    let source = resolve("source");
    let target = resolve("target");
    let (source, target) = (source?, target?);

    if source == target {
        diags.push(ValidationIssue::error(
            IssueCode::SelfLoopEdge,
            "edge connects a node to itself".to_string(),
            path,
        ));
        return None;
    }

    let handle = entry
        .get_str("sourceHandle")
        .or_else(|| entry.get_str("source_handle"))
        .unwrap_or("source")
        .to_string();
    if !edge_keys.insert((source, target, handle.clone())) {
        diags.push(ValidationIssue::warning(
            IssueCode::DuplicateEdge,
            format!("duplicate edge on handle '{}'", handle),
            path,
        ));
        return None;
    }

    Some(GraphEdge {
        source,
        target,
        path: path.to_string(),
    })
}

/// Node ids are strings in Dify exports; hand-written YAML often leaves them
/// as bare integers, which are accepted as their decimal text.
pub(crate) fn scalar_id(value: Option<&StructuralNode>) -> Option<String> {
    match value? {
        StructuralNode::Scalar(Scalar::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        StructuralNode::Scalar(Scalar::Int(i)) => Some(i.to_string()),
        _ => None,
    }
}

fn template_selector_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{#([^#]+)#\}\}").expect("template selector pattern is valid")
    })
}

fn check_references(
    data: &StructuralNode,
    data_path: &str,
    node_ids: &HashSet<&str>,
    diags: &mut Vec<ValidationIssue>,
) {
    let known = |root: &str| RESERVED_NAMESPACES.contains(&root) || node_ids.contains(root);

    data.walk_strings(data_path, &mut |path, text| {
        for cap in template_selector_regex().captures_iter(text) {
            let expr = cap.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            let Some((root, _)) = expr.split_once('.') else {
                diags.push(ValidationIssue::warning(
                    IssueCode::MalformedVariableReference,
                    format!("template selector '{{{{#{}#}}}}' must look like {{{{#node_id.variable#}}}}", expr),
                    path,
                ));
                continue;
            };
            if !known(root) {
                diags.push(ValidationIssue::warning(
                    IssueCode::UnknownVariableReference,
                    format!("template selector '{{{{#{}#}}}}' references unknown node '{}'", expr, root),
                    path,
                ));
            }
        }
    });

    walk_selectors(data, data_path, &mut |path, root| {
        if !known(root) {
            diags.push(ValidationIssue::warning(
                IssueCode::UnknownVariableReference,
                format!("variable selector references unknown node '{}'", root),
                path,
            ));
        }
    });
}

/// Visit the first segment of every `*_selector` string sequence.
fn walk_selectors<F>(node: &StructuralNode, path: &str, visit: &mut F)
where
    F: FnMut(&str, &str),
{
    match node {
        StructuralNode::Mapping(map) => {
            for (key, value) in map {
                let child_path = join_path(path, key);
                if key.ends_with("_selector") {
                    if let Some(root) = value
                        .as_sequence()
                        .and_then(|items| items.first())
                        .and_then(StructuralNode::as_str)
                    {
                        visit(&child_path, root);
                        continue;
                    }
                }
                walk_selectors(value, &child_path, visit);
            }
        }
        StructuralNode::Sequence(items) => {
            for (idx, item) in items.iter().enumerate() {
                walk_selectors(item, &format!("{}[{}]", path, idx), visit);
            }
        }
        StructuralNode::Scalar(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parser::{load_document, DslFormat};

    fn run(nodes_yaml: &str, edges_yaml: &str) -> Vec<ValidationIssue> {
        let doc = format!("nodes:\n{}\nedges:\n{}\n", nodes_yaml, edges_yaml);
        let root = load_document(&doc, DslFormat::Yaml).unwrap();
        let nodes = root.get_sequence("nodes").unwrap_or(&[]);
        let edges = root.get_sequence("edges").unwrap_or(&[]);
        let registry = NodeTypeRegistry::dify();
        validate(Some(nodes), edges, &registry).0
    }

    fn codes(diags: &[ValidationIssue]) -> Vec<IssueCode> {
        diags.iter().map(|d| d.code).collect()
    }

    const START: &str = "  - id: s\n    data: { type: start, title: Start }";
    const END: &str = "  - id: e\n    data: { type: end, title: End, outputs: [] }";

    #[test]
    fn test_clean_graph() {
        let diags = run(&format!("{}\n{}", START, END), "  - { source: s, target: e }");
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_duplicate_node_id_per_occurrence() {
        let nodes = format!("{}\n{}\n{}", START, START, START);
        let diags = run(&nodes, "  []");
        let dups: Vec<_> = diags
            .iter()
            .filter(|d| d.code == IssueCode::DuplicateNodeId)
            .collect();
        assert_eq!(dups.len(), 2);
        assert_eq!(dups[0].path, "workflow.graph.nodes[1].id");
        assert_eq!(dups[1].path, "workflow.graph.nodes[2].id");
    }

    #[test]
    fn test_dangling_edge_names_missing_id() {
        let diags = run(&format!("{}\n{}", START, END), "  - { source: missing-id, target: e }");
        assert_eq!(codes(&diags), vec![IssueCode::DanglingEdge]);
        assert!(diags[0].message.contains("'missing-id'"));
        assert_eq!(diags[0].path, "workflow.graph.edges[0].source");
    }

    #[test]
    fn test_both_endpoints_dangling() {
        let diags = run(START, "  - { source: ghost-a, target: ghost-b }");
        assert_eq!(codes(&diags), vec![IssueCode::DanglingEdge, IssueCode::DanglingEdge]);
        assert!(diags[1].path.ends_with(".target"));
    }

    #[test]
    fn test_missing_required_fields() {
        let nodes = "  - id: c\n    data: { type: code, title: Code, code: 'x = 1', variables: [] }";
        let diags = run(nodes, "  []");
        assert_eq!(
            codes(&diags),
            vec![IssueCode::MissingNodeField, IssueCode::MissingNodeField]
        );
        assert!(diags[0].message.contains("'code_language'"));
        assert_eq!(diags[1].path, "workflow.graph.nodes[0].data.outputs");
    }

    #[test]
    fn test_wrong_field_shape() {
        let nodes = "  - id: e\n    data: { type: end, title: End, outputs: nope }";
        let diags = run(nodes, "  []");
        assert_eq!(codes(&diags), vec![IssueCode::InvalidNodeField]);
        assert!(diags[0].message.contains("must be a sequence, found string"));
    }

    #[test]
    fn test_nested_if_else_cases() {
        let nodes = r#"  - id: b
    data:
      type: if-else
      title: Branch
      cases:
        - case_id: "true"
          logical_operator: and
          conditions: []
        - case_id: other
          conditions: []
        - just-a-string"#;
        let diags = run(nodes, "  []");
        assert_eq!(
            codes(&diags),
            vec![IssueCode::MissingNodeField, IssueCode::InvalidNodeField]
        );
        assert_eq!(diags[0].path, "workflow.graph.nodes[0].data.cases[1].logical_operator");
        assert!(diags[0].message.contains("'cases[1].logical_operator'"));
        assert_eq!(diags[1].path, "workflow.graph.nodes[0].data.cases[2]");
    }

    #[test]
    fn test_unknown_type_is_warning_and_skips_fields() {
        let nodes = "  - id: x\n    data: { type: teleport }";
        let diags = run(nodes, "  []");
        assert_eq!(codes(&diags), vec![IssueCode::UnknownNodeType]);
        assert!(!diags[0].is_error());
    }

    #[test]
    fn test_plugin_type_tolerated() {
        let diags = run("  - id: p\n    data: { type: plugin.vendor_node }", "  []");
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_structural_problems() {
        let nodes = "  - just a string\n  - data: { type: start, title: S }\n  - id: z";
        let diags = run(nodes, "  - 42\n  - { target: z }");
        assert_eq!(
            codes(&diags),
            vec![
                IssueCode::InvalidNode,
                IssueCode::MissingNodeId,
                IssueCode::MissingNodeData,
                IssueCode::InvalidEdge,
                IssueCode::MissingEdgeField,
            ]
        );
    }

    #[test]
    fn test_integer_ids_accepted() {
        let nodes = "  - id: 1\n    data: { type: start, title: S }\n  - id: 2\n    data: { type: end, title: E, outputs: [] }";
        let diags = run(nodes, "  - { source: 1, target: '2' }");
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_self_loop_and_duplicate_edge() {
        let diags = run(
            &format!("{}\n{}", START, END),
            "  - { source: s, target: s }\n  - { source: s, target: e }\n  - { source: s, target: e, sourceHandle: source }",
        );
        assert_eq!(codes(&diags), vec![IssueCode::SelfLoopEdge, IssueCode::DuplicateEdge]);
        assert!(diags[0].is_error());
        assert!(!diags[1].is_error());
    }

    #[test]
    fn test_note_nodes_skip_type_checks() {
        let nodes = "  - id: note1\n    type: custom-note\n    data: { type: '', text: 'remember {{#ghost#}}' }";
        let diags = run(nodes, "  []");
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_template_and_selector_references() {
        let nodes = r#"  - id: s
    data: { type: start, title: S }
  - id: a
    data:
      type: answer
      title: A
      answer: "{{#s.query#}} {{#sys.user_id#}} {{#ghost.text#}} {{#broken#}}"
  - id: e
    data:
      type: end
      title: E
      outputs:
        - variable: out
          value_selector: [phantom, text]
        - variable: ok
          value_selector: [a, answer]"#;
        let diags = run(nodes, "  []");
        assert_eq!(
            codes(&diags),
            vec![
                IssueCode::UnknownVariableReference,
                IssueCode::MalformedVariableReference,
                IssueCode::UnknownVariableReference,
            ]
        );
        assert!(diags[0].message.contains("'ghost'"));
        assert_eq!(diags[0].path, "workflow.graph.nodes[1].data.answer");
        assert_eq!(
            diags[2].path,
            "workflow.graph.nodes[2].data.outputs[0].value_selector"
        );
    }

    #[test]
    fn test_model_keeps_first_occurrence_and_resolved_edges() {
        let doc = format!(
            "nodes:\n{}\n{}\n{}\nedges:\n  - {{ source: s, target: e }}\n  - {{ source: s, target: nowhere }}\n",
            START, START, END
        );
        let root = load_document(&doc, DslFormat::Yaml).unwrap();
        let registry = NodeTypeRegistry::dify();
        let (_, model) = validate(
            root.get_sequence("nodes"),
            root.get_sequence("edges").unwrap(),
            &registry,
        );
        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.edges.len(), 1);
        assert_eq!(model.nodes[model.edges[0].target].id, "e");
        assert!(model.nodes[0].role.is_entry());
    }
}
