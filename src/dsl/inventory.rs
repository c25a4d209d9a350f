//! Read-only listing of the nodes a document declares.

use serde::Serialize;

use super::structural::StructuralNode;
use super::validation::layer2_graph::scalar_id;

/// One entry of `workflow.graph.nodes`, as far as it could be read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeListing {
    pub nodes: Vec<NodeSummary>,
    pub count: usize,
}

/// Summarize every node entry in document order.
///
/// A document without a readable `workflow.graph.nodes` sequence lists no
/// nodes. Entries that are not mappings still appear, with every field empty,
/// so `count` matches the raw collection length.
pub fn list_nodes(root: &StructuralNode) -> NodeListing {
    let entries = root
        .get_path(&["workflow", "graph", "nodes"])
        .and_then(StructuralNode::as_sequence)
        .unwrap_or_default();

    let nodes: Vec<NodeSummary> = entries
        .iter()
        .map(|entry| {
            let data = entry.get("data");
            NodeSummary {
                id: scalar_id(entry.get("id")),
                node_type: data.and_then(|d| d.get_str("type")).map(str::to_string),
                title: data.and_then(|d| d.get_str("title")).map(str::to_string),
            }
        })
        .collect();

    NodeListing {
        count: nodes.len(),
        nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parser::{load_document, DslFormat};

    #[test]
    fn test_lists_nodes_in_document_order() {
        let doc = r#"
workflow:
  graph:
    nodes:
      - id: start
        data: { type: start, title: Start }
      - id: 42
        data: { type: llm }
      - plain
      - id: end
        data: { type: end, title: End }
"#;
        let root = load_document(doc, DslFormat::Yaml).unwrap();
        let listing = list_nodes(&root);
        assert_eq!(listing.count, 4);
        assert_eq!(
            listing.nodes[0],
            NodeSummary {
                id: Some("start".into()),
                node_type: Some("start".into()),
                title: Some("Start".into()),
            }
        );
        assert_eq!(listing.nodes[1].id.as_deref(), Some("42"));
        assert_eq!(listing.nodes[1].title, None);
        assert_eq!(listing.nodes[2], NodeSummary::default());
        assert_eq!(listing.nodes[3].node_type.as_deref(), Some("end"));
    }

    #[test]
    fn test_missing_graph_lists_nothing() {
        let root = load_document("app: { mode: chat }\n", DslFormat::Yaml).unwrap();
        assert_eq!(list_nodes(&root), NodeListing::default());

        let root = load_document("workflow: { graph: { nodes: {} } }\n", DslFormat::Yaml).unwrap();
        assert_eq!(list_nodes(&root).count, 0);
    }

    #[test]
    fn test_serialized_shape() {
        let root = load_document(
            "workflow:\n  graph:\n    nodes:\n      - { id: a, data: { type: code, title: Run } }\n",
            DslFormat::Yaml,
        )
        .unwrap();
        let value = serde_json::to_value(list_nodes(&root)).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["nodes"][0]["type"], "code");
        assert_eq!(value["nodes"][0]["title"], "Run");
    }
}
