use std::collections::VecDeque;

use super::known_types::START_NODE_TYPE;
use super::layer1_structure::NODES_PATH;
use super::layer2_graph::GraphModel;
use super::types::{IssueCode, ValidationIssue};

const END_NODE_TYPE: &str = "end";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

pub fn validate(model: &GraphModel<'_>) -> Vec<ValidationIssue> {
    let mut diags = Vec::new();
    let count = model.nodes.len();

    // (target, edge index) per source, in document order.
    let mut out_edges: Vec<Vec<(usize, usize)>> = vec![Vec::new(); count];
    let mut degree = vec![0usize; count];
    for (idx, edge) in model.edges.iter().enumerate() {
        out_edges[edge.source].push((edge.target, idx));
        degree[edge.source] += 1;
        degree[edge.target] += 1;
    }

    let top_level = |i: usize| !model.nodes[i].note && !model.nodes[i].nested;

    let starts: Vec<usize> = (0..count)
        .filter(|&i| top_level(i) && model.nodes[i].node_type == Some(START_NODE_TYPE))
        .collect();
    if starts.len() > 1 {
        let ids: Vec<String> = starts
            .iter()
            .map(|&i| format!("'{}'", model.nodes[i].id))
            .collect();
        for &extra in &starts[1..] {
            diags.push(ValidationIssue::error(
                IssueCode::MultipleStartNodes,
                format!(
                    "graph has {} start nodes ({}); exactly one is allowed",
                    starts.len(),
                    ids.join(", ")
                ),
                model.nodes[extra].path.as_str(),
            ));
        }
    }

    let roots: Vec<usize> = (0..count)
        .filter(|&i| top_level(i) && model.nodes[i].role.is_entry())
        .collect();
    if roots.is_empty() && (0..count).any(top_level) {
        diags.push(ValidationIssue::warning(
            IssueCode::MissingStartNode,
            "graph has no start node",
            NODES_PATH,
        ));
    }

    let mut orphan = vec![false; count];
    for (i, node) in model.nodes.iter().enumerate() {
        if node.note || degree[i] > 0 || node.role.is_entry() || node.role.is_exit() {
            continue;
        }
        orphan[i] = true;
        diags.push(ValidationIssue::warning(
            IssueCode::OrphanNode,
            format!("node '{}' has no incoming or outgoing edges", node.id),
            node.path.as_str(),
        ));
    }

    if !roots.is_empty() {
        let reachable = bfs_reachable(&roots, &out_edges);
        for (i, node) in model.nodes.iter().enumerate() {
            if top_level(i) && !reachable[i] && !orphan[i] && !node.role.is_entry() {
                diags.push(ValidationIssue::warning(
                    IssueCode::UnreachableNode,
                    format!("node '{}' cannot be reached from the start node", node.id),
                    node.path.as_str(),
                ));
            }
        }
    }

    diags.extend(detect_cycles(model, &out_edges));

    for edge in &model.edges {
        if model.nodes[edge.source].node_type == Some(END_NODE_TYPE) {
            diags.push(ValidationIssue::warning(
                IssueCode::EdgeFromExit,
                format!(
                    "end node '{}' has an outgoing edge to '{}'",
                    model.nodes[edge.source].id, model.nodes[edge.target].id
                ),
                edge.path.as_str(),
            ));
        }
    }

    tracing::debug!(issues = diags.len(), roots = roots.len(), "topology checks finished");
    diags
}

fn bfs_reachable(roots: &[usize], out_edges: &[Vec<(usize, usize)>]) -> Vec<bool> {
    let mut reachable = vec![false; out_edges.len()];
    let mut queue = VecDeque::new();
    for &root in roots {
        reachable[root] = true;
        queue.push_back(root);
    }

    while let Some(node) = queue.pop_front() {
        for &(next, _) in &out_edges[node] {
            if !reachable[next] {
                reachable[next] = true;
                queue.push_back(next);
            }
        }
    }

    reachable
}

/// One issue per back edge found by a depth-first walk in document order.
///
/// The walk keeps its own frame stack so long chains cannot exhaust the
/// thread stack.
fn detect_cycles(model: &GraphModel<'_>, out_edges: &[Vec<(usize, usize)>]) -> Vec<ValidationIssue> {
    let mut diags = Vec::new();
    let mut state = vec![Visit::New; out_edges.len()];
    // (node, index of the next outgoing edge to follow)
    let mut frames: Vec<(usize, usize)> = Vec::new();

    for root in 0..out_edges.len() {
        if state[root] != Visit::New {
            continue;
        }
        state[root] = Visit::Active;
        frames.push((root, 0));

        while let Some(frame) = frames.last_mut() {
            let (node, cursor) = *frame;
            let Some(&(next, edge)) = out_edges[node].get(cursor) else {
                state[node] = Visit::Done;
                frames.pop();
                continue;
            };
            frame.1 += 1;

            match state[next] {
                Visit::New => {
                    state[next] = Visit::Active;
                    frames.push((next, 0));
                }
                Visit::Active => {
                    if let Some(pos) = frames.iter().position(|&(n, _)| n == next) {
                        let mut path: Vec<&str> = frames[pos..]
                            .iter()
                            .map(|&(n, _)| model.nodes[n].id.as_str())
                            .collect();
                        path.push(model.nodes[next].id.as_str());
                        diags.push(ValidationIssue::error(
                            IssueCode::CycleDetected,
                            format!("cycle detected: {}", path.join(" -> ")),
                            model.edges[edge].path.as_str(),
                        ));
                    }
                }
                Visit::Done => {}
            }
        }
    }

    diags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parser::{load_document, DslFormat};
    use crate::dsl::validation::known_types::{NodeRole, NodeTypeRegistry};
    use crate::dsl::validation::layer2_graph::{self, GraphEdge, GraphNode};

    fn run(doc: &str) -> Vec<ValidationIssue> {
        let root = load_document(doc, DslFormat::Yaml).unwrap();
        let registry = NodeTypeRegistry::dify();
        let (_, model) = layer2_graph::validate(
            Some(root.get_sequence("nodes").unwrap_or(&[])),
            root.get_sequence("edges").unwrap_or(&[]),
            &registry,
        );
        validate(&model)
    }

    fn codes(diags: &[ValidationIssue]) -> Vec<IssueCode> {
        diags.iter().map(|d| d.code).collect()
    }

    fn step(id: &str) -> String {
        format!(
            "  - id: {}\n    data: {{ type: template-transform, title: {}, template: x, variables: [] }}\n",
            id, id
        )
    }

    const START: &str = "  - id: s\n    data: { type: start, title: S }\n";
    const END: &str = "  - id: e\n    data: { type: end, title: E, outputs: [] }\n";

    #[test]
    fn test_linear_graph_is_clean() {
        let doc = format!(
            "nodes:\n{}{}{}edges:\n  - {{ source: s, target: a }}\n  - {{ source: a, target: e }}\n",
            START,
            step("a"),
            END
        );
        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_multiple_start_nodes() {
        let doc = format!(
            "nodes:\n{}  - id: s2\n    data: {{ type: start, title: S2 }}\n{}edges:\n  - {{ source: s, target: e }}\n  - {{ source: s2, target: e }}\n",
            START, END
        );
        let diags = run(&doc);
        assert_eq!(codes(&diags), vec![IssueCode::MultipleStartNodes]);
        assert_eq!(diags[0].path, "workflow.graph.nodes[1]");
        assert!(diags[0].message.contains("'s', 's2'"));
    }

    #[test]
    fn test_missing_start_is_warning() {
        let doc = format!("nodes:\n{}{}edges:\n  - {{ source: a, target: e }}\n", step("a"), END);
        let diags = run(&doc);
        assert_eq!(codes(&diags), vec![IssueCode::MissingStartNode]);
        assert!(!diags[0].is_error());
    }

    #[test]
    fn test_orphan_is_not_also_unreachable() {
        let doc = format!(
            "nodes:\n{}{}{}edges:\n  - {{ source: s, target: e }}\n",
            START,
            step("lonely"),
            END
        );
        let diags = run(&doc);
        assert_eq!(codes(&diags), vec![IssueCode::OrphanNode]);
        assert_eq!(diags[0].path, "workflow.graph.nodes[1]");
    }

    #[test]
    fn test_unreachable_island() {
        let doc = format!(
            "nodes:\n{}{}{}{}edges:\n  - {{ source: s, target: e }}\n  - {{ source: a, target: b }}\n",
            START,
            step("a"),
            step("b"),
            END
        );
        let diags = run(&doc);
        assert_eq!(
            codes(&diags),
            vec![IssueCode::UnreachableNode, IssueCode::UnreachableNode]
        );
        assert!(diags[0].message.contains("'a'"));
    }

    #[test]
    fn test_nested_children_skip_reachability() {
        let doc = format!(
            "nodes:\n{}  - id: child\n    parentId: it\n    data: {{ type: template-transform, title: C, template: x, variables: [] }}\n  - id: sibling\n    parentId: it\n    data: {{ type: template-transform, title: D, template: x, variables: [] }}\n{}edges:\n  - {{ source: s, target: e }}\n  - {{ source: child, target: sibling }}\n",
            START, END
        );
        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_cycle_detected() {
        let doc = format!(
            "nodes:\n{}{}{}{}edges:\n  - {{ source: s, target: a }}\n  - {{ source: a, target: b }}\n  - {{ source: b, target: a }}\n  - {{ source: b, target: e }}\n",
            START,
            step("a"),
            step("b"),
            END
        );
        let diags = run(&doc);
        assert_eq!(codes(&diags), vec![IssueCode::CycleDetected]);
        assert_eq!(diags[0].message, "cycle detected: a -> b -> a");
        assert_eq!(diags[0].path, "workflow.graph.edges[2]");
    }

    #[test]
    fn test_edge_from_end_node() {
        let doc = format!(
            "nodes:\n{}{}{}edges:\n  - {{ source: s, target: e }}\n  - {{ source: e, target: a }}\n",
            START,
            END,
            step("a")
        );
        let diags = run(&doc);
        assert_eq!(codes(&diags), vec![IssueCode::EdgeFromExit]);
        assert_eq!(diags[0].path, "workflow.graph.edges[1]");
    }

    #[test]
    fn test_empty_graph_has_no_findings() {
        assert!(run("nodes: []\nedges: []\n").is_empty());
    }

    fn chain(len: usize) -> GraphModel<'static> {
        let nodes = (0..len)
            .map(|i| GraphNode {
                id: format!("n{}", i),
                node_type: Some(if i == 0 { "start" } else { "template-transform" }),
                role: if i == 0 { NodeRole::Entry } else { NodeRole::Step },
                nested: false,
                note: false,
                path: format!("workflow.graph.nodes[{}]", i),
            })
            .collect();
        let edges = (1..len)
            .map(|i| GraphEdge {
                source: i - 1,
                target: i,
                path: format!("workflow.graph.edges[{}]", i - 1),
            })
            .collect();
        GraphModel { nodes, edges }
    }

    #[test]
    fn test_long_chain_walks_without_recursion() {
        let model = chain(200_000);
        assert!(validate(&model).is_empty());
    }

    #[test]
    fn test_long_cycle_reported_once() {
        let mut model = chain(200_000);
        model.edges.push(GraphEdge {
            source: 199_999,
            target: 1,
            path: "workflow.graph.edges[199999]".to_string(),
        });
        let diags = validate(&model);
        assert_eq!(codes(&diags), vec![IssueCode::CycleDetected]);
        assert_eq!(diags[0].path, "workflow.graph.edges[199999]");
        assert!(diags[0].message.starts_with("cycle detected: n1 -> n2 -> "));
        assert!(diags[0].message.ends_with("n199999 -> n1"));
    }
}
