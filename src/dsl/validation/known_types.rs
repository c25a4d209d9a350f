//! Node-type capability registry.
//!
//! Maps a `data.type` name to the node's graph role and the fields its `data`
//! mapping must carry. The builtin table follows the Dify 0.4 node entities;
//! it is policy data and can be extended or overridden through
//! [`ValidatorConfig`](crate::config::ValidatorConfig).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Variable namespaces that never name a node.
pub const RESERVED_NAMESPACES: &[&str] = &["sys", "env", "conversation", "loop", "iteration"];

/// Canvas node kind (top-level `type`) used for sticky-note annotations.
pub const NOTE_NODE_KIND: &str = "custom-note";

pub const START_NODE_TYPE: &str = "start";

/// Prefix under which plugin-provided node types are tolerated.
pub const PLUGIN_TYPE_PREFIX: &str = "plugin.";

/// Expected shape of a required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldShape {
    #[default]
    Any,
    String,
    Number,
    Bool,
    Sequence,
    Mapping,
}

impl FieldShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldShape::Any => "any",
            FieldShape::String => "string",
            FieldShape::Number => "number",
            FieldShape::Bool => "boolean",
            FieldShape::Sequence => "sequence",
            FieldShape::Mapping => "mapping",
        }
    }
}

/// A required key inside a node's `data`.
///
/// `fields` are nested requirements: applied to the value itself when it is a
/// mapping, or to every item when it is a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub shape: FieldShape,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSpec>,
}

/// Position a node type takes in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Where execution enters a graph or sub-graph.
    Entry,
    /// Where a branch of execution finishes.
    Exit,
    #[default]
    Step,
    /// Fans out through named source handles.
    Branch,
    /// Owns a nested sub-graph (iteration, loop).
    Container,
}

impl NodeRole {
    pub fn is_entry(&self) -> bool {
        matches!(self, NodeRole::Entry)
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, NodeRole::Exit)
    }
}

/// Registry entry for one node type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeTypeSpec {
    #[serde(default)]
    pub role: NodeRole,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Result of looking a type name up in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTypeLookup<'a> {
    Known(&'a NodeTypeSpec),
    /// A `plugin.*` type: accepted, shape unknown.
    Plugin,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeTypeRegistry {
    types: BTreeMap<String, NodeTypeSpec>,
}

impl NodeTypeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The builtin Dify node table.
    pub fn dify() -> Self {
        use FieldShape::*;

        let model = || {
            nested(
                "model",
                Mapping,
                vec![req("provider", String), req("name", String), req("mode", String)],
            )
        };

        let mut registry = Self::empty();
        let mut add = |name: &str, role: NodeRole, fields: Vec<FieldSpec>| {
            let mut all = vec![req("title", String)];
            all.extend(fields);
            registry.insert(name, NodeTypeSpec { role, fields: all });
        };

        add("start", NodeRole::Entry, vec![]);
        add("end", NodeRole::Exit, vec![req("outputs", Sequence)]);
        add("answer", NodeRole::Exit, vec![req("answer", String)]);
        add(
            "llm",
            NodeRole::Step,
            vec![
                model(),
                req("prompt_template", Any),
                nested("context", Mapping, vec![req("enabled", Bool)]),
            ],
        );
        add(
            "code",
            NodeRole::Step,
            vec![
                req("code", String),
                req("code_language", String),
                req("variables", Sequence),
                req("outputs", Mapping),
            ],
        );
        add(
            "template-transform",
            NodeRole::Step,
            vec![req("template", String), req("variables", Sequence)],
        );
        add(
            "http-request",
            NodeRole::Step,
            vec![
                req("method", String),
                req("url", String),
                nested("authorization", Mapping, vec![req("type", String)]),
                req("headers", String),
                req("params", String),
            ],
        );
        add(
            "if-else",
            NodeRole::Branch,
            vec![nested(
                "cases",
                Sequence,
                vec![
                    req("case_id", String),
                    req("logical_operator", String),
                    req("conditions", Sequence),
                ],
            )],
        );
        add(
            "question-classifier",
            NodeRole::Branch,
            vec![
                req("query_variable_selector", Sequence),
                model(),
                nested("classes", Sequence, vec![req("id", String), req("name", String)]),
            ],
        );
        add(
            "parameter-extractor",
            NodeRole::Step,
            vec![
                req("query", Sequence),
                model(),
                nested(
                    "parameters",
                    Sequence,
                    vec![req("name", String), req("type", String)],
                ),
            ],
        );
        add(
            "knowledge-retrieval",
            NodeRole::Step,
            vec![req("dataset_ids", Sequence), req("retrieval_mode", String)],
        );
        add(
            "variable-aggregator",
            NodeRole::Step,
            vec![req("output_type", String), req("variables", Sequence)],
        );
        add("variable-assigner", NodeRole::Step, vec![]);
        add(
            "iteration",
            NodeRole::Container,
            vec![req("iterator_selector", Sequence), req("output_selector", Sequence)],
        );
        add("iteration-start", NodeRole::Entry, vec![]);
        add(
            "loop",
            NodeRole::Container,
            vec![
                req("loop_count", Number),
                req("break_conditions", Sequence),
                req("logical_operator", String),
            ],
        );
        add("loop-start", NodeRole::Entry, vec![]);
        add("loop-end", NodeRole::Exit, vec![]);
        add("list-operator", NodeRole::Step, vec![req("variable", Sequence)]);
        add(
            "document-extractor",
            NodeRole::Step,
            vec![req("variable_selector", Sequence)],
        );
        add(
            "tool",
            NodeRole::Step,
            vec![
                req("provider_id", String),
                req("provider_type", String),
                req("provider_name", String),
                req("tool_name", String),
                req("tool_parameters", Mapping),
                req("tool_configurations", Mapping),
            ],
        );
        add(
            "agent",
            NodeRole::Step,
            vec![
                req("agent_strategy_provider_name", String),
                req("agent_strategy_name", String),
                req("agent_parameters", Mapping),
            ],
        );
        add("human-input", NodeRole::Step, vec![]);
        add("knowledge-index", NodeRole::Step, vec![]);
        add(
            "datasource",
            NodeRole::Entry,
            vec![req("plugin_id", String), req("provider_type", String)],
        );

        registry
    }

    /// Register or replace a node type.
    pub fn insert(&mut self, name: impl Into<String>, spec: NodeTypeSpec) {
        self.types.insert(name.into(), spec);
    }

    pub fn get(&self, node_type: &str) -> Option<&NodeTypeSpec> {
        self.types.get(node_type)
    }

    pub fn lookup(&self, node_type: &str) -> NodeTypeLookup<'_> {
        match self.types.get(node_type) {
            Some(spec) => NodeTypeLookup::Known(spec),
            None if node_type.starts_with(PLUGIN_TYPE_PREFIX) => NodeTypeLookup::Plugin,
            None => NodeTypeLookup::Unknown,
        }
    }

    /// Role of a type; plugin and unknown types count as plain steps.
    pub fn role(&self, node_type: &str) -> NodeRole {
        self.get(node_type).map(|spec| spec.role).unwrap_or_default()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

pub fn req(name: &str, shape: FieldShape) -> FieldSpec {
    FieldSpec {
        name: name.to_string(),
        shape,
        fields: Vec::new(),
    }
}

pub fn nested(name: &str, shape: FieldShape, fields: Vec<FieldSpec>) -> FieldSpec {
    FieldSpec {
        name: name.to_string(),
        shape,
        fields,
    }
}
