//! Declarative graph definition, as accepted over the wire and stored.
//!
//! Required fields are `Option` here so that a missing `id`, `tool`, `from` or `to`
//! is reported as a [`WorkflowError::Definition`] naming the offending spec, not as
//! a bare deserialization error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WorkflowError;
use crate::state::StateMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: Option<String>,
    pub tool: Option<String>,
    #[serde(default)]
    pub params: StateMap,
    #[serde(default)]
    pub description: String,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            tool: Some(tool.into()),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Comparison spec of a conditional edge: `{"type": "gt", "key": "k", "value": 3}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub key: Option<String>,
    /// Literal or `$state.<key>` reference. Omitted means null.
    #[serde(default)]
    pub value: Value,
}

impl ConditionSpec {
    pub fn new(kind: impl Into<String>, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            kind: Some(kind.into()),
            key: Some(key.into()),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionSpec>,
}

impl EdgeSpec {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
            condition: None,
        }
    }

    /// Gates the edge on `condition`.
    pub fn when(mut self, condition: ConditionSpec) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Nodes, edges, optional start node and description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    #[serde(default, alias = "startNode", skip_serializing_if = "Option::is_none")]
    pub start_node: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl GraphDefinition {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn node(mut self, node: NodeSpec) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn edge(mut self, edge: EdgeSpec) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn start_at(mut self, node_id: impl Into<String>) -> Self {
        self.start_node = Some(node_id.into());
        self
    }

    /// Parses a JSON definition; structural type errors become `Definition` errors.
    pub fn from_value(value: Value) -> Result<Self, WorkflowError> {
        serde_json::from_value(value).map_err(|e| WorkflowError::Definition(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self, WorkflowError> {
        serde_json::from_str(s).map_err(|e| WorkflowError::Definition(e.to_string()))
    }
}
