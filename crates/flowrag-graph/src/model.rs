use serde::{Deserialize, Serialize};

use crate::graph::Graph;

/// Output handle an edge reads from when the builder did not name one.
pub const DEFAULT_SOURCE_HANDLE: &str = "default";

/// Input handle an edge writes to when the builder did not name one.
pub const DEFAULT_TARGET_HANDLE: &str = "input";

fn default_source_handle() -> String {
  DEFAULT_SOURCE_HANDLE.to_string()
}

fn default_target_handle() -> String {
  DEFAULT_TARGET_HANDLE.to_string()
}

/// One component placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
  /// Graph-local identifier, unique within the workflow.
  pub node_id: String,
  /// Tag selecting a registered component implementation.
  pub component_type: String,
  /// Opaque settings interpreted only by the component implementation.
  #[serde(default)]
  pub config: serde_json::Value,
}

/// One directed connection between two component ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
  pub source_node_id: String,
  /// Named output port on the source node.
  #[serde(default = "default_source_handle")]
  pub source_handle: String,
  pub target_node_id: String,
  /// Named input port on the target node.
  #[serde(default = "default_target_handle")]
  pub target_handle: String,
}

/// A complete workflow definition, ready to be validated and executed.
///
/// Owned by the caller for the duration of a run; the engine never
/// mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
  pub workflow_id: String,
  pub name: String,
  pub nodes: Vec<NodeSpec>,
  #[serde(default)]
  pub edges: Vec<EdgeSpec>,
}

impl WorkflowGraph {
  /// Build the adjacency structure for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(self)
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&NodeSpec> {
    self.nodes.iter().find(|n| n.node_id == node_id)
  }

  /// Incoming edges of a node.
  pub fn incoming_edges(&self, node_id: &str) -> impl Iterator<Item = &EdgeSpec> {
    self.edges.iter().filter(move |e| e.target_node_id == node_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn edge_handles_default_when_omitted() {
    let edge: EdgeSpec = serde_json::from_value(json!({
      "source_node_id": "in",
      "target_node_id": "out"
    }))
    .unwrap();

    assert_eq!(edge.source_handle, DEFAULT_SOURCE_HANDLE);
    assert_eq!(edge.target_handle, DEFAULT_TARGET_HANDLE);
  }

  #[test]
  fn node_config_defaults_to_null() {
    let node: NodeSpec = serde_json::from_value(json!({
      "node_id": "in",
      "component_type": "user_query"
    }))
    .unwrap();

    assert!(node.config.is_null());
  }

  #[test]
  fn workflow_round_trips_through_json() {
    let workflow = WorkflowGraph {
      workflow_id: "wf-1".to_string(),
      name: "Example".to_string(),
      nodes: vec![NodeSpec {
        node_id: "in".to_string(),
        component_type: "user_query".to_string(),
        config: json!({}),
      }],
      edges: vec![],
    };

    let encoded = serde_json::to_string(&workflow).unwrap();
    let decoded: WorkflowGraph = serde_json::from_str(&encoded).unwrap();
    assert_eq!(workflow, decoded);
  }
}
