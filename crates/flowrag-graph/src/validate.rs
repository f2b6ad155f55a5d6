//! Structural validation of workflow graphs.
//!
//! Validation runs before any component executes and short-circuits on the
//! first failure. A graph that passes is guaranteed to be a non-empty DAG
//! with resolvable component types, exactly one entry node, and exactly one
//! terminal node.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::WorkflowGraph;

/// Lookup seam for component types, implemented by the component registry.
pub trait ComponentCatalog {
  /// Whether a component implementation is registered for this type tag.
  fn contains(&self, component_type: &str) -> bool;
}

/// Reasons a workflow graph fails validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
  #[error("workflow must contain at least one component")]
  EmptyGraph,

  #[error("duplicate node id '{0}'")]
  DuplicateNodeId(String),

  #[error("edge references unknown node: {source_node_id} -> {target_node_id}")]
  DanglingEdge {
    source_node_id: String,
    target_node_id: String,
  },

  #[error("node '{node_id}' has unknown component type '{component_type}'")]
  UnknownComponentType {
    node_id: String,
    component_type: String,
  },

  #[error("cycle detected involving node '{0}'")]
  CycleDetected(String),

  #[error("ambiguous entry point: expected exactly one node with no incoming edges, found {0}")]
  AmbiguousEntry(usize),

  #[error("ambiguous or missing output: expected exactly one terminal node, found {0}")]
  AmbiguousTerminal(usize),
}

/// Wire-shape validation result returned to callers of the validate
/// operation (HTTP 200 body `{valid, error}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
  pub valid: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl From<Result<(), ValidationError>> for ValidationReport {
  fn from(result: Result<(), ValidationError>) -> Self {
    match result {
      Ok(()) => Self {
        valid: true,
        error: None,
      },
      Err(e) => Self {
        valid: false,
        error: Some(e.to_string()),
      },
    }
  }
}

/// Validate the structural invariants of a workflow graph.
///
/// Checks, in order, short-circuiting on first failure:
/// 1. at least one node, no duplicate node ids
/// 2. every edge endpoint exists in the node set
/// 3. every node's component type resolves in the catalog
/// 4. no directed cycle
/// 5. exactly one entry node (no incoming edges)
/// 6. exactly one terminal node (no outgoing edges)
pub fn validate(
  workflow: &WorkflowGraph,
  catalog: &dyn ComponentCatalog,
) -> Result<(), ValidationError> {
  if workflow.nodes.is_empty() {
    return Err(ValidationError::EmptyGraph);
  }

  let mut seen: HashSet<&str> = HashSet::with_capacity(workflow.nodes.len());
  for node in &workflow.nodes {
    if !seen.insert(node.node_id.as_str()) {
      return Err(ValidationError::DuplicateNodeId(node.node_id.clone()));
    }
  }

  for edge in &workflow.edges {
    if !seen.contains(edge.source_node_id.as_str()) || !seen.contains(edge.target_node_id.as_str())
    {
      return Err(ValidationError::DanglingEdge {
        source_node_id: edge.source_node_id.clone(),
        target_node_id: edge.target_node_id.clone(),
      });
    }
  }

  for node in &workflow.nodes {
    if !catalog.contains(&node.component_type) {
      return Err(ValidationError::UnknownComponentType {
        node_id: node.node_id.clone(),
        component_type: node.component_type.clone(),
      });
    }
  }

  if let Some(node_id) = find_cycle(workflow) {
    return Err(ValidationError::CycleDetected(node_id));
  }

  let graph = workflow.graph();
  if graph.entry_points().len() != 1 {
    return Err(ValidationError::AmbiguousEntry(graph.entry_points().len()));
  }
  if graph.terminal_points().len() != 1 {
    return Err(ValidationError::AmbiguousTerminal(
      graph.terminal_points().len(),
    ));
  }

  Ok(())
}

/// Depth-first search with a recursion-stack marker. Returns a node that is
/// part of a cycle, or `None` if the graph is acyclic.
fn find_cycle(workflow: &WorkflowGraph) -> Option<String> {
  let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
  for node in &workflow.nodes {
    adjacency.entry(node.node_id.as_str()).or_default();
  }
  for edge in &workflow.edges {
    adjacency
      .entry(edge.source_node_id.as_str())
      .or_default()
      .push(edge.target_node_id.as_str());
  }
  // Sorted successors keep the reported cycle node stable across runs.
  for successors in adjacency.values_mut() {
    successors.sort_unstable();
  }

  let mut roots: Vec<&str> = workflow.nodes.iter().map(|n| n.node_id.as_str()).collect();
  roots.sort_unstable();

  let mut on_stack: HashSet<&str> = HashSet::new();
  let mut visited: HashSet<&str> = HashSet::new();

  for root in roots {
    if let Some(node_id) = dfs(root, &adjacency, &mut on_stack, &mut visited) {
      return Some(node_id);
    }
  }
  None
}

fn dfs<'a>(
  node: &'a str,
  adjacency: &HashMap<&'a str, Vec<&'a str>>,
  on_stack: &mut HashSet<&'a str>,
  visited: &mut HashSet<&'a str>,
) -> Option<String> {
  if on_stack.contains(node) {
    // Revisited while still on the recursion stack: this node closes a cycle.
    return Some(node.to_string());
  }
  if visited.contains(node) {
    return None;
  }

  on_stack.insert(node);
  if let Some(successors) = adjacency.get(node) {
    for next in successors {
      if let Some(found) = dfs(next, adjacency, on_stack, visited) {
        return Some(found);
      }
    }
  }
  on_stack.remove(node);
  visited.insert(node);
  None
}
