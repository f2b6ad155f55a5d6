use std::collections::{HashMap, HashSet};

use crate::model::WorkflowGraph;

/// Adjacency structure for traversal and analysis.
///
/// Built from a [`WorkflowGraph`]; edges to or from unknown node ids are
/// ignored here and rejected by validation instead.
#[derive(Debug, Clone)]
pub struct Graph {
  /// node_id -> downstream node_ids, in edge declaration order.
  adjacency: HashMap<String, Vec<String>>,
  /// node_id -> upstream node_ids, in edge declaration order.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Nodes with no incoming edges, sorted by id.
  entry_points: Vec<String>,
  /// Nodes with no outgoing edges, sorted by id.
  terminal_points: Vec<String>,
  /// Nodes with more than one incoming edge.
  join_points: HashSet<String>,
}

impl Graph {
  pub fn new(workflow: &WorkflowGraph) -> Self {
    let known: HashSet<&str> = workflow.nodes.iter().map(|n| n.node_id.as_str()).collect();

    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for node in &workflow.nodes {
      adjacency.entry(node.node_id.clone()).or_default();
      reverse_adjacency.entry(node.node_id.clone()).or_default();
    }

    for edge in &workflow.edges {
      if !known.contains(edge.source_node_id.as_str()) || !known.contains(edge.target_node_id.as_str())
      {
        continue;
      }
      adjacency
        .entry(edge.source_node_id.clone())
        .or_default()
        .push(edge.target_node_id.clone());
      reverse_adjacency
        .entry(edge.target_node_id.clone())
        .or_default()
        .push(edge.source_node_id.clone());
    }

    let mut entry_points: Vec<String> = workflow
      .nodes
      .iter()
      .map(|n| n.node_id.clone())
      .filter(|id| reverse_adjacency.get(id).is_none_or(|v| v.is_empty()))
      .collect();
    entry_points.sort();

    let mut terminal_points: Vec<String> = workflow
      .nodes
      .iter()
      .map(|n| n.node_id.clone())
      .filter(|id| adjacency.get(id).is_none_or(|v| v.is_empty()))
      .collect();
    terminal_points.sort();

    let join_points: HashSet<String> = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.len() > 1)
      .map(|(id, _)| id.clone())
      .collect();

    Self {
      adjacency,
      reverse_adjacency,
      entry_points,
      terminal_points,
      join_points,
    }
  }

  /// Nodes with no incoming edges.
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Nodes with no outgoing edges.
  pub fn terminal_points(&self) -> &[String] {
    &self.terminal_points
  }

  /// Downstream nodes of a node.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Upstream nodes of a node.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Whether a node has multiple incoming edges.
  pub fn is_join_point(&self, node_id: &str) -> bool {
    self.join_points.contains(node_id)
  }
}
