//! Deterministic execution planning.
//!
//! Planning assumes a validated, acyclic graph but still defends against
//! cycles so it stays safe when called on its own.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use thiserror::Error;

use crate::model::WorkflowGraph;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
  #[error("cycle detected during planning")]
  CycleDetected,
}

/// Compute a deterministic topological evaluation order.
///
/// Kahn's algorithm with a smallest-node-id tie-break: among all nodes
/// whose dependencies are satisfied, the lexicographically smallest id is
/// emitted first. The same graph always plans to the same order.
pub fn plan(workflow: &WorkflowGraph) -> Result<Vec<String>, PlanError> {
  let mut in_degree = in_degrees(workflow);
  let graph = workflow.graph();

  let mut ready: BinaryHeap<Reverse<String>> = in_degree
    .iter()
    .filter(|(_, degree)| **degree == 0)
    .map(|(id, _)| Reverse(id.clone()))
    .collect();

  let mut order = Vec::with_capacity(workflow.nodes.len());
  while let Some(Reverse(node_id)) = ready.pop() {
    for next in graph.downstream(&node_id) {
      let degree = in_degree.get_mut(next).expect("downstream node tracked");
      *degree -= 1;
      if *degree == 0 {
        ready.push(Reverse(next.clone()));
      }
    }
    order.push(node_id);
  }

  if order.len() != workflow.nodes.len() {
    return Err(PlanError::CycleDetected);
  }
  Ok(order)
}

/// Group the plan into dependency waves.
///
/// Nodes within one wave have no ancestor/descendant relationship and may
/// execute concurrently; a wave only starts after the previous wave
/// completed. Nodes within a wave are sorted by id.
pub fn waves(workflow: &WorkflowGraph) -> Result<Vec<Vec<String>>, PlanError> {
  let mut in_degree = in_degrees(workflow);
  let graph = workflow.graph();

  let mut current: Vec<String> = in_degree
    .iter()
    .filter(|(_, degree)| **degree == 0)
    .map(|(id, _)| id.clone())
    .collect();
  current.sort();

  let mut waves = Vec::new();
  let mut emitted = 0;
  while !current.is_empty() {
    emitted += current.len();

    let mut next: Vec<String> = Vec::new();
    for node_id in &current {
      for succ in graph.downstream(node_id) {
        let degree = in_degree.get_mut(succ).expect("downstream node tracked");
        *degree -= 1;
        if *degree == 0 {
          next.push(succ.clone());
        }
      }
    }
    next.sort();

    waves.push(std::mem::replace(&mut current, next));
  }

  if emitted != workflow.nodes.len() {
    return Err(PlanError::CycleDetected);
  }
  Ok(waves)
}

fn in_degrees(workflow: &WorkflowGraph) -> HashMap<String, usize> {
  let mut in_degree: HashMap<String, usize> = workflow
    .nodes
    .iter()
    .map(|n| (n.node_id.clone(), 0))
    .collect();
  for edge in &workflow.edges {
    if let Some(degree) = in_degree.get_mut(&edge.target_node_id) {
      *degree += 1;
    }
  }
  in_degree
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{EdgeSpec, NodeSpec};
  use serde_json::Value;

  fn node(id: &str) -> NodeSpec {
    NodeSpec {
      node_id: id.to_string(),
      component_type: "user_query".to_string(),
      config: Value::Null,
    }
  }

  fn edge(source: &str, target: &str) -> EdgeSpec {
    EdgeSpec {
      source_node_id: source.to_string(),
      source_handle: "default".to_string(),
      target_node_id: target.to_string(),
      target_handle: "input".to_string(),
    }
  }

  fn workflow(nodes: Vec<NodeSpec>, edges: Vec<EdgeSpec>) -> WorkflowGraph {
    WorkflowGraph {
      workflow_id: "wf".to_string(),
      name: "test".to_string(),
      nodes,
      edges,
    }
  }

  #[test]
  fn linear_chain_plans_in_dependency_order() {
    let wf = workflow(
      vec![node("out"), node("in"), node("fmt")],
      vec![edge("in", "fmt"), edge("fmt", "out")],
    );
    assert_eq!(plan(&wf).unwrap(), ["in", "fmt", "out"]);
  }

  #[test]
  fn ties_break_on_smallest_node_id() {
    // in fans out to c, a, b; all three become ready at once.
    let wf = workflow(
      vec![node("in"), node("c"), node("a"), node("b"), node("out")],
      vec![
        edge("in", "c"),
        edge("in", "a"),
        edge("in", "b"),
        edge("a", "out"),
        edge("b", "out"),
        edge("c", "out"),
      ],
    );
    assert_eq!(plan(&wf).unwrap(), ["in", "a", "b", "c", "out"]);
  }

  #[test]
  fn planning_is_deterministic() {
    let wf = workflow(
      vec![node("in"), node("b"), node("a"), node("merge")],
      vec![
        edge("in", "a"),
        edge("in", "b"),
        edge("a", "merge"),
        edge("b", "merge"),
      ],
    );
    assert_eq!(plan(&wf).unwrap(), plan(&wf).unwrap());
  }

  #[test]
  fn cycle_fails_planning() {
    let wf = workflow(vec![node("x"), node("y")], vec![edge("x", "y"), edge("y", "x")]);
    assert_eq!(plan(&wf).unwrap_err(), PlanError::CycleDetected);
    assert_eq!(waves(&wf).unwrap_err(), PlanError::CycleDetected);
  }

  #[test]
  fn diamond_groups_into_waves() {
    let wf = workflow(
      vec![node("in"), node("b"), node("a"), node("merge")],
      vec![
        edge("in", "a"),
        edge("in", "b"),
        edge("a", "merge"),
        edge("b", "merge"),
      ],
    );
    assert_eq!(
      waves(&wf).unwrap(),
      vec![
        vec!["in".to_string()],
        vec!["a".to_string(), "b".to_string()],
        vec!["merge".to_string()],
      ]
    );
  }

  #[test]
  fn waves_flatten_to_a_valid_topological_order() {
    let wf = workflow(
      vec![node("in"), node("a"), node("b"), node("merge"), node("out")],
      vec![
        edge("in", "a"),
        edge("in", "b"),
        edge("a", "merge"),
        edge("b", "merge"),
        edge("merge", "out"),
      ],
    );
    let flat: Vec<String> = waves(&wf).unwrap().into_iter().flatten().collect();
    assert_eq!(flat, plan(&wf).unwrap());
  }
}
