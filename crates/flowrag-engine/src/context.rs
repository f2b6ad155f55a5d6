use std::collections::HashMap;

use flowrag_components::{DEFAULT_HANDLE, Outputs};

/// Per-run store of produced outputs, keyed by node id.
///
/// Owned by exactly one run; discarded (or folded into result metadata)
/// when the run ends. Nothing is shared across concurrent runs.
#[derive(Debug, Default)]
pub struct ExecutionContext {
  outputs: HashMap<String, Outputs>,
}

impl ExecutionContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// Store a node's output handles.
  pub fn insert(&mut self, node_id: impl Into<String>, outputs: Outputs) {
    self.outputs.insert(node_id.into(), outputs);
  }

  pub fn contains(&self, node_id: &str) -> bool {
    self.outputs.contains_key(node_id)
  }

  /// Read one output handle of a producer node.
  ///
  /// A `default` lookup falls back to a sole output handle, so components
  /// that emit one named handle still wire up through unnamed edges.
  pub fn output(&self, node_id: &str, handle: &str) -> Option<&serde_json::Value> {
    let outputs = self.outputs.get(node_id)?;
    if let Some(value) = outputs.get(handle) {
      return Some(value);
    }
    if handle == DEFAULT_HANDLE && outputs.len() == 1 {
      return outputs.values().next();
    }
    None
  }

  /// All stored outputs, for result aggregation.
  pub fn outputs(&self) -> &HashMap<String, Outputs> {
    &self.outputs
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn stores_and_reads_handles() {
    let mut ctx = ExecutionContext::new();
    let mut outputs = Outputs::new();
    outputs.insert("default".to_string(), json!("value"));
    ctx.insert("node", outputs);

    assert!(ctx.contains("node"));
    assert_eq!(ctx.output("node", "default"), Some(&json!("value")));
    assert_eq!(ctx.output("node", "other"), None);
    assert_eq!(ctx.output("missing", "default"), None);
  }

  #[test]
  fn default_lookup_falls_back_to_a_sole_handle() {
    let mut ctx = ExecutionContext::new();
    let mut outputs = Outputs::new();
    outputs.insert("context".to_string(), json!("doc"));
    ctx.insert("kb", outputs);

    assert_eq!(ctx.output("kb", "default"), Some(&json!("doc")));
    assert_eq!(ctx.output("kb", "context"), Some(&json!("doc")));
  }

  #[test]
  fn no_fallback_when_multiple_handles_exist() {
    let mut ctx = ExecutionContext::new();
    let mut outputs = Outputs::new();
    outputs.insert("a".to_string(), json!(1));
    outputs.insert("b".to_string(), json!(2));
    ctx.insert("node", outputs);

    assert_eq!(ctx.output("node", "default"), None);
  }
}
