use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Terminal state of one node execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeStatus {
  Succeeded,
  Failed { error: String },
  TimedOut,
}

/// One per-node record in the execution trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
  pub node_id: String,
  #[serde(flatten)]
  pub status: NodeStatus,
  pub duration_ms: u64,
  /// How many attempts were made, including retries.
  pub attempts: u32,
}

impl NodeRecord {
  pub fn is_success(&self) -> bool {
    matches!(self.status, NodeStatus::Succeeded)
  }
}

/// Ordered per-node execution log, owned by one run.
///
/// Append-only while the run progresses; handed back as metadata
/// afterwards. On failure the records of completed nodes are preserved for
/// diagnostics.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ExecutionTrace {
  records: Vec<NodeRecord>,
}

impl ExecutionTrace {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record(&mut self, node_id: impl Into<String>, status: NodeStatus, duration: Duration, attempts: u32) {
    self.records.push(NodeRecord {
      node_id: node_id.into(),
      status,
      duration_ms: duration.as_millis() as u64,
      attempts,
    });
  }

  pub fn records(&self) -> &[NodeRecord] {
    &self.records
  }

  /// Whether a node appears in the trace at all.
  pub fn executed(&self, node_id: &str) -> bool {
    self.records.iter().any(|r| r.node_id == node_id)
  }

  pub fn into_records(self) -> Vec<NodeRecord> {
    self.records
  }
}
