//! Run results and trace-derived metadata assembly.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::trace::{ExecutionTrace, NodeRecord};

/// Trace-derived summary handed back with every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
  pub execution_id: String,
  pub total_duration_ms: u64,
  /// Per-node records in execution order.
  pub trace: Vec<NodeRecord>,
  /// Compact per-node outputs for debugging; successful runs only.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub intermediate_outputs: Option<BTreeMap<String, Value>>,
}

impl RunMetadata {
  /// Assemble metadata from a finished run.
  ///
  /// `context` is provided only for successful runs; failed runs keep the
  /// trace for diagnostics but drop intermediate outputs.
  pub(crate) fn assemble(
    execution_id: String,
    total: Duration,
    trace: ExecutionTrace,
    context: Option<&ExecutionContext>,
  ) -> Self {
    let intermediate_outputs = context.map(|ctx| {
      ctx
        .outputs()
        .iter()
        .map(|(node_id, outputs)| (node_id.clone(), compact(outputs)))
        .collect()
    });

    Self {
      execution_id,
      total_duration_ms: total.as_millis() as u64,
      trace: trace.into_records(),
      intermediate_outputs,
    }
  }
}

/// A sole-handle output collapses to its value; multi-handle outputs keep
/// the handle map.
fn compact(outputs: &flowrag_components::Outputs) -> Value {
  if outputs.len() == 1 {
    outputs.values().next().cloned().unwrap_or(Value::Null)
  } else {
    Value::Object(
      outputs
        .iter()
        .map(|(handle, value)| (handle.clone(), value.clone()))
        .collect(),
    )
  }
}

/// Terminal value of a run: success with a response, or failure with an
/// error description. Never both. Every run produces one of these; the
/// engine never lets an error escape as a raised fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub response: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub metadata: Option<RunMetadata>,
}

impl ExecutionResult {
  pub(crate) fn succeeded(response: String, metadata: RunMetadata) -> Self {
    Self {
      success: true,
      response: Some(response),
      error: None,
      metadata: Some(metadata),
    }
  }

  pub(crate) fn failed(error: String, metadata: Option<RunMetadata>) -> Self {
    Self {
      success: false,
      response: None,
      error: Some(error),
      metadata,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::trace::NodeStatus;
  use flowrag_components::Outputs;
  use serde_json::json;

  #[test]
  fn success_and_failure_are_mutually_exclusive() {
    let meta = RunMetadata::assemble(
      "exec".to_string(),
      Duration::from_millis(10),
      ExecutionTrace::new(),
      None,
    );
    let ok = ExecutionResult::succeeded("hi".to_string(), meta);
    assert!(ok.success && ok.response.is_some() && ok.error.is_none());

    let bad = ExecutionResult::failed("boom".to_string(), None);
    assert!(!bad.success && bad.response.is_none() && bad.error.is_some());
  }

  #[test]
  fn intermediate_outputs_collapse_sole_handles() {
    let mut ctx = ExecutionContext::new();
    let mut sole = Outputs::new();
    sole.insert("default".to_string(), json!("value"));
    ctx.insert("in", sole);

    let mut multi = Outputs::new();
    multi.insert("a".to_string(), json!(1));
    multi.insert("b".to_string(), json!(2));
    ctx.insert("fan", multi);

    let mut trace = ExecutionTrace::new();
    trace.record("in", NodeStatus::Succeeded, Duration::from_millis(1), 1);

    let meta = RunMetadata::assemble(
      "exec".to_string(),
      Duration::from_millis(3),
      trace,
      Some(&ctx),
    );

    let outputs = meta.intermediate_outputs.unwrap();
    assert_eq!(outputs["in"], json!("value"));
    assert_eq!(outputs["fan"], json!({"a": 1, "b": 2}));
  }

  #[test]
  fn failed_runs_keep_the_trace_without_outputs() {
    let mut trace = ExecutionTrace::new();
    trace.record(
      "llm",
      NodeStatus::Failed {
        error: "down".to_string(),
      },
      Duration::from_millis(2),
      1,
    );
    let meta = RunMetadata::assemble(
      "exec".to_string(),
      Duration::from_millis(2),
      trace,
      None,
    );
    assert_eq!(meta.trace.len(), 1);
    assert!(meta.intermediate_outputs.is_none());
  }
}
