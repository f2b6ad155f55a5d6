//! Error taxonomy for workflow execution.

use flowrag_graph::{PlanError, ValidationError};
use thiserror::Error;

/// Errors that can occur during a workflow run.
///
/// These never cross the engine boundary as raised faults: the executor
/// converts every variant into a structured [`ExecutionResult`]
/// failure.
///
/// [`ExecutionResult`]: crate::ExecutionResult
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
  /// The graph failed structural validation. Detected before any
  /// component runs; never retried.
  #[error("invalid workflow: {0}")]
  Structural(#[from] ValidationError),

  /// Planning failed. Unreachable after validation, kept for robustness
  /// when the planner is invoked independently.
  #[error("planning failed: {0}")]
  Plan(#[from] PlanError),

  /// A component rejected its config at execution time. Non-retryable.
  #[error("invalid config for node '{node_id}': {message}")]
  Config { node_id: String, message: String },

  /// A component failed during execution, after any retries.
  #[error("node '{node_id}' failed: {message}")]
  Runtime { node_id: String, message: String },

  /// The run deadline passed while a node was outstanding.
  #[error("node '{node_id}' timed out")]
  Timeout { node_id: String },

  /// The run was cancelled by the caller.
  #[error("execution cancelled")]
  Cancelled,
}

impl ExecutionError {
  /// The node this error is attributed to, when there is one.
  pub fn node_id(&self) -> Option<&str> {
    match self {
      Self::Config { node_id, .. } | Self::Runtime { node_id, .. } | Self::Timeout { node_id } => {
        Some(node_id)
      }
      Self::Structural(_) | Self::Plan(_) | Self::Cancelled => None,
    }
  }
}
