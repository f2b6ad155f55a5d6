//! Execution events and notifiers for observability.
//!
//! The engine emits events as a run progresses so callers can persist
//! them, stream them to a UI, or ignore them entirely.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutionEvent {
  RunStarted {
    execution_id: String,
    workflow_id: String,
  },

  NodeStarted {
    execution_id: String,
    node_id: String,
  },

  NodeCompleted {
    execution_id: String,
    node_id: String,
  },

  NodeFailed {
    execution_id: String,
    node_id: String,
    error: String,
  },

  RunCompleted {
    execution_id: String,
  },

  RunFailed {
    execution_id: String,
    error: String,
  },
}

/// Receives execution events.
///
/// The executor calls `notify` for each event; implementations decide what
/// to do with them.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards all events. Useful for tests and callers that only want the
/// final result.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel.
///
/// Unbounded so a slow consumer never stalls the run; event volume is a
/// handful per node, so growth stays small in practice.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // The receiver may already be gone; that's fine.
    let _ = self.sender.send(event);
  }
}
