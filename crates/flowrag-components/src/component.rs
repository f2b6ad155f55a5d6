use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Reserved input handle carrying the caller-supplied query string.
///
/// Injected by the executor on the entry node only; never read from an
/// edge.
pub const QUERY_KEY: &str = "__query__";

/// Output handle components write to unless they declare otherwise.
pub const DEFAULT_HANDLE: &str = "default";

/// Input handles, keyed by handle name.
pub type Inputs = HashMap<String, serde_json::Value>;

/// Output handles, keyed by handle name.
pub type Outputs = HashMap<String, serde_json::Value>;

/// Errors a component can surface to the executor.
///
/// The classification drives retry behavior: config errors and fatal
/// runtime errors abort the run immediately, retryable runtime errors are
/// retried with bounded backoff before being surfaced as fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComponentError {
  /// The component rejected its config. Never retried.
  #[error("invalid config: {message}")]
  Config { message: String },

  /// The component failed during execution.
  #[error("{message}")]
  Runtime { message: String, retryable: bool },
}

impl ComponentError {
  pub fn config(message: impl Into<String>) -> Self {
    Self::Config {
      message: message.into(),
    }
  }

  /// A fatal runtime failure.
  pub fn fatal(message: impl Into<String>) -> Self {
    Self::Runtime {
      message: message.into(),
      retryable: false,
    }
  }

  /// A transient runtime failure (e.g. an unreachable external
  /// dependency) that may succeed on retry.
  pub fn retryable(message: impl Into<String>) -> Self {
    Self::Runtime {
      message: message.into(),
      retryable: true,
    }
  }

  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::Runtime { retryable: true, .. })
  }

  pub fn is_config(&self) -> bool {
    matches!(self, Self::Config { .. })
  }
}

/// A runnable unit of work in a workflow graph.
///
/// Implementations may perform blocking I/O (model calls, index queries);
/// the executor bounds them with the per-run deadline and cancellation.
#[async_trait]
pub trait Component: Send + Sync {
  /// Execute with the assembled inputs and this node's config.
  async fn execute(
    &self,
    inputs: Inputs,
    config: &serde_json::Value,
  ) -> Result<Outputs, ComponentError>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn retryability_classification() {
    assert!(ComponentError::retryable("connection reset").is_retryable());
    assert!(!ComponentError::fatal("bad request").is_retryable());
    assert!(!ComponentError::config("missing field").is_retryable());
    assert!(ComponentError::config("missing field").is_config());
  }
}
