//! Workflow executor.
//!
//! Orchestrates a run: validate, plan, execute each node with the correct
//! inputs, assemble the final result. The executor never lets an error
//! escape as a raised fault; every run yields an [`ExecutionResult`].

use std::sync::Arc;
use std::time::Duration;

use flowrag_components::{
  ComponentError, ComponentRegistry, DEFAULT_HANDLE, Inputs, Outputs, QUERY_KEY,
};
use flowrag_graph::{NodeSpec, WorkflowGraph, plan, validate, waves};
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::context::ExecutionContext;
use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::result::{ExecutionResult, RunMetadata};
use crate::trace::{ExecutionTrace, NodeStatus};

/// How nodes are scheduled within a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ExecutionMode {
  /// Strict plan order, one node at a time. Deterministic traces.
  #[default]
  Sequential,
  /// Nodes of the same dependency wave run concurrently. Ordering is
  /// guaranteed only for dependent pairs.
  Parallel,
}

/// Per-run execution settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
  /// Deadline for the whole run. Component calls still outstanding when
  /// it passes become a timeout failure for the owning node.
  pub timeout: Option<Duration>,
  /// Extra attempts for retryable component failures.
  pub max_retry_attempts: u32,
  /// Backoff before the first retry; doubles per attempt.
  pub retry_base_delay: Duration,
  pub mode: ExecutionMode,
}

impl Default for RunOptions {
  fn default() -> Self {
    Self {
      timeout: None,
      max_retry_attempts: 2,
      retry_base_delay: Duration::from_millis(50),
      mode: ExecutionMode::Sequential,
    }
  }
}

/// The workflow execution engine.
///
/// Holds the immutable component registry and per-run options; each call
/// to [`Executor::run`] owns its own context and trace, so one executor
/// serves concurrent runs.
pub struct Executor<N: ExecutionNotifier = NoopNotifier> {
  registry: Arc<ComponentRegistry>,
  options: RunOptions,
  notifier: N,
}

impl Executor<NoopNotifier> {
  /// An executor with default options and no event observation.
  pub fn new(registry: Arc<ComponentRegistry>) -> Self {
    Self::with_options(registry, RunOptions::default())
  }

  pub fn with_options(registry: Arc<ComponentRegistry>, options: RunOptions) -> Self {
    Self {
      registry,
      options,
      notifier: NoopNotifier,
    }
  }
}

impl<N: ExecutionNotifier> Executor<N> {
  pub fn with_notifier(registry: Arc<ComponentRegistry>, options: RunOptions, notifier: N) -> Self {
    Self {
      registry,
      options,
      notifier,
    }
  }

  /// Run a query through a workflow graph.
  ///
  /// The graph is read-only to the engine; the query lands on the entry
  /// node under the reserved `__query__` handle. On the first node
  /// failure the run aborts and no later node executes, but the trace of
  /// completed nodes is preserved in the result metadata.
  #[instrument(
    name = "workflow_run",
    skip(self, workflow, query, cancel),
    fields(workflow_id = %workflow.workflow_id)
  )]
  pub async fn run(
    &self,
    workflow: &WorkflowGraph,
    query: &str,
    cancel: CancellationToken,
  ) -> ExecutionResult {
    let execution_id = Uuid::new_v4().to_string();
    let started = Instant::now();
    let deadline = self.options.timeout.map(|t| started + t);

    info!(execution_id = %execution_id, "run_started");
    self.notifier.notify(ExecutionEvent::RunStarted {
      execution_id: execution_id.clone(),
      workflow_id: workflow.workflow_id.clone(),
    });

    let mut trace = ExecutionTrace::new();
    let mut context = ExecutionContext::new();

    let outcome = self
      .run_inner(
        workflow,
        query,
        deadline,
        &cancel,
        &execution_id,
        &mut trace,
        &mut context,
      )
      .await;

    let total = started.elapsed();
    match outcome {
      Ok(response) => {
        info!(
          execution_id = %execution_id,
          total_ms = total.as_millis() as u64,
          "run_completed"
        );
        self.notifier.notify(ExecutionEvent::RunCompleted {
          execution_id: execution_id.clone(),
        });
        let metadata = RunMetadata::assemble(execution_id, total, trace, Some(&context));
        ExecutionResult::succeeded(response, metadata)
      }
      Err(e) => {
        error!(execution_id = %execution_id, error = %e, "run_failed");
        self.notifier.notify(ExecutionEvent::RunFailed {
          execution_id: execution_id.clone(),
          error: e.to_string(),
        });
        let metadata = RunMetadata::assemble(execution_id, total, trace, None);
        ExecutionResult::failed(e.to_string(), Some(metadata))
      }
    }
  }

  #[allow(clippy::too_many_arguments)]
  async fn run_inner(
    &self,
    workflow: &WorkflowGraph,
    query: &str,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
    execution_id: &str,
    trace: &mut ExecutionTrace,
    context: &mut ExecutionContext,
  ) -> Result<String, ExecutionError> {
    validate(workflow, self.registry.as_ref())?;

    let graph = workflow.graph();
    // Validation guarantees exactly one of each.
    let entry_id = graph.entry_points()[0].clone();
    let terminal_id = graph.terminal_points()[0].clone();

    match self.options.mode {
      ExecutionMode::Sequential => {
        for node_id in plan(workflow)? {
          self
            .run_node(
              workflow,
              &node_id,
              &entry_id,
              query,
              deadline,
              cancel,
              execution_id,
              trace,
              context,
            )
            .await?;
        }
      }
      ExecutionMode::Parallel => {
        for wave in waves(workflow)? {
          self
            .run_wave(
              workflow,
              &wave,
              &entry_id,
              query,
              deadline,
              cancel,
              execution_id,
              trace,
              context,
            )
            .await?;
        }
      }
    }

    let response = context
      .output(&terminal_id, DEFAULT_HANDLE)
      .map(value_to_text)
      .ok_or_else(|| ExecutionError::Runtime {
        node_id: terminal_id.clone(),
        message: "terminal node produced no default output".to_string(),
      })?;
    Ok(response)
  }

  /// Execute one node in the sequential path.
  #[allow(clippy::too_many_arguments)]
  async fn run_node(
    &self,
    workflow: &WorkflowGraph,
    node_id: &str,
    entry_id: &str,
    query: &str,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
    execution_id: &str,
    trace: &mut ExecutionTrace,
    context: &mut ExecutionContext,
  ) -> Result<(), ExecutionError> {
    if cancel.is_cancelled() {
      return Err(ExecutionError::Cancelled);
    }

    let node = lookup_node(workflow, node_id)?;
    let inputs = gather_inputs(workflow, node_id, entry_id, query, context)?;

    info!(execution_id = %execution_id, node_id = %node_id, "node_started");
    self.notifier.notify(ExecutionEvent::NodeStarted {
      execution_id: execution_id.to_string(),
      node_id: node_id.to_string(),
    });

    let started = Instant::now();
    let (attempts, result) = self.execute_with_retry(node, inputs, deadline, cancel).await;
    let elapsed = started.elapsed();

    match result {
      Ok(outputs) => {
        info!(
          execution_id = %execution_id,
          node_id = %node_id,
          duration_ms = elapsed.as_millis() as u64,
          attempts,
          "node_completed"
        );
        trace.record(node_id, NodeStatus::Succeeded, elapsed, attempts);
        context.insert(node_id, outputs);
        self.notifier.notify(ExecutionEvent::NodeCompleted {
          execution_id: execution_id.to_string(),
          node_id: node_id.to_string(),
        });
        Ok(())
      }
      Err(e) => {
        error!(
          execution_id = %execution_id,
          node_id = %node_id,
          error = %e,
          attempts,
          "node_failed"
        );
        trace.record(node_id, failure_status(&e), elapsed, attempts);
        self.notifier.notify(ExecutionEvent::NodeFailed {
          execution_id: execution_id.to_string(),
          node_id: node_id.to_string(),
          error: e.to_string(),
        });
        Err(e)
      }
    }
  }

  /// Execute one dependency wave concurrently.
  ///
  /// All results of the wave are recorded before the run aborts, so the
  /// trace accounts for every node that actually started.
  #[allow(clippy::too_many_arguments)]
  async fn run_wave(
    &self,
    workflow: &WorkflowGraph,
    wave: &[String],
    entry_id: &str,
    query: &str,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
    execution_id: &str,
    trace: &mut ExecutionTrace,
    context: &mut ExecutionContext,
  ) -> Result<(), ExecutionError> {
    if cancel.is_cancelled() {
      return Err(ExecutionError::Cancelled);
    }

    let mut prepared = Vec::with_capacity(wave.len());
    for node_id in wave {
      let node = lookup_node(workflow, node_id)?;
      let inputs = gather_inputs(workflow, node_id, entry_id, query, context)?;
      info!(execution_id = %execution_id, node_id = %node_id, "node_started");
      self.notifier.notify(ExecutionEvent::NodeStarted {
        execution_id: execution_id.to_string(),
        node_id: node_id.to_string(),
      });
      prepared.push((node, inputs));
    }

    let tasks = prepared.into_iter().map(|(node, inputs)| {
      let cancel = cancel.clone();
      async move {
        let started = Instant::now();
        let (attempts, result) = self.execute_with_retry(node, inputs, deadline, &cancel).await;
        (node.node_id.as_str(), started.elapsed(), attempts, result)
      }
    });

    let results = futures::future::join_all(tasks).await;

    let mut first_error = None;
    for (node_id, elapsed, attempts, result) in results {
      match result {
        Ok(outputs) => {
          info!(
            execution_id = %execution_id,
            node_id = %node_id,
            duration_ms = elapsed.as_millis() as u64,
            attempts,
            "node_completed"
          );
          trace.record(node_id, NodeStatus::Succeeded, elapsed, attempts);
          context.insert(node_id, outputs);
          self.notifier.notify(ExecutionEvent::NodeCompleted {
            execution_id: execution_id.to_string(),
            node_id: node_id.to_string(),
          });
        }
        Err(e) => {
          error!(
            execution_id = %execution_id,
            node_id = %node_id,
            error = %e,
            attempts,
            "node_failed"
          );
          trace.record(node_id, failure_status(&e), elapsed, attempts);
          self.notifier.notify(ExecutionEvent::NodeFailed {
            execution_id: execution_id.to_string(),
            node_id: node_id.to_string(),
            error: e.to_string(),
          });
          first_error.get_or_insert(e);
        }
      }
    }

    match first_error {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }

  /// Run a component with bounded exponential backoff on retryable
  /// failures. Returns the attempt count alongside the outcome.
  async fn execute_with_retry(
    &self,
    node: &NodeSpec,
    inputs: Inputs,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
  ) -> (u32, Result<Outputs, ExecutionError>) {
    let node_id = node.node_id.as_str();
    let Some(component) = self.registry.get(&node.component_type) else {
      // Validation already checked this; defend anyway for direct callers.
      return (
        0,
        Err(ExecutionError::Runtime {
          node_id: node_id.to_string(),
          message: format!("no component registered for type '{}'", node.component_type),
        }),
      );
    };

    let mut attempt: u32 = 0;
    loop {
      attempt += 1;

      let outcome = {
        let fut = component.execute(inputs.clone(), &node.config);
        tokio::pin!(fut);
        bounded(node_id, &mut fut, deadline, cancel).await
      };

      match outcome {
        Err(e) => return (attempt, Err(e)),
        Ok(Ok(outputs)) => return (attempt, Ok(outputs)),
        Ok(Err(e)) if e.is_retryable() && attempt <= self.options.max_retry_attempts => {
          let delay = self.options.retry_base_delay * 2u32.pow(attempt - 1);
          warn!(
            node_id = %node_id,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %e,
            "retrying node after transient failure"
          );
          let backoff = tokio::time::sleep(delay);
          tokio::pin!(backoff);
          if let Err(e) = bounded(node_id, &mut backoff, deadline, cancel).await {
            return (attempt, Err(e));
          }
        }
        Ok(Err(e)) => return (attempt, Err(component_failure(node_id, e))),
      }
    }
  }
}

/// Await a future while racing the run deadline and cancellation.
async fn bounded<F>(
  node_id: &str,
  fut: &mut std::pin::Pin<&mut F>,
  deadline: Option<Instant>,
  cancel: &CancellationToken,
) -> Result<F::Output, ExecutionError>
where
  F: Future,
{
  match deadline {
    Some(deadline) => {
      tokio::select! {
        _ = cancel.cancelled() => Err(ExecutionError::Cancelled),
        _ = tokio::time::sleep_until(deadline) => Err(ExecutionError::Timeout {
          node_id: node_id.to_string(),
        }),
        output = fut => Ok(output),
      }
    }
    None => {
      tokio::select! {
        _ = cancel.cancelled() => Err(ExecutionError::Cancelled),
        output = fut => Ok(output),
      }
    }
  }
}

fn lookup_node<'a>(
  workflow: &'a WorkflowGraph,
  node_id: &str,
) -> Result<&'a NodeSpec, ExecutionError> {
  workflow.get_node(node_id).ok_or_else(|| ExecutionError::Runtime {
    node_id: node_id.to_string(),
    message: "planned node missing from graph".to_string(),
  })
}

/// Assemble a node's input map: one entry per incoming edge, read from the
/// producer's stored output at `source_handle` and placed under
/// `target_handle`; the entry node additionally receives the query.
fn gather_inputs(
  workflow: &WorkflowGraph,
  node_id: &str,
  entry_id: &str,
  query: &str,
  context: &ExecutionContext,
) -> Result<Inputs, ExecutionError> {
  let mut inputs = Inputs::new();
  for edge in workflow.incoming_edges(node_id) {
    let value = context
      .output(&edge.source_node_id, &edge.source_handle)
      .cloned()
      .ok_or_else(|| ExecutionError::Runtime {
        node_id: node_id.to_string(),
        message: format!(
          "missing output '{}' from upstream node '{}'",
          edge.source_handle, edge.source_node_id
        ),
      })?;
    inputs.insert(edge.target_handle.clone(), value);
  }
  if node_id == entry_id {
    inputs.insert(QUERY_KEY.to_string(), Value::String(query.to_string()));
  }
  Ok(inputs)
}

fn component_failure(node_id: &str, error: ComponentError) -> ExecutionError {
  match error {
    ComponentError::Config { message } => ExecutionError::Config {
      node_id: node_id.to_string(),
      message,
    },
    ComponentError::Runtime { message, .. } => ExecutionError::Runtime {
      node_id: node_id.to_string(),
      message,
    },
  }
}

fn failure_status(error: &ExecutionError) -> NodeStatus {
  match error {
    ExecutionError::Timeout { .. } => NodeStatus::TimedOut,
    other => NodeStatus::Failed {
      error: other.to_string(),
    },
  }
}

fn value_to_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}
