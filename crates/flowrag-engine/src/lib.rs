//! Flowrag Engine
//!
//! The workflow execution engine: takes a caller-owned
//! [`WorkflowGraph`](flowrag_graph::WorkflowGraph) and a query string,
//! validates the graph, computes a deterministic evaluation order, runs
//! each component with the correct inputs, and produces a single
//! aggregated response plus execution metadata.
//!
//! # Architecture
//!
//! ```text
//! caller
//!   │  run(graph, query)
//!   ▼
//! Executor ── validate ──► flowrag-graph validator
//!   │        plan/waves ─► flowrag-graph planner
//!   │
//!   ├─ per node: gather inputs by edge handles,
//!   │            Component::execute via the registry,
//!   │            retry/backoff, deadline, cancellation
//!   │
//!   ├─ ExecutionContext   per-run output store
//!   ├─ ExecutionTrace     per-node records
//!   ▼
//! ExecutionResult { success, response | error, metadata }
//! ```
//!
//! Failure policy is atomic: the first node failure aborts the run, no
//! later node executes, and the trace of completed nodes is returned for
//! diagnostics. The engine persists nothing and owns no I/O of its own;
//! storage and the HTTP surface are external collaborators.

mod context;
mod error;
mod events;
mod executor;
mod result;
mod trace;

pub use context::ExecutionContext;
pub use error::ExecutionError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use executor::{ExecutionMode, Executor, RunOptions};
pub use result::{ExecutionResult, RunMetadata};
pub use trace::{ExecutionTrace, NodeRecord, NodeStatus};
