//! Flowrag Graph
//!
//! This crate provides the workflow graph representation for flowrag.
//! A workflow is a directed acyclic graph of components: query input,
//! retrieval, prompt/model invocation, output formatting. The graph is
//! built once per run from caller-supplied data and is read-only to the
//! execution engine.
//!
//! Responsibilities:
//! - Graph model types ([`WorkflowGraph`], [`NodeSpec`], [`EdgeSpec`])
//! - Structural validation ([`validate`]) against a [`ComponentCatalog`]
//! - Deterministic execution planning ([`plan`], [`waves`])

mod graph;
mod model;
mod plan;
mod validate;

pub use graph::Graph;
pub use model::{DEFAULT_SOURCE_HANDLE, DEFAULT_TARGET_HANDLE, EdgeSpec, NodeSpec, WorkflowGraph};
pub use plan::{PlanError, plan, waves};
pub use validate::{ComponentCatalog, ValidationError, ValidationReport, validate};
