//! Flowrag Components
//!
//! The execution contract between the engine and the units of work it
//! runs. A component receives a map of named input handles, interprets its
//! own config, and produces a map of named output handles. The registry
//! maps a component-type tag to an implementation; it is populated once at
//! startup and immutable afterwards.
//!
//! The built-in set mirrors the builder palette: `user_query`,
//! `knowledgebase`, `llm_engine`, `output`. All built-ins are
//! deterministic and offline so workflows can be executed and tested
//! without external credentials; real model or index backends plug in
//! through the same [`Component`] trait.

mod builtin;
mod component;
mod registry;

pub use builtin::{Knowledgebase, LlmEngine, Output, UserQuery};
pub use component::{Component, ComponentError, DEFAULT_HANDLE, Inputs, Outputs, QUERY_KEY};
pub use registry::{ComponentRegistry, RegistryBuilder};
