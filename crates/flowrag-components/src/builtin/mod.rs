//! Built-in components mirroring the builder palette.

mod knowledgebase;
mod llm_engine;
mod output;
mod user_query;

pub use knowledgebase::Knowledgebase;
pub use llm_engine::LlmEngine;
pub use output::Output;
pub use user_query::UserQuery;

use flowrag_graph::DEFAULT_TARGET_HANDLE;
use serde_json::Value;

use crate::component::{ComponentError, Inputs, QUERY_KEY};

/// Render a handle value as text: strings verbatim, everything else as
/// compact JSON.
pub(crate) fn as_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// The value a single-input component should operate on: the default input
/// handle if wired, otherwise the injected query, otherwise a sole input.
pub(crate) fn primary_input(inputs: &Inputs) -> Result<&Value, ComponentError> {
  if let Some(value) = inputs.get(DEFAULT_TARGET_HANDLE) {
    return Ok(value);
  }
  if let Some(value) = inputs.get(QUERY_KEY) {
    return Ok(value);
  }
  if inputs.len() == 1 {
    return Ok(inputs.values().next().unwrap());
  }
  Err(ComponentError::fatal(format!(
    "expected an '{DEFAULT_TARGET_HANDLE}' handle, got {} inputs",
    inputs.len()
  )))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn as_text_keeps_strings_verbatim() {
    assert_eq!(as_text(&json!("hello")), "hello");
    assert_eq!(as_text(&json!({"k": 1})), r#"{"k":1}"#);
  }

  #[test]
  fn primary_input_prefers_the_default_handle() {
    let mut inputs = Inputs::new();
    inputs.insert("input".to_string(), json!("wired"));
    inputs.insert(QUERY_KEY.to_string(), json!("query"));
    assert_eq!(primary_input(&inputs).unwrap(), &json!("wired"));
  }

  #[test]
  fn primary_input_accepts_a_sole_handle() {
    let mut inputs = Inputs::new();
    inputs.insert("context".to_string(), json!("doc"));
    assert_eq!(primary_input(&inputs).unwrap(), &json!("doc"));
  }

  #[test]
  fn primary_input_rejects_ambiguous_handles() {
    let mut inputs = Inputs::new();
    inputs.insert("a".to_string(), json!(1));
    inputs.insert("b".to_string(), json!(2));
    assert!(primary_input(&inputs).is_err());
  }
}
