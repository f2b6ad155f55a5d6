use async_trait::async_trait;
use serde_json::Value;

use crate::builtin::as_text;
use crate::component::{Component, ComponentError, DEFAULT_HANDLE, Inputs, Outputs, QUERY_KEY};

/// Entry component: passes the caller's query through to its default
/// output.
///
/// Config:
/// - `prefix` (optional string): prepended to the query.
pub struct UserQuery;

#[async_trait]
impl Component for UserQuery {
  async fn execute(&self, inputs: Inputs, config: &Value) -> Result<Outputs, ComponentError> {
    let query = inputs
      .get(QUERY_KEY)
      .map(as_text)
      .ok_or_else(|| ComponentError::fatal("no query was injected into the entry node"))?;

    let text = match config.get("prefix") {
      Some(Value::String(prefix)) => format!("{prefix}{query}"),
      Some(other) => {
        return Err(ComponentError::config(format!(
          "'prefix' must be a string, got {other}"
        )));
      }
      None => query,
    };

    let mut outputs = Outputs::new();
    outputs.insert(DEFAULT_HANDLE.to_string(), Value::String(text));
    Ok(outputs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn query_inputs(query: &str) -> Inputs {
    let mut inputs = Inputs::new();
    inputs.insert(QUERY_KEY.to_string(), json!(query));
    inputs
  }

  #[tokio::test]
  async fn passes_the_query_through() {
    let outputs = UserQuery
      .execute(query_inputs("2+2"), &Value::Null)
      .await
      .unwrap();
    assert_eq!(outputs[DEFAULT_HANDLE], json!("2+2"));
  }

  #[tokio::test]
  async fn applies_a_prefix() {
    let outputs = UserQuery
      .execute(query_inputs("2+2"), &json!({"prefix": "Q: "}))
      .await
      .unwrap();
    assert_eq!(outputs[DEFAULT_HANDLE], json!("Q: 2+2"));
  }

  #[tokio::test]
  async fn missing_query_is_fatal() {
    let err = UserQuery.execute(Inputs::new(), &Value::Null).await.unwrap_err();
    assert!(!err.is_retryable());
  }

  #[tokio::test]
  async fn non_string_prefix_is_a_config_error() {
    let err = UserQuery
      .execute(query_inputs("q"), &json!({"prefix": 3}))
      .await
      .unwrap_err();
    assert!(err.is_config());
  }
}
