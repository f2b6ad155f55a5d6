use async_trait::async_trait;
use minijinja::Environment;
use serde_json::Value;
use tracing::debug;

use crate::builtin::{as_text, primary_input};
use crate::component::{Component, ComponentError, DEFAULT_HANDLE, Inputs, Outputs};

/// Prompt templating and model invocation.
///
/// Config:
/// - `prompt_template` (optional string): minijinja template rendered
///   against the input handles (each handle name is a template variable).
///   When absent, the primary input is used as the prompt verbatim.
/// - `canned_response` (optional string): returned instead of calling a
///   model. With no model backend configured the rendered prompt itself is
///   returned, which keeps workflows runnable offline.
/// - `simulate_failure` / `simulate_fatal` (optional bools): fail with a
///   retryable or fatal runtime error, for exercising failure paths.
pub struct LlmEngine;

#[async_trait]
impl Component for LlmEngine {
  async fn execute(&self, inputs: Inputs, config: &Value) -> Result<Outputs, ComponentError> {
    if config.get("simulate_failure").and_then(Value::as_bool) == Some(true) {
      return Err(ComponentError::retryable("simulated transient model failure"));
    }
    if config.get("simulate_fatal").and_then(Value::as_bool) == Some(true) {
      return Err(ComponentError::fatal("simulated fatal model failure"));
    }

    let prompt = match config.get("prompt_template") {
      Some(Value::String(template)) => render_template(template, &inputs)?,
      Some(other) => {
        return Err(ComponentError::config(format!(
          "'prompt_template' must be a string, got {other}"
        )));
      }
      None => as_text(primary_input(&inputs)?),
    };

    let response = match config.get("canned_response") {
      Some(Value::String(canned)) => canned.clone(),
      Some(other) => {
        return Err(ComponentError::config(format!(
          "'canned_response' must be a string, got {other}"
        )));
      }
      None => {
        debug!("no model backend configured, echoing rendered prompt");
        prompt
      }
    };

    let mut outputs = Outputs::new();
    outputs.insert(DEFAULT_HANDLE.to_string(), Value::String(response));
    Ok(outputs)
  }
}

fn render_template(template: &str, inputs: &Inputs) -> Result<String, ComponentError> {
  let env = Environment::new();
  env
    .render_str(template, inputs)
    .map_err(|e| ComponentError::config(format!("invalid prompt template: {e}")))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn handle(name: &str, value: &str) -> Inputs {
    let mut inputs = Inputs::new();
    inputs.insert(name.to_string(), json!(value));
    inputs
  }

  #[tokio::test]
  async fn renders_inputs_into_the_template() {
    let mut inputs = handle("context", "Rust is fast.");
    inputs.insert("question".to_string(), json!("Is Rust fast?"));

    let config = json!({
      "prompt_template": "Context: {{ context }}\nQuestion: {{ question }}"
    });

    let outputs = LlmEngine.execute(inputs, &config).await.unwrap();
    assert_eq!(
      outputs[DEFAULT_HANDLE],
      json!("Context: Rust is fast.\nQuestion: Is Rust fast?")
    );
  }

  #[tokio::test]
  async fn canned_response_wins_over_the_prompt() {
    let config = json!({"canned_response": "42"});
    let outputs = LlmEngine
      .execute(handle("input", "whatever"), &config)
      .await
      .unwrap();
    assert_eq!(outputs[DEFAULT_HANDLE], json!("42"));
  }

  #[tokio::test]
  async fn without_a_template_the_primary_input_is_the_prompt() {
    let outputs = LlmEngine
      .execute(handle("input", "plain prompt"), &Value::Null)
      .await
      .unwrap();
    assert_eq!(outputs[DEFAULT_HANDLE], json!("plain prompt"));
  }

  #[tokio::test]
  async fn malformed_template_is_a_config_error() {
    let config = json!({"prompt_template": "{{ unclosed"});
    let err = LlmEngine
      .execute(handle("input", "q"), &config)
      .await
      .unwrap_err();
    assert!(err.is_config());
  }

  #[tokio::test]
  async fn simulated_failure_is_retryable() {
    let err = LlmEngine
      .execute(handle("input", "q"), &json!({"simulate_failure": true}))
      .await
      .unwrap_err();
    assert!(err.is_retryable());
  }

  #[tokio::test]
  async fn simulated_fatal_is_not_retryable() {
    let err = LlmEngine
      .execute(handle("input", "q"), &json!({"simulate_fatal": true}))
      .await
      .unwrap_err();
    assert!(!err.is_retryable());
  }
}
