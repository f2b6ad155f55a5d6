use async_trait::async_trait;
use serde_json::Value;

use crate::builtin::{as_text, primary_input};
use crate::component::{Component, ComponentError, DEFAULT_HANDLE, Inputs, Outputs};

/// Terminal component: formats the final response.
///
/// Config:
/// - `template` (optional string): a `{response}` placeholder is replaced
///   with the incoming value; without a template the value passes through.
pub struct Output;

#[async_trait]
impl Component for Output {
  async fn execute(&self, inputs: Inputs, config: &Value) -> Result<Outputs, ComponentError> {
    let response = as_text(primary_input(&inputs)?);

    let text = match config.get("template") {
      Some(Value::String(template)) => template.replace("{response}", &response),
      Some(other) => {
        return Err(ComponentError::config(format!(
          "'template' must be a string, got {other}"
        )));
      }
      None => response,
    };

    let mut outputs = Outputs::new();
    outputs.insert(DEFAULT_HANDLE.to_string(), Value::String(text));
    Ok(outputs)
  }
}
