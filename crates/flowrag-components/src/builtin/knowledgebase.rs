use async_trait::async_trait;
use serde_json::Value;

use crate::builtin::{as_text, primary_input};
use crate::component::{Component, ComponentError, DEFAULT_HANDLE, Inputs, Outputs};

const DEFAULT_TOP_K: usize = 3;

/// Keyword retrieval over a config-supplied document set.
///
/// Config:
/// - `documents` (required array of strings): the corpus to search.
/// - `top_k` (optional integer, default 3): how many matches to return.
///
/// Scores each document by the number of query terms it contains and emits
/// the best matches joined into a single context string. A stand-in for a
/// vector index; real backends implement [`Component`] themselves.
pub struct Knowledgebase;

#[async_trait]
impl Component for Knowledgebase {
  async fn execute(&self, inputs: Inputs, config: &Value) -> Result<Outputs, ComponentError> {
    let documents = parse_documents(config)?;
    let top_k = parse_top_k(config)?;

    let query = as_text(primary_input(&inputs)?);
    let terms: Vec<String> = query
      .to_lowercase()
      .split_whitespace()
      .map(str::to_string)
      .collect();

    let mut scored: Vec<(usize, &str)> = documents
      .iter()
      .map(|doc| {
        let lower = doc.to_lowercase();
        let score = terms.iter().filter(|t| lower.contains(t.as_str())).count();
        (score, *doc)
      })
      .filter(|(score, _)| *score > 0)
      .collect();

    // Stable sort keeps corpus order among equally scored documents.
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let context = scored
      .iter()
      .take(top_k)
      .map(|(_, doc)| *doc)
      .collect::<Vec<_>>()
      .join("\n\n");

    let mut outputs = Outputs::new();
    outputs.insert(DEFAULT_HANDLE.to_string(), Value::String(context));
    Ok(outputs)
  }
}

fn parse_documents(config: &Value) -> Result<Vec<&str>, ComponentError> {
  let documents = config
    .get("documents")
    .and_then(Value::as_array)
    .ok_or_else(|| ComponentError::config("'documents' must be an array of strings"))?;

  if documents.is_empty() {
    return Err(ComponentError::config("'documents' must not be empty"));
  }

  documents
    .iter()
    .map(|d| {
      d.as_str()
        .ok_or_else(|| ComponentError::config("'documents' entries must be strings"))
    })
    .collect()
}

fn parse_top_k(config: &Value) -> Result<usize, ComponentError> {
  match config.get("top_k") {
    None => Ok(DEFAULT_TOP_K),
    Some(value) => value
      .as_u64()
      .filter(|k| *k > 0)
      .map(|k| k as usize)
      .ok_or_else(|| ComponentError::config("'top_k' must be a positive integer")),
  }
}
