//! End-to-end run of a realistic retrieval workflow using only the
//! built-in components.

use std::sync::Arc;

use flowrag_components::ComponentRegistry;
use flowrag_engine::Executor;
use flowrag_graph::{EdgeSpec, NodeSpec, ValidationReport, WorkflowGraph, validate};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn rag_workflow() -> WorkflowGraph {
  WorkflowGraph {
    workflow_id: "wf-rag".to_string(),
    name: "Docs Q&A".to_string(),
    nodes: vec![
      NodeSpec {
        node_id: "in".to_string(),
        component_type: "user_query".to_string(),
        config: json!({}),
      },
      NodeSpec {
        node_id: "kb".to_string(),
        component_type: "knowledgebase".to_string(),
        config: json!({
          "documents": [
            "The workflow engine executes components in dependency order.",
            "Cats are obligate carnivores.",
            "Validation rejects graphs with cycles.",
          ],
          "top_k": 1
        }),
      },
      NodeSpec {
        node_id: "llm".to_string(),
        component_type: "llm_engine".to_string(),
        config: json!({
          "prompt_template": "Context: {{ context }}\nQuestion: {{ question }}"
        }),
      },
      NodeSpec {
        node_id: "out".to_string(),
        component_type: "output".to_string(),
        config: json!({"template": "Answer: {response}"}),
      },
    ],
    edges: vec![
      EdgeSpec {
        source_node_id: "in".to_string(),
        source_handle: "default".to_string(),
        target_node_id: "kb".to_string(),
        target_handle: "input".to_string(),
      },
      EdgeSpec {
        source_node_id: "in".to_string(),
        source_handle: "default".to_string(),
        target_node_id: "llm".to_string(),
        target_handle: "question".to_string(),
      },
      EdgeSpec {
        source_node_id: "kb".to_string(),
        source_handle: "default".to_string(),
        target_node_id: "llm".to_string(),
        target_handle: "context".to_string(),
      },
      EdgeSpec {
        source_node_id: "llm".to_string(),
        source_handle: "default".to_string(),
        target_node_id: "out".to_string(),
        target_handle: "input".to_string(),
      },
    ],
  }
}

#[test]
fn rag_workflow_validates() {
  let registry = ComponentRegistry::builtin();
  let report = ValidationReport::from(validate(&rag_workflow(), &registry));
  assert!(report.valid, "unexpected error: {:?}", report.error);
}

#[tokio::test]
async fn rag_workflow_answers_with_retrieved_context() {
  let registry = Arc::new(ComponentRegistry::builtin());
  let executor = Executor::new(registry);

  let result = executor
    .run(
      &rag_workflow(),
      "how does validation handle cycles?",
      CancellationToken::new(),
    )
    .await;

  assert!(result.success, "unexpected failure: {:?}", result.error);
  let response = result.response.unwrap();
  assert!(response.starts_with("Answer: Context:"));
  assert!(response.contains("rejects graphs with cycles"));
  assert!(response.contains("Question: how does validation handle cycles?"));
  assert!(!response.contains("carnivores"));
}

#[tokio::test]
async fn misconfigured_retrieval_fails_as_a_config_error() {
  let registry = Arc::new(ComponentRegistry::builtin());
  let executor = Executor::new(registry);

  let mut wf = rag_workflow();
  wf.nodes[1].config = json!({});

  let result = executor.run(&wf, "anything", CancellationToken::new()).await;

  assert!(!result.success);
  let error = result.error.unwrap();
  assert!(error.contains("invalid config"), "unexpected error: {error}");
  assert!(error.contains("'kb'"));

  // Config errors are never retried.
  let metadata = result.metadata.unwrap();
  let kb_record = metadata.trace.iter().find(|r| r.node_id == "kb").unwrap();
  assert_eq!(kb_record.attempts, 1);
}
