use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use flowrag_components::ComponentRegistry;
use flowrag_engine::{ExecutionMode, Executor, RunOptions};
use flowrag_graph::{ValidationReport, WorkflowGraph, validate};

/// Flowrag - run chat queries through visually assembled RAG workflows
#[derive(Parser)]
#[command(name = "flowrag")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Execute a workflow with a query
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// The query to run through the workflow
    #[arg(long)]
    query: String,

    /// Deadline for the whole run, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Execute independent branches concurrently
    #[arg(long)]
    parallel: bool,
  },

  /// Validate a workflow's structure without executing it
  Validate {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Run {
      workflow_file,
      query,
      timeout_ms,
      parallel,
    } => run_workflow(workflow_file, query, timeout_ms, parallel),
    Commands::Validate { workflow_file } => validate_workflow(workflow_file),
  }
}

fn run_workflow(
  workflow_file: PathBuf,
  query: String,
  timeout_ms: Option<u64>,
  parallel: bool,
) -> Result<()> {
  // The engine assumes a non-empty query; rejecting it is the caller's job.
  let query = query.trim().to_string();
  if query.is_empty() {
    bail!("query cannot be empty");
  }

  let workflow = load_workflow(&workflow_file)?;
  eprintln!("Loaded workflow: {}", workflow.name);

  let options = RunOptions {
    timeout: timeout_ms.map(Duration::from_millis),
    mode: if parallel {
      ExecutionMode::Parallel
    } else {
      ExecutionMode::Sequential
    },
    ..RunOptions::default()
  };

  let registry = Arc::new(ComponentRegistry::builtin());
  let executor = Executor::with_options(registry, options);

  let rt = tokio::runtime::Runtime::new()?;
  let result = rt.block_on(async {
    let cancel = CancellationToken::new();

    // Ctrl-C cancels the run instead of killing the process outright.
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        ctrl_c_cancel.cancel();
      }
    });

    executor.run(&workflow, &query, cancel).await
  });

  // Execution failure is expressed in the result body, not the exit code.
  println!("{}", serde_json::to_string_pretty(&result)?);
  Ok(())
}

fn validate_workflow(workflow_file: PathBuf) -> Result<()> {
  let workflow = load_workflow(&workflow_file)?;
  let registry = ComponentRegistry::builtin();

  let report = ValidationReport::from(validate(&workflow, &registry));
  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}

fn load_workflow(workflow_file: &PathBuf) -> Result<WorkflowGraph> {
  let content = std::fs::read_to_string(workflow_file)
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))
}
