//! `function-model` CLI entry-point.
//!
//! Available sub-commands:
//! - `validate`: check a model snapshot and print the findings.
//! - `run`: execute one node of a snapshot against an in-memory store.
//! - `summarize`: print the version metadata of a snapshot.
//!
//! A snapshot is a JSON `ModelSnapshot`: `{ "model_id", "nodes", "links" }`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use db::InMemoryRepository;
use domain::{FeatureType, ModelSnapshot, NodeId};
use engine::{ExecutorConfig, NodeExecutor};
use nodes::{Environment, ExecutionContext, NodeRegistry};

#[derive(Parser)]
#[command(
    name = "function-model",
    about = "Validate, execute and summarize function models",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a model snapshot. Exits with 1 when it has errors.
    Validate {
        /// Path to the snapshot JSON file.
        path: PathBuf,
    },
    /// Execute a single node of a model snapshot.
    Run {
        path: PathBuf,
        /// Id of the node to execute.
        #[arg(long)]
        node: NodeId,
        /// Executor config (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Per-attempt timeout; overrides the config file.
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Reset a completed or failed node to idle before running it.
        #[arg(long)]
        reset_settled: bool,
        #[arg(long, default_value = "cli")]
        user: String,
        #[arg(long, default_value = "development")]
        environment: Environment,
        /// Context parameter as `key=value`; the value is parsed as JSON
        /// when possible. Repeatable.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },
    /// Print version metadata (node tallies, edges, complexity, duration).
    Summarize { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { path } => {
            let snapshot = read_snapshot(&path)?;
            let result = engine::validate_model(&snapshot);
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_valid {
                return Ok(ExitCode::FAILURE);
            }
            if let Some(plan) = engine::execution_plan(&snapshot) {
                let plan: Vec<String> = plan.iter().map(NodeId::to_string).collect();
                debug!(?plan, "execution plan");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            path,
            node,
            config,
            timeout_ms,
            reset_settled,
            user,
            environment,
            params,
        } => {
            let snapshot = read_snapshot(&path)?;
            let mut config = match config {
                Some(config_path) => engine::load_config(&config_path)?,
                None => ExecutorConfig::default(),
            };
            if timeout_ms.is_some() {
                config.timeout_ms = timeout_ms;
            }
            if reset_settled {
                config.reset_settled = true;
            }

            let repository = InMemoryRepository::seed(&snapshot.nodes, &snapshot.links)
                .await
                .context("snapshot could not be loaded into the repository")?;
            let executor = NodeExecutor::new(Arc::new(repository), NodeRegistry::new())
                .with_defaults(config.options());

            let context = params
                .into_iter()
                .fold(ExecutionContext::new(user), |ctx, (key, value)| ctx.with_parameter(key, value))
                .with_environment(environment);

            info!(
                %node,
                model_id = %snapshot.model_id,
                timeout = ?config.timeout_ms.map(Duration::from_millis),
                "executing node"
            );
            let result = executor
                .execute_node(FeatureType::FunctionModel, &snapshot.model_id, &node, Some(context), None)
                .await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Summarize { path } => {
            let snapshot = read_snapshot(&path)?;
            let metadata = engine::aggregate_version_metadata(&snapshot.nodes)
                .with_total_edges(engine::count_edges(&snapshot.links));
            println!("{}", serde_json::to_string_pretty(&metadata)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_snapshot(path: &Path) -> anyhow::Result<ModelSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid model snapshot in {}", path.display()))
}

fn parse_param(raw: &str) -> anyhow::Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{raw}'"))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.trim().to_owned(), value))
}
