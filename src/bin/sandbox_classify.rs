//! sandbox-classify: 對話情緒分類命令行工具
//!
//! Usage:
//!   sandbox-classify classify <TEXT> [--task emotion] [--task tension] ...
//!   sandbox-classify batch <DATASET> [--concurrency N] [--out records.jsonl]
//!   sandbox-classify tasks

use anyhow::Context;
use clap::{Parser, Subcommand};
use sandbox_classify::batch::{
    BatchExecutor, BatchExecutorConfig, BatchReport, BatchStrategy, Dataset,
};
use sandbox_classify::{
    ClassificationClient, ClassifyOptions, ClientConfig, ClientError, CombinePolicy, HistoryDepth,
    TaskCatalog, TaskKind,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sandbox-classify")]
#[command(about = "Classify dialogue through an LLM sandbox endpoint")]
#[command(version)]
struct Cli {
    /// YAML client config (endpoint, platform id, timeout, proxy)
    #[arg(long, global = true, env = "SANDBOX_CONFIG")]
    config: Option<PathBuf>,

    /// YAML task overrides layered on the built-in tasks
    #[arg(long, global = true)]
    tasks_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one piece of dialogue and print the result as JSON
    Classify {
        /// Dialogue text
        text: String,

        /// Tasks to run (repeatable or comma-separated)
        #[arg(short, long = "task", value_delimiter = ',', default_values = ["emotion", "tension"])]
        tasks: Vec<TaskKind>,

        /// Keep successful tasks when others fail
        #[arg(long)]
        partial: bool,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Conversation history depth: a step count or "all"
        #[arg(long)]
        history: Option<HistoryDepth>,

        /// Use this model for every task
        #[arg(long)]
        model: Option<String>,
    },

    /// Evaluate a labeled dataset and print accuracy and latency statistics
    Batch {
        /// Dataset JSON (characters -> emotion groups -> sentences)
        dataset: PathBuf,

        #[arg(short, long = "task", value_delimiter = ',', default_values = ["emotion", "tension"])]
        tasks: Vec<TaskKind>,

        /// Samples in flight at once; 1 runs sequentially
        #[arg(long, default_value_t = 1)]
        concurrency: usize,

        /// Minimum spacing between sample starts, in milliseconds
        #[arg(long, default_value_t = 0)]
        pause_ms: u64,

        /// Write per-sample records as JSON Lines
        #[arg(long)]
        out: Option<PathBuf>,

        /// Stop starting new samples after the first failure
        #[arg(long)]
        fail_fast: bool,
    },

    /// List configured task definitions
    Tasks,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let client_error = match err.downcast_ref::<sandbox_classify::Error>() {
            Some(e) => ClientError::from(e),
            None => ClientError::new(format!("{:#}", err)),
        };
        match serde_json::to_string_pretty(&client_error) {
            Ok(json) => println!("{}", json),
            Err(_) => eprintln!("Error: {}", client_error),
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "sandbox_classify=info",
        1 => "sandbox_classify=debug",
        _ => "sandbox_classify=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let catalog = load_catalog(cli.tasks_file.as_deref())?;

    match cli.command {
        Commands::Tasks => {
            for def in catalog.iter() {
                let history = def
                    .history
                    .map(|h| format!("{:?}", h))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<10} {:<18} model={} temperature={} history={} labels={}",
                    def.kind,
                    def.function_name,
                    def.model_name,
                    def.temperature,
                    history,
                    def.labels.len()
                );
            }
            Ok(())
        }
        Commands::Classify {
            text,
            tasks,
            partial,
            timeout_secs,
            history,
            model,
        } => {
            let client = build_client(cli.config.as_deref(), catalog, model)?;
            let mut options = ClassifyOptions::new().tasks(tasks).cancel_token(ctrl_c_token());
            if partial {
                options = options.policy(CombinePolicy::Partial);
            }
            if let Some(secs) = timeout_secs {
                options = options.timeout(Duration::from_secs(secs));
            }
            if let Some(history) = history {
                options = options.history(history);
            }

            let result = client.classify(&text, &options).await?;
            let mut value = serde_json::to_value(&result)?;
            if let Some(obj) = value.as_object_mut() {
                obj.insert("summary".into(), serde_json::json!(result.summary()));
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Commands::Batch {
            dataset,
            tasks,
            concurrency,
            pause_ms,
            out,
            fail_fast,
        } => {
            let client = build_client(cli.config.as_deref(), catalog, None)?;
            let dataset = Dataset::from_json_file(&dataset)
                .with_context(|| format!("failed to load dataset {}", dataset.display()))?;

            let strategy = if concurrency > 1 {
                BatchStrategy::Concurrent {
                    max_concurrency: concurrency,
                }
            } else {
                BatchStrategy::Sequential
            };
            let config = BatchExecutorConfig::new()
                .with_strategy(strategy)
                .with_continue_on_error(!fail_fast)
                .with_pause(Duration::from_millis(pause_ms))
                .with_options(
                    ClassifyOptions::new()
                        .tasks(tasks)
                        .policy(CombinePolicy::Partial)
                        .cancel_token(ctrl_c_token()),
                );

            let run = BatchExecutor::with_config(&client, config)
                .run(dataset.samples())
                .await;

            if let Some(path) = out {
                let file = std::fs::File::create(&path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                run.write_jsonl(std::io::BufWriter::new(file))?;
                eprintln!("Wrote {} records to {}", run.records.len(), path.display());
            }
            println!("{}", BatchReport::from_records(&run.records));
            println!(
                "Completed {}/{} samples in {:.1}s",
                run.records.len(),
                run.total_samples,
                run.execution_time.as_secs_f64()
            );
            Ok(())
        }
    }
}

fn load_catalog(path: Option<&Path>) -> anyhow::Result<TaskCatalog> {
    match path {
        Some(path) => TaskCatalog::from_yaml_file(path)
            .with_context(|| format!("failed to load tasks file {}", path.display())),
        None => Ok(TaskCatalog::builtin()),
    }
}

fn build_client(
    config: Option<&Path>,
    catalog: TaskCatalog,
    model: Option<String>,
) -> anyhow::Result<ClassificationClient> {
    let config = match config {
        Some(path) => ClientConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ClientConfig::from_env()?,
    };
    let mut builder = ClassificationClient::builder().config(config).catalog(catalog);
    if let Some(model) = model {
        builder = builder.model(model);
    }
    Ok(builder.build()?)
}

/// Token cancelled on Ctrl-C so in-flight sandbox calls are dropped.
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}
