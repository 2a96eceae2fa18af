//! xexec - execute-and-correlate client
//!
//! Command line front end running against the in-process engine.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xexec::{
    load_definition, Application, ClientConfig, DevSession, EchoHandler, ExecutionRequest,
    LocalEngine, StopSignal,
};

/// xexec - execute-and-correlate client
#[derive(Parser, Debug)]
#[command(name = "xexec")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a client configuration file (YAML, JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a process in development mode until interrupted
    Dev {
        /// Path of the process definition
        #[arg(default_value = "./process.yml")]
        process: PathBuf,

        /// Environment override for the process
        #[arg(long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,
    },

    /// Execute a task on the echo instance and wait for its result
    Exec {
        /// Task key
        #[arg(long)]
        task: String,

        /// Task inputs as JSON
        #[arg(long)]
        inputs: Option<String>,

        /// Extra tag attached to the execution
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ClientConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    let engine = LocalEngine::new(config.local.clone());

    match cli.command {
        Commands::Dev { process, env } => {
            let definition = load_definition(&process, &env)
                .with_context(|| format!("failed to load process {}", process.display()))?;

            let stop = StopSignal::new();
            let interrupt = stop.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    interrupt.trigger();
                }
            });

            let mut session =
                DevSession::start(Arc::new(engine.clone()), definition, &config.dev).await?;
            println!("process {} running, press Ctrl-C to stop", session.process_hash());
            session
                .run_until(&stop, |execution| {
                    println!(
                        "{} {} {:?}",
                        execution.hash, execution.task_key, execution.status
                    );
                })
                .await?;
        }
        Commands::Exec { task, inputs, tags } => {
            let instance = engine.register_instance("echo", Arc::new(EchoHandler));
            let mut request = ExecutionRequest::new(instance, task);
            if let Some(inputs) = inputs {
                request = request.with_inputs(
                    serde_json::from_str(&inputs).context("inputs must be valid JSON")?,
                );
            }
            for tag in tags {
                request = request.with_tag(tag);
            }

            let app = Application::builder(Arc::new(engine))
                .config(config)
                .build();
            let execution = app.execute_task_and_wait_result(request).await?;
            println!("{}", serde_json::to_string_pretty(&execution)?);
        }
    }

    Ok(())
}
