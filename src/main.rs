//! Local API gateway (v1)
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!   HTTP request       │  http ──► routing ──► envelope ──┐           │
//!   ───────────────────┼─►                                │           │
//!                      │                                  ▼           │
//!   WebSocket frame    │  websocket ──► lifecycle ──► invoker queue ──┼──► function
//!   ───────────────────┼─►                              (per function) │    runtime
//!                      │                                  │           │
//!   Direct invoke      │  direct ─────────────────────────┘           │
//!   ───────────────────┼─►                                            │
//!                      │  response resolver ◄── runtime output        │
//!                      └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use lambda_gateway::config::loader::{from_env, load_config};
use lambda_gateway::lifecycle::{self, signals::wait_for_signal, Shutdown};
use lambda_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "lambda-gateway")]
#[command(about = "Local API gateway for function runtimes", long_about = None)]
struct Args {
    /// TOML configuration file. Without it, configuration comes from the environment.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => from_env()?,
    };

    init_logging(&config.observability.log_level);

    tracing::info!(
        host = %config.listener.host,
        base_port = config.listener.base_port,
        functions = config.functions.len(),
        "lambda-gateway v0.1.0 starting"
    );

    let shutdown = Shutdown::new();
    let running = lifecycle::start(config, &shutdown).await?;

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    running.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
