//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod compile;
mod notify;
mod run;
mod worker;

pub use notify::NotifyCommands;
pub use run::RunCommands;
pub use worker::WorkerCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use sift_client::OrchestratorClient;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Compile a project against a service catalog and print the workflow
    Compile {
        /// Path to the service config JSON
        #[arg(short, long)]
        service: String,

        /// Path to the project config JSON
        #[arg(short, long)]
        project: String,

        /// Changed path considered by path filters (repeatable)
        #[arg(short, long)]
        changed: Vec<String>,

        /// Print the workflow as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that a project compiles against a service catalog
    Check {
        /// Path to the service config JSON
        #[arg(short, long)]
        service: String,

        /// Path to the project config JSON
        #[arg(short, long)]
        project: String,
    },
    /// Run management on the orchestrator
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
    /// Drive individual workers
    Worker {
        #[command(subcommand)]
        command: WorkerCommands,
    },
    /// Build notifications
    Notify {
        #[command(subcommand)]
        command: NotifyCommands,
    },
    /// Check the orchestrator is up
    Health,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Compile {
            service,
            project,
            changed,
            json,
        } => compile::compile(&service, &project, &changed, json),
        Commands::Check { service, project } => compile::check(&service, &project),
        Commands::Run { command } => run::handle_run_command(command, config).await,
        Commands::Worker { command } => worker::handle_worker_command(command, config).await,
        Commands::Notify { command } => notify::handle_notify_command(command, config).await,
        Commands::Health => health(config).await,
    }
}

async fn health(config: &Config) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);
    let body = client.health().await?;
    println!(
        "{} {} ({})",
        "✓".green().bold(),
        config.orchestrator_url.cyan(),
        body.trim()
    );
    Ok(())
}
