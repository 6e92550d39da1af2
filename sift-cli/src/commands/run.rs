//! Run command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use sift_client::OrchestratorClient;
use sift_core::domain::ProjectConfig;
use sift_core::dto::pipeline::LaunchRequest;

use super::compile::print_workflow;
use crate::config::Config;

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// Compile a project on the orchestrator and start the run
    Launch {
        /// Run identifier
        #[arg(long)]
        run_id: i64,

        /// Path to the project config JSON
        #[arg(short, long)]
        project: String,

        /// Changed path considered by path filters (repeatable)
        #[arg(short, long)]
        changed: Vec<String>,
    },
    /// Show the compiled workflow of a run
    Workflow {
        /// Run identifier
        run_id: i64,
    },
}

/// Handle run commands
pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);

    match command {
        RunCommands::Launch {
            run_id,
            project,
            changed,
        } => launch(&client, run_id, &project, changed).await,
        RunCommands::Workflow { run_id } => {
            let workflow = client
                .get_workflow(run_id)
                .await
                .with_context(|| format!("Failed to fetch workflow of run {}", run_id))?;
            print_workflow(&workflow);
            Ok(())
        }
    }
}

async fn launch(
    client: &OrchestratorClient,
    run_id: i64,
    project_path: &str,
    changed_paths: Vec<String>,
) -> Result<()> {
    let raw = std::fs::read_to_string(project_path)
        .with_context(|| format!("Failed to read project config: {}", project_path))?;
    let project = ProjectConfig::from_json(&raw).context("Failed to parse project config")?;

    let launched = client
        .launch(&LaunchRequest {
            run_id,
            project,
            changed_paths,
        })
        .await?;

    println!("{}", "✓ Run launched successfully!".green().bold());
    println!("  Run ID:    {}", launched.run_id.to_string().cyan());
    println!("  Workers:   {}", launched.workflow.len());
    println!("  Triggered: {}", launched.triggered.join(", ").dimmed());

    Ok(())
}
