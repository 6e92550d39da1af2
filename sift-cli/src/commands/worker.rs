//! Worker command handlers
//!
//! Trigger and collect single workers by hand, outside the task queue.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use sift_client::OrchestratorClient;
use sift_core::dto::pipeline::{CollectOutcome, CollectRequest, TriggerRequest};

use crate::config::Config;

/// Worker subcommands
#[derive(Subcommand)]
pub enum WorkerCommands {
    /// Schedule a worker's build
    Trigger {
        #[arg(long)]
        run_id: i64,

        /// Worker name, e.g. PyLint_UBUNTU
        #[arg(short, long)]
        worker: String,
    },
    /// Collect a worker's build
    Collect {
        #[arg(long)]
        run_id: i64,

        #[arg(short, long)]
        worker: String,

        #[arg(short, long)]
        build_id: i64,
    },
}

/// Handle worker commands
pub async fn handle_worker_command(command: WorkerCommands, config: &Config) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);

    match command {
        WorkerCommands::Trigger { run_id, worker } => {
            let triggered = client
                .trigger(&TriggerRequest {
                    run_id,
                    worker_name: worker.clone(),
                })
                .await?;
            println!(
                "{} {} scheduled as build {}",
                "✓".green().bold(),
                worker.bold(),
                triggered.build_id.to_string().cyan()
            );
        }
        WorkerCommands::Collect {
            run_id,
            worker,
            build_id,
        } => {
            let outcome = client
                .collect(&CollectRequest::new(run_id, &worker, build_id))
                .await?;
            print_outcome(&worker, &outcome);
        }
    }

    Ok(())
}

fn print_outcome(worker: &str, outcome: &CollectOutcome) {
    match outcome {
        CollectOutcome::Rescheduled { attempt } => println!(
            "{} {} still running, collect attempt {} queued",
            "…".yellow(),
            worker.bold(),
            attempt
        ),
        CollectOutcome::RetriesExhausted => println!(
            "{} {} still running, no collect attempts left",
            "!".red().bold(),
            worker.bold()
        ),
        CollectOutcome::Succeeded { triggered } => {
            println!("{} {} succeeded", "✓".green().bold(), worker.bold());
            if !triggered.is_empty() {
                println!("  Triggered: {}", triggered.join(", ").cyan());
            }
        }
        CollectOutcome::Failed { status } => {
            println!("{} {} ended with {}", "✗".red().bold(), worker.bold(), status.red())
        }
    }
}
