//! Notification command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use sift_client::{OrchestratorClient, PullOutcome};

use crate::config::Config;

/// Notification subcommands
#[derive(Subcommand)]
pub enum NotifyCommands {
    /// Make the orchestrator pull and handle one pending notification
    Pull,
}

/// Handle notification commands
pub async fn handle_notify_command(command: NotifyCommands, config: &Config) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);

    match command {
        NotifyCommands::Pull => match client.pull_notification().await? {
            PullOutcome::Handled => println!("{}", "✓ Notification handled".green().bold()),
            PullOutcome::NothingPending => println!("{}", "No notification pending.".yellow()),
        },
    }

    Ok(())
}
