//! Sift CLI
//!
//! Command-line interface for compiling analysis workflows and driving the
//! Sift orchestrator.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Sift analysis workflow CLI", long_about = None)]
struct Cli {
    /// Orchestrator URL
    #[arg(
        long,
        env = "SIFT_ORCHESTRATOR_URL",
        default_value = "http://localhost:8080"
    )]
    orchestrator_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        orchestrator_url: cli.orchestrator_url,
    };

    handle_command(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compile_command() {
        let cli = Cli::try_parse_from([
            "sift",
            "compile",
            "--service",
            "service.json",
            "--project",
            "project.json",
            "--changed",
            "a.py",
            "--changed",
            "b.py",
        ])
        .unwrap();

        match cli.command {
            Commands::Compile { changed, json, .. } => {
                assert_eq!(changed, vec!["a.py", "b.py"]);
                assert!(!json);
            }
            _ => panic!("expected compile"),
        }
    }

    #[test]
    fn test_parse_orchestrator_url() {
        let cli = Cli::try_parse_from([
            "sift",
            "--orchestrator-url",
            "http://sift:9000",
            "worker",
            "collect",
            "--run-id",
            "12",
            "--worker",
            "PyLint_UBUNTU",
            "--build-id",
            "8945",
        ])
        .unwrap();
        assert_eq!(cli.orchestrator_url, "http://sift:9000");
    }
}
