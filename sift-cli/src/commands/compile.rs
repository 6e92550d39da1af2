//! Offline compile commands
//!
//! Compile a project against a service catalog locally, without an
//! orchestrator.

use anyhow::{Context, Result};
use colored::*;
use sift_core::domain::{ProjectConfig, ServiceConfig, Workflow};

/// Compile and print the workflow
pub fn compile(service_path: &str, project_path: &str, changed: &[String], json: bool) -> Result<()> {
    let workflow = compile_files(service_path, project_path, changed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workflow)?);
    } else {
        print_workflow(&workflow);
    }

    Ok(())
}

/// Compile and report whether the project is valid
pub fn check(service_path: &str, project_path: &str) -> Result<()> {
    let workflow = compile_files(service_path, project_path, &[])?;

    println!(
        "{}",
        format!("✓ Project is valid ({} worker(s))", workflow.len())
            .green()
            .bold()
    );

    Ok(())
}

fn compile_files(service_path: &str, project_path: &str, changed: &[String]) -> Result<Workflow> {
    let service = std::fs::read_to_string(service_path)
        .with_context(|| format!("Failed to read service config: {}", service_path))?;
    let project = std::fs::read_to_string(project_path)
        .with_context(|| format!("Failed to read project config: {}", project_path))?;

    compile_documents(&service, &project, changed)
}

/// Parse both documents and generate the workflow
pub fn compile_documents(service: &str, project: &str, changed: &[String]) -> Result<Workflow> {
    let service = ServiceConfig::from_json(service).context("Failed to parse service config")?;
    let project = ProjectConfig::from_json(project).context("Failed to parse project config")?;

    let workflow = sift_core::generate(&service, &project, changed)
        .context("Failed to compile workflow")?;

    Ok(workflow)
}

/// Print a workflow, roots first
pub fn print_workflow(workflow: &Workflow) {
    if workflow.is_empty() {
        println!("{}", "Workflow is empty.".yellow());
        return;
    }

    let roots: Vec<&str> = workflow
        .root_workers()
        .iter()
        .map(|w| w.name.as_str())
        .collect();

    println!(
        "{}",
        format!("Workflow with {} worker(s):", workflow.len()).bold()
    );
    println!();

    for worker in &workflow.workers {
        let marker = if roots.contains(&worker.name.as_str()) {
            "▸".green()
        } else {
            "▸".cyan()
        };
        println!("  {} {}", marker, worker.name.bold());
        println!(
            "    {} -> {}",
            worker.needs.as_str().dimmed(),
            worker.provides.as_str().dimmed()
        );
        println!(
            "    Runs on:  {} ({}s deadline)",
            worker.runtime_platform.as_str(),
            worker.deadline
        );
        println!("    Command:  {} {}", worker.cmd.exec, worker.cmd.args.join(" "));
        if !worker.next.is_empty() {
            println!("    Next:     {}", worker.next.join(", ").cyan());
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE: &str = r#"{
        "platforms": [{"name": "UBUNTU", "has_runtime": true}],
        "functions": [
            {
                "name": "FileIsolator",
                "type": "ISOLATOR",
                "needs": "GIT_FILE_DETAILS",
                "provides": "FILES",
                "impls": [{
                    "runtime_platform": "UBUNTU",
                    "provides_for_platform": "UBUNTU",
                    "cmd": {"exec": "isolator"}
                }]
            },
            {
                "name": "PyLint",
                "type": "ANALYZER",
                "needs": "FILES",
                "provides": "RESULTS",
                "path_filters": ["*.py"],
                "impls": [{
                    "runtime_platform": "UBUNTU",
                    "provides_for_platform": "UBUNTU",
                    "cmd": {"exec": "pylint"}
                }]
            }
        ]
    }"#;

    const PROJECT: &str = r#"{
        "name": "playground",
        "selections": [
            {"function": "FileIsolator", "platform": "UBUNTU"},
            {"function": "PyLint", "platform": "UBUNTU"}
        ]
    }"#;

    #[test]
    fn test_compile_documents() {
        let workflow = compile_documents(SERVICE, PROJECT, &["src/app.py".to_string()]).unwrap();
        assert_eq!(workflow.len(), 2);
        assert_eq!(
            workflow.worker("FileIsolator_UBUNTU").unwrap().next,
            vec!["PyLint_UBUNTU"]
        );
    }

    #[test]
    fn test_compile_documents_skips_filtered() {
        let workflow = compile_documents(SERVICE, PROJECT, &["README.md".to_string()]).unwrap();
        assert_eq!(workflow.len(), 1);
    }

    #[test]
    fn test_compile_documents_reports_bad_json() {
        let err = compile_documents("{", PROJECT, &[]).unwrap_err();
        assert!(format!("{:#}", err).contains("service config"));
    }
}
