//! Compiled workflow types

use serde::{Deserialize, Serialize};

use super::function::{CipdPackage, Cmd};
use super::platform::{DataType, Platform};

/// A compiled, platform-bound unit of work
///
/// Structure shared between the compiler (builds) and the orchestrator
/// (launches by name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    /// `{function}_{platform}`
    pub name: String,
    pub needs: DataType,
    pub needs_for_platform: Option<Platform>,
    pub provides: DataType,
    pub provides_for_platform: Platform,
    pub runtime_platform: Platform,
    pub dimensions: Vec<String>,
    pub cipd_packages: Vec<CipdPackage>,
    /// Deadline in seconds
    pub deadline: u32,
    pub cmd: Cmd,
    /// Names of successor workers
    #[serde(default)]
    pub next: Vec<String>,
}

impl Worker {
    /// Platform a producer must provide for this worker to consume its output
    pub fn consumed_platform(&self) -> &Platform {
        self.needs_for_platform
            .as_ref()
            .unwrap_or(&self.runtime_platform)
    }
}

/// All workers compiled for one project run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub workers: Vec<Worker>,
}

impl Workflow {
    pub fn new(workers: Vec<Worker>) -> Self {
        Self { workers }
    }

    pub fn worker(&self, name: &str) -> Option<&Worker> {
        self.workers.iter().find(|w| w.name == name)
    }

    /// Entry workers: those whose needed data type no worker in the
    /// workflow provides
    pub fn root_workers(&self) -> Vec<&Worker> {
        root_workers(&self.workers)
    }

    /// Workers listing `name` among their successors
    pub fn predecessors(&self, name: &str) -> Vec<&Worker> {
        self.workers
            .iter()
            .filter(|w| w.next.iter().any(|n| n == name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

pub(crate) fn root_workers(workers: &[Worker]) -> Vec<&Worker> {
    workers
        .iter()
        .filter(|w| !workers.iter().any(|p| p.provides == w.needs))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Cmd;

    fn worker(name: &str, platform: &str, next: &[&str]) -> Worker {
        Worker {
            name: name.to_string(),
            needs: DataType::new("GIT_FILE_DETAILS"),
            needs_for_platform: None,
            provides: DataType::new("FILES"),
            provides_for_platform: Platform::new(platform),
            runtime_platform: Platform::new(platform),
            dimensions: vec![],
            cipd_packages: vec![],
            deadline: 0,
            cmd: Cmd::default(),
            next: next.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn test_predecessors_of_join() {
        let workflow = Workflow::new(vec![
            worker("FileIsolator_UBUNTU", "UBUNTU", &["PyLint_UBUNTU"]),
            worker("FileIsolator_MAC", "MAC", &["PyLint_UBUNTU"]),
            worker("PyLint_UBUNTU", "UBUNTU", &[]),
        ]);

        let names: Vec<&str> = workflow
            .predecessors("PyLint_UBUNTU")
            .iter()
            .map(|w| w.name.as_str())
            .collect();
        assert_eq!(names, vec!["FileIsolator_UBUNTU", "FileIsolator_MAC"]);
        assert!(workflow.predecessors("FileIsolator_MAC").is_empty());
    }
}
