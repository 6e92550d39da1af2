//! Workflow sanity checks

use std::collections::HashMap;

use super::error::{CompileError, Result};
use crate::domain::Worker;
use crate::domain::worker::root_workers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current DFS path
    InProgress,
    /// Fully explored; reaching it again is a join, not a cycle
    Done,
}

/// Prove that every worker is reachable from an entry worker and that the
/// successor graph has no cycle.
///
/// Entry workers are those whose needed data type no worker in the set
/// provides. Reaching an explored worker through a second predecessor is
/// accepted.
pub fn check_workflow_sanity(workers: &[Worker]) -> Result<()> {
    let mut by_name: HashMap<&str, &Worker> = HashMap::with_capacity(workers.len());
    for worker in workers {
        if by_name.insert(worker.name.as_str(), worker).is_some() {
            return Err(CompileError::config(format!(
                "duplicate worker {}",
                worker.name
            )));
        }
    }

    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(workers.len());
    for root in root_workers(workers) {
        visit(root, &by_name, &mut marks)?;
    }

    match workers.iter().find(|w| !marks.contains_key(w.name.as_str())) {
        Some(unreached) => Err(CompileError::UnreachableWorker(unreached.name.clone())),
        None => Ok(()),
    }
}

fn visit<'a>(
    worker: &'a Worker,
    by_name: &HashMap<&'a str, &'a Worker>,
    marks: &mut HashMap<&'a str, Mark>,
) -> Result<()> {
    match marks.get(worker.name.as_str()) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => return Err(CompileError::Cycle(worker.name.clone())),
        None => {}
    }

    marks.insert(worker.name.as_str(), Mark::InProgress);
    for name in &worker.next {
        let successor = by_name.get(name.as_str()).ok_or_else(|| {
            CompileError::not_found(format!(
                "worker {} lists unknown successor {}",
                worker.name, name
            ))
        })?;
        visit(successor, by_name, marks)?;
    }
    marks.insert(worker.name.as_str(), Mark::Done);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cmd, DataType, Platform};

    fn worker(name: &str, needs: &str, provides: &str, next: &[&str]) -> Worker {
        Worker {
            name: name.to_string(),
            needs: DataType::new(needs),
            needs_for_platform: None,
            provides: DataType::new(provides),
            provides_for_platform: Platform::new("UBUNTU"),
            runtime_platform: Platform::new("UBUNTU"),
            dimensions: vec![],
            cipd_packages: vec![],
            deadline: 0,
            cmd: Cmd::default(),
            next: next.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_linear_workflow_is_sane() {
        let workers = vec![
            worker("GitFileIsolator", "GIT_FILE_DETAILS", "FILES", &["PyLint"]),
            worker("PyLint", "FILES", "RESULTS", &[]),
        ];
        assert_eq!(check_workflow_sanity(&workers), Ok(()));
    }

    #[test]
    fn test_empty_workflow_is_sane() {
        assert_eq!(check_workflow_sanity(&[]), Ok(()));
    }

    #[test]
    fn test_missing_edge_leaves_worker_unreachable() {
        let workers = vec![
            worker("GitFileIsolator", "GIT_FILE_DETAILS", "FILES", &[]),
            worker("PyLint", "FILES", "RESULTS", &[]),
        ];
        assert_eq!(
            check_workflow_sanity(&workers),
            Err(CompileError::UnreachableWorker("PyLint".to_string()))
        );
    }

    #[test]
    fn test_self_successor_is_a_cycle() {
        let workers = vec![worker(
            "GitFileIsolator",
            "GIT_FILE_DETAILS",
            "FILES",
            &["GitFileIsolator"],
        )];
        assert_eq!(
            check_workflow_sanity(&workers),
            Err(CompileError::Cycle("GitFileIsolator".to_string()))
        );
    }

    #[test]
    fn test_longer_cycle_is_detected() {
        let workers = vec![
            worker("A", "GIT_FILE_DETAILS", "FILES", &["B"]),
            worker("B", "FILES", "CLANG_DETAILS", &["C"]),
            worker("C", "CLANG_DETAILS", "RESULTS", &["B"]),
        ];
        assert_eq!(
            check_workflow_sanity(&workers),
            Err(CompileError::Cycle("B".to_string()))
        );
    }

    #[test]
    fn test_diamond_is_accepted() {
        let workers = vec![
            worker("Root", "GIT_FILE_DETAILS", "FILES", &["Left", "Right"]),
            worker("Left", "FILES", "CLANG_DETAILS", &["Join"]),
            worker("Right", "FILES", "CLANG_DETAILS", &["Join"]),
            worker("Join", "CLANG_DETAILS", "RESULTS", &[]),
        ];
        assert_eq!(check_workflow_sanity(&workers), Ok(()));
    }

    #[test]
    fn test_unknown_successor_is_not_found() {
        let workers = vec![worker("A", "GIT_FILE_DETAILS", "FILES", &["Ghost"])];
        assert!(matches!(
            check_workflow_sanity(&workers),
            Err(CompileError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_worker_names_rejected() {
        let workers = vec![
            worker("A", "GIT_FILE_DETAILS", "FILES", &[]),
            worker("A", "GIT_FILE_DETAILS", "FILES", &[]),
        ];
        assert!(matches!(
            check_workflow_sanity(&workers),
            Err(CompileError::Config(_))
        ));
    }
}
