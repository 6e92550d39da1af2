//! Workflow compiler
//!
//! Turns the service catalog, a project's overrides and selections, and the
//! list of changed paths into a validated [`Workflow`]:
//!
//! 1. merge each selected function with its project override ([`merge`])
//! 2. drop analyzers whose path filters match nothing ([`include_function`])
//! 3. build one worker per remaining selection ([`create_worker`])
//! 4. link producers to consumers ([`resolve_successors`])
//! 5. reject unreachable workers and cycles ([`check_workflow_sanity`])
//!
//! All steps are pure; any failure aborts the whole compilation.

mod error;
mod factory;
mod filter;
mod merge;
mod successors;
mod validate;

pub use error::{CompileError, Result};
pub use factory::create_worker;
pub use filter::include_function;
pub use merge::merge;
pub use successors::resolve_successors;
pub use validate::check_workflow_sanity;

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::domain::{ProjectConfig, ResolvedFunction, Selection, ServiceConfig, Workflow};

/// Compile the workflow for one project run
pub fn generate(
    service: &ServiceConfig,
    project: &ProjectConfig,
    changed_paths: &[String],
) -> Result<Workflow> {
    let mut resolved: HashMap<&str, ResolvedFunction> = HashMap::new();
    let mut selected: HashSet<(&str, &str)> = HashSet::new();
    let mut workers = Vec::with_capacity(project.selections.len());

    for selection in &project.selections {
        if !selected.insert((selection.function.as_str(), selection.platform.as_str())) {
            return Err(CompileError::config(format!(
                "function {} selected twice for platform {}",
                selection.function, selection.platform
            )));
        }

        let function = match resolved.entry(selection.function.as_str()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                entry.insert(resolve_function(service, project, &selection.function)?)
            }
        };

        check_selection_configs(selection, function)?;

        if !include_function(function, changed_paths)? {
            tracing::debug!(
                "Skipping {} on {}: no changed path matches its filters",
                function.name,
                selection.platform
            );
            continue;
        }

        workers.push(create_worker(selection, service, function)?);
    }

    resolve_successors(service, &mut workers);
    check_workflow_sanity(&workers)?;

    tracing::info!(
        "Generated workflow for project {} with {} worker(s)",
        project.name,
        workers.len()
    );

    Ok(Workflow::new(workers))
}

fn resolve_function(
    service: &ServiceConfig,
    project: &ProjectConfig,
    name: &str,
) -> Result<ResolvedFunction> {
    let service_fn = service.function(name);
    let project_fn = project.function(name);
    if service_fn.is_none() && project_fn.is_none() {
        return Err(CompileError::not_found(format!(
            "selected function {} is not defined",
            name
        )));
    }
    merge(service_fn, project_fn)
}

fn check_selection_configs(selection: &Selection, function: &ResolvedFunction) -> Result<()> {
    match selection
        .configs
        .iter()
        .find(|c| !function.has_config(&c.name))
    {
        Some(unknown) => Err(CompileError::config(format!(
            "selection of {} sets unknown config {}",
            function.name, unknown.name
        ))),
        None => Ok(()),
    }
}
