//! Worker construction

use std::collections::BTreeMap;

use super::error::{CompileError, Result};
use crate::domain::{
    CipdPackage, Cmd, ImplKind, Recipe, ResolvedFunction, Selection, ServiceConfig, Worker,
};

/// Build the worker for one selection of a merged function.
///
/// Picks the implementation providing data for the selected platform and
/// resolves its command line. Successor links are left empty; see
/// [`super::resolve_successors`].
pub fn create_worker(
    selection: &Selection,
    service: &ServiceConfig,
    function: &ResolvedFunction,
) -> Result<Worker> {
    if service.platform(&selection.platform).is_none() {
        return Err(CompileError::not_found(format!(
            "platform {} selected for {} is not in the service catalog",
            selection.platform, function.name
        )));
    }

    let imp = function.impl_for(&selection.platform).ok_or_else(|| {
        CompileError::not_found(format!(
            "function {} has no implementation for platform {}",
            function.name, selection.platform
        ))
    })?;

    let runtime = service.platform(&imp.runtime_platform).ok_or_else(|| {
        CompileError::not_found(format!(
            "runtime platform {} of {} is not in the service catalog",
            imp.runtime_platform, function.name
        ))
    })?;
    if !runtime.has_runtime {
        return Err(CompileError::config(format!(
            "function {}: platform {} has no runtime",
            function.name, imp.runtime_platform
        )));
    }

    let (cmd, cipd_packages) = match &imp.kind {
        ImplKind::Cmd(cmd) => (command_with_flags(cmd, selection), imp.cipd_packages.clone()),
        ImplKind::Recipe(recipe) => (
            recipe_command(&service.recipe_cmd, recipe, selection)?,
            union(&imp.cipd_packages, &service.recipe_packages),
        ),
    };

    Ok(Worker {
        name: format!("{}_{}", function.name, selection.platform),
        needs: function.needs.clone(),
        needs_for_platform: function.needs_for_platform.clone(),
        provides: function.provides.clone(),
        provides_for_platform: imp.provides_for_platform.clone(),
        runtime_platform: imp.runtime_platform.clone(),
        dimensions: runtime.dimensions.clone(),
        cipd_packages,
        deadline: imp.deadline,
        cmd,
        next: Vec::new(),
    })
}

/// Static args followed by `--{name} {value}` per selection config, in order
fn command_with_flags(cmd: &Cmd, selection: &Selection) -> Cmd {
    let mut args = cmd.args.clone();
    for config in &selection.configs {
        args.push(format!("--{}", config.name));
        args.push(config.value.clone());
    }
    Cmd {
        exec: cmd.exec.clone(),
        args,
    }
}

fn recipe_command(base: &Cmd, recipe: &Recipe, selection: &Selection) -> Result<Cmd> {
    let properties: BTreeMap<&str, &str> = selection
        .configs
        .iter()
        .map(|c| (c.name.as_str(), c.value.as_str()))
        .collect();
    let properties = serde_json::to_string(&properties)
        .map_err(|e| CompileError::config(format!("cannot encode recipe properties: {}", e)))?;

    let mut args = base.args.clone();
    args.extend([
        "--recipe".to_string(),
        recipe.path.clone(),
        "--repository".to_string(),
        recipe.repository.clone(),
        "--revision".to_string(),
        recipe.revision.clone(),
        "--properties".to_string(),
        properties,
    ]);

    Ok(Cmd {
        exec: base.exec.clone(),
        args,
    })
}

fn union(first: &[CipdPackage], second: &[CipdPackage]) -> Vec<CipdPackage> {
    let mut packages = first.to_vec();
    for package in second {
        if !packages.contains(package) {
            packages.push(package.clone());
        }
    }
    packages
}
