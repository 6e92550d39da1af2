//! Merging service catalog entries with project overrides

use super::error::{CompileError, Result};
use crate::domain::{Function, ResolvedFunction};

/// Combine a service function and an optional project override.
///
/// The data contract (`type`, `needs`, `needs_for_platform`, `provides`) is
/// owned by the service catalog: a project entry for a catalog function may
/// not set it. A function known to only one side must carry its full
/// contract. Otherwise project values win wherever supplied, and a non-empty
/// project collection replaces the service one wholesale.
pub fn merge(service: Option<&Function>, project: Option<&Function>) -> Result<ResolvedFunction> {
    match (service, project) {
        (None, None) => Err(CompileError::config(
            "cannot merge: neither a service nor a project function was given",
        )),
        (Some(f), None) | (None, Some(f)) => resolve(f),
        (Some(s), Some(p)) => {
            if p.kind.is_some()
                || p.needs.is_some()
                || p.provides.is_some()
                || p.needs_for_platform.is_some()
            {
                return Err(CompileError::config(format!(
                    "function {}: service data contract is immutable, project may not redefine it",
                    s.name
                )));
            }

            let merged = Function {
                name: s.name.clone(),
                kind: s.kind,
                needs: s.needs.clone(),
                needs_for_platform: s.needs_for_platform.clone(),
                provides: s.provides.clone(),
                path_filters: prefer(&p.path_filters, &s.path_filters),
                config_defs: prefer(&p.config_defs, &s.config_defs),
                owner: prefer_str(&p.owner, &s.owner),
                monorail_component: prefer_str(&p.monorail_component, &s.monorail_component),
                impls: prefer(&p.impls, &s.impls),
            };
            resolve(&merged)
        }
    }
}

fn resolve(f: &Function) -> Result<ResolvedFunction> {
    let missing = |field: &str| {
        CompileError::config(format!("function {}: missing {}", f.name, field))
    };

    let kind = f.kind.ok_or_else(|| missing("type"))?;
    let needs = f.needs.clone().ok_or_else(|| missing("needs"))?;
    let provides = f.provides.clone().ok_or_else(|| missing("provides"))?;
    if needs.as_str().is_empty() {
        return Err(missing("needs"));
    }
    if provides.as_str().is_empty() {
        return Err(missing("provides"));
    }

    Ok(ResolvedFunction {
        name: f.name.clone(),
        kind,
        needs,
        needs_for_platform: f.needs_for_platform.clone(),
        provides,
        path_filters: f.path_filters.clone(),
        config_defs: f.config_defs.clone(),
        owner: f.owner.clone(),
        monorail_component: f.monorail_component.clone(),
        impls: f.impls.clone(),
    })
}

fn prefer<T: Clone>(project: &[T], service: &[T]) -> Vec<T> {
    if project.is_empty() {
        service.to_vec()
    } else {
        project.to_vec()
    }
}

fn prefer_str(project: &str, service: &str) -> String {
    if project.is_empty() {
        service.to_string()
    } else {
        project.to_string()
    }
}
