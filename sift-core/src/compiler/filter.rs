//! Path-filter inclusion

use glob::Pattern;

use super::error::{CompileError, Result};
use crate::domain::{FunctionKind, ResolvedFunction};

/// Decide whether a function takes part in a run over `changed_paths`.
///
/// Isolators are always included since other functions depend on their
/// output. Analyzers are included when they have no filters, when there are
/// no changed paths, or when any path matches any filter.
pub fn include_function(function: &ResolvedFunction, changed_paths: &[String]) -> Result<bool> {
    if function.kind == FunctionKind::Isolator || function.path_filters.is_empty() {
        return Ok(true);
    }

    let patterns = function
        .path_filters
        .iter()
        .map(|filter| {
            Pattern::new(filter).map_err(|e| {
                CompileError::config(format!(
                    "function {}: invalid path filter {:?}: {}",
                    function.name, filter, e
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if changed_paths.is_empty() {
        return Ok(true);
    }

    Ok(changed_paths
        .iter()
        .any(|path| patterns.iter().any(|p| p.matches(path))))
}
