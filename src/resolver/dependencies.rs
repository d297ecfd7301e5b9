//! Dependency requirement checks.

use crate::core::dependency::DependencyRequirement;
use crate::core::guard::GuardContext;
use crate::core::recipe::Recipe;

use super::errors::ResolveError;
use super::ResolveInput;

/// Requirements whose guard holds for this configuration.
///
/// `^provider` atoms look at the resolved table, so a requirement can
/// depend on which package provides another one.
pub(super) fn required<'r>(recipe: &'r Recipe, input: &ResolveInput<'_>) -> Vec<&'r DependencyRequirement> {
    let ctx = GuardContext::new(input.config, input.toolchain).with_deps(input.deps);
    recipe
        .dependencies
        .iter()
        .filter(|dep| dep.when.eval(&ctx))
        .collect()
}

/// Check every active requirement against the resolved table.
pub(super) fn check(recipe: &Recipe, input: &ResolveInput<'_>) -> Result<(), ResolveError> {
    for req in required(recipe, input) {
        let Some(resolved) = input.deps.get(&req.name) else {
            return Err(ResolveError::MissingDependency {
                dependency: req.name.clone(),
                field: None,
                requested_by: format!("`{}`", recipe.name),
            });
        };

        match (&req.version, &resolved.version) {
            (Some(range), Some(found)) if !range.contains(found) => {
                return Err(ResolveError::DependencyVersion {
                    dependency: req.name.clone(),
                    required: range.to_string(),
                    found: found.to_string(),
                });
            }
            (Some(range), None) => {
                tracing::warn!("version of `{}` unknown, range `{}` not checked", req.name, range);
            }
            _ => {}
        }
        tracing::debug!(dependency = %req, "requirement satisfied");
    }
    Ok(())
}
