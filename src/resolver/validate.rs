//! Conflict checking.

use crate::core::configuration::Configuration;
use crate::core::dependency::DependencyTable;
use crate::core::guard::GuardContext;
use crate::core::recipe::Recipe;
use crate::core::toolchain::Toolchain;

use super::errors::ResolveError;

/// Check `config` against every conflict rule in declaration order.
///
/// The first satisfied rule is reported; later rules are not evaluated.
/// `^provider` atoms are checked against `deps`.
pub fn validate(
    recipe: &Recipe,
    config: &Configuration,
    toolchain: &Toolchain,
    deps: &DependencyTable,
) -> Result<(), ResolveError> {
    let ctx = GuardContext::new(config, toolchain).with_deps(deps);

    match recipe.conflicts.iter().find(|rule| rule.when.eval(&ctx)) {
        Some(rule) => {
            tracing::debug!(rule = %rule.id, guard = %rule.when, "conflict matched");
            Err(ResolveError::Conflict {
                rule: rule.id.clone(),
                message: rule.message.clone(),
            })
        }
        None => Ok(()),
    }
}
