//! Build target selection.

use crate::core::guard::GuardContext;
use crate::core::recipe::Recipe;

use super::ResolveInput;

/// The recipe's base targets followed by the targets of every matching
/// rule, in declaration order and without duplicates.
pub(super) fn resolve(recipe: &Recipe, input: &ResolveInput<'_>) -> Vec<String> {
    let ctx = GuardContext::new(input.config, input.toolchain).with_deps(input.deps);
    let mut targets: Vec<String> = Vec::new();

    let matching = recipe
        .build
        .target_rules
        .iter()
        .filter(|rule| rule.when.eval(&ctx))
        .flat_map(|rule| rule.targets.iter());

    for target in recipe.build.targets.iter().chain(matching) {
        if !targets.contains(target) {
            targets.push(target.clone());
        }
    }

    targets
}
