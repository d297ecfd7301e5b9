//! Variant resolution.
//!
//! Given a recipe, a configuration, a toolchain and the resolved
//! dependency table, the resolver checks the configuration against the
//! recipe's conflict rules and produces the configure arguments, the build
//! environment and the build targets.
//!
//! Resolution is a pure function of its inputs: the same inputs always
//! produce identical output.

mod arguments;
mod dependencies;
pub mod environment;
pub mod errors;
pub mod table;
mod targets;
mod validate;

pub use environment::{EnvAction, Environment};
pub use errors::ResolveError;

use crate::core::configuration::Configuration;
use crate::core::dependency::{DependencyRequirement, DependencyTable};
use crate::core::recipe::Recipe;
use crate::core::template::{RenderContext, Stage};
use crate::core::toolchain::Toolchain;

/// Everything one resolution looks at besides the recipe.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
    pub config: &'a Configuration,
    pub toolchain: &'a Toolchain,
    pub deps: &'a DependencyTable,
    pub stage: &'a Stage,
}

impl<'a> ResolveInput<'a> {
    fn render_context<'p>(&self, package: &'p str) -> RenderContext<'p>
    where
        'a: 'p,
    {
        RenderContext {
            package,
            config: self.config,
            toolchain: self.toolchain,
            deps: self.deps,
            stage: self.stage,
        }
    }
}

/// Resolves configurations of one recipe.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    recipe: &'r Recipe,
}

impl<'r> Resolver<'r> {
    pub fn new(recipe: &'r Recipe) -> Self {
        Resolver { recipe }
    }

    pub fn recipe(&self) -> &'r Recipe {
        self.recipe
    }

    /// Check the configuration against the conflict rules.
    ///
    /// Rules are evaluated in declaration order and the first satisfied
    /// rule is reported.
    pub fn validate(
        &self,
        config: &Configuration,
        toolchain: &Toolchain,
        deps: &DependencyTable,
    ) -> Result<(), ResolveError> {
        validate::validate(self.recipe, config, toolchain, deps)
    }

    /// Fold the environment rules into the variables the build changes.
    ///
    /// Validates first, like `resolve_arguments`.
    pub fn resolve_environment(&self, input: &ResolveInput<'_>) -> Result<Environment, ResolveError> {
        self.validate(input.config, input.toolchain, input.deps)?;
        environment::resolve(self.recipe, input)
    }

    /// Produce the ordered configure arguments.
    ///
    /// Validates first; an invalid configuration never yields arguments.
    pub fn resolve_arguments(&self, input: &ResolveInput<'_>) -> Result<Vec<String>, ResolveError> {
        self.validate(input.config, input.toolchain, input.deps)?;
        let args = arguments::resolve(self.recipe, input)?;
        tracing::debug!(recipe = %self.recipe.name, count = args.len(), "configure arguments resolved");
        Ok(args)
    }

    /// The build targets for this configuration.
    pub fn build_targets(&self, input: &ResolveInput<'_>) -> Result<Vec<String>, ResolveError> {
        self.validate(input.config, input.toolchain, input.deps)?;
        Ok(targets::resolve(self.recipe, input))
    }

    /// Dependency requirements active for this configuration.
    pub fn required_dependencies(&self, input: &ResolveInput<'_>) -> Vec<&'r DependencyRequirement> {
        dependencies::required(self.recipe, input)
    }

    /// Check that every active requirement was resolved in range.
    pub fn check_dependencies(&self, input: &ResolveInput<'_>) -> Result<(), ResolveError> {
        dependencies::check(self.recipe, input)
    }
}
