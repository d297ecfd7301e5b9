//! Environment resolution.
//!
//! Rules are folded in declaration order. Each matching rule overwrites
//! earlier assignments to the same variable, so the last matching rule
//! wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::guard::GuardContext;
use crate::core::recipe::Recipe;

use super::errors::ResolveError;
use super::ResolveInput;

/// What happens to one variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvAction {
    Set(String),
    Unset,
}

/// The resolved environment: variables the build changes.
///
/// Variables not listed are inherited unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
    vars: BTreeMap<String, EnvAction>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), EnvAction::Set(value.into()));
    }

    pub fn unset(&mut self, name: impl Into<String>) {
        self.vars.insert(name.into(), EnvAction::Unset);
    }

    pub fn get(&self, name: &str) -> Option<&EnvAction> {
        self.vars.get(name)
    }

    /// The value assigned to `name`, if it is set.
    pub fn value(&self, name: &str) -> Option<&str> {
        match self.vars.get(name) {
            Some(EnvAction::Set(value)) => Some(value),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EnvAction)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

pub(super) fn resolve(recipe: &Recipe, input: &ResolveInput<'_>) -> Result<Environment, ResolveError> {
    let guard_ctx = GuardContext::new(input.config, input.toolchain).with_deps(input.deps);
    let render_ctx = input.render_context(&recipe.name);

    let mut env = Environment::new();
    let mut matched = false;

    for (i, rule) in recipe.environment.rules.iter().enumerate() {
        if !rule.when.eval(&guard_ctx) {
            continue;
        }
        matched = true;
        let requested_by = format!("environment rule #{}", i + 1);

        for (name, template) in &rule.set {
            let value = template
                .render(&render_ctx)
                .map_err(|e| ResolveError::from_render(e, requested_by.as_str()))?;
            tracing::debug!(rule = i + 1, %name, %value, "set");
            env.set(name.clone(), value);
        }
        for name in &rule.unset {
            tracing::debug!(rule = i + 1, %name, "unset");
            env.unset(name.clone());
        }
    }

    if !matched && recipe.environment.require_match {
        return Err(ResolveError::UnsupportedCombination {
            requested_by: "environment rules".to_string(),
            toolchain: input.toolchain.to_string(),
            message: format!("`{}` has no environment rule for this toolchain", recipe.name),
        });
    }

    Ok(env)
}
