//! Configure argument generation.

use crate::core::guard::GuardContext;
use crate::core::option::{OptionKind, OptionValue};
use crate::core::recipe::{Recipe, StepAction};
use crate::core::template::{RenderContext, Template};

use super::errors::ResolveError;
use super::table::select_row;
use super::ResolveInput;

/// Walk the configure steps in order and collect their tokens.
///
/// The configuration must already have passed validation.
pub(super) fn resolve(recipe: &Recipe, input: &ResolveInput<'_>) -> Result<Vec<String>, ResolveError> {
    let guard_ctx = GuardContext::new(input.config, input.toolchain).with_deps(input.deps);
    let render_ctx = input.render_context(&recipe.name);
    let mut args = Vec::new();

    for (i, step) in recipe.configure.iter().enumerate() {
        let label = step.label(i);
        if !step.when.eval(&guard_ctx) {
            tracing::debug!(step = %label, "skipped");
            continue;
        }

        let before = args.len();
        match &step.action {
            StepAction::Option(name) => option_tokens(recipe, name, &render_ctx, &label, &mut args)?,
            StepAction::Args(templates) => render_into(templates, &render_ctx, &label, &mut args)?,
            StepAction::Table(name) => {
                // Declared tables are checked when the recipe loads.
                if let Some(table) = recipe.table(name) {
                    if let Some(row) = select_row(table, input)? {
                        render_into(&row.args, &render_ctx, &label, &mut args)?;
                    }
                }
            }
        }
        tracing::debug!(step = %label, tokens = ?&args[before..], "resolved");
    }

    Ok(args)
}

/// Tokens for one option. An inactive option contributes nothing.
fn option_tokens(
    recipe: &Recipe,
    name: &str,
    ctx: &RenderContext<'_>,
    label: &str,
    out: &mut Vec<String>,
) -> Result<(), ResolveError> {
    let (Some(decl), Some(value)) = (recipe.option(name), ctx.config.get(name)) else {
        return Ok(());
    };

    match (&decl.kind, value) {
        (OptionKind::Bool { flags, .. }, OptionValue::Bool(enabled)) => {
            out.push(flags.token(*enabled).to_string());
        }
        (OptionKind::Single { branches, .. }, OptionValue::Choice(chosen)) => {
            if let Some(templates) = branches.get(chosen) {
                render_into(templates, ctx, label, out)?;
            }
        }
        (OptionKind::Multi { values, flags, .. }, OptionValue::Set(members)) => {
            for (member, pair) in values.iter().zip(flags) {
                out.push(pair.token(members.contains(member)).to_string());
            }
        }
        (kind, value) => {
            tracing::warn!(option = %name, kind = kind.name(), %value, "value does not match option kind");
        }
    }
    Ok(())
}

fn render_into(
    templates: &[Template],
    ctx: &RenderContext<'_>,
    label: &str,
    out: &mut Vec<String>,
) -> Result<(), ResolveError> {
    for template in templates {
        let token = template
            .render(ctx)
            .map_err(|e| ResolveError::from_render(e, label))?;
        out.push(token);
    }
    Ok(())
}
