//! Decision table row selection.

use crate::core::guard::GuardContext;
use crate::core::recipe::{DecisionTable, TableRow};

use super::errors::ResolveError;
use super::ResolveInput;

/// Whether the build is threaded for the purposes of `table`.
fn threaded(table: &DecisionTable, input: &ResolveInput<'_>) -> bool {
    table
        .threading
        .as_deref()
        .is_some_and(|option| input.config.is_enabled(option))
}

/// Pick the first row matching the toolchain family, threading state and
/// row guard.
///
/// Returns `None` for an optional table without a matching row.
pub fn select_row<'t>(
    table: &'t DecisionTable,
    input: &ResolveInput<'_>,
) -> Result<Option<&'t TableRow>, ResolveError> {
    let threaded = threaded(table, input);
    let ctx = GuardContext::new(input.config, input.toolchain).with_deps(input.deps);

    let row = table.rows.iter().find(|row| {
        row.family.map_or(true, |f| f == input.toolchain.family)
            && row.threaded.map_or(true, |t| t == threaded)
            && row.when.eval(&ctx)
    });

    match row {
        Some(row) => {
            tracing::debug!(table = %table.name, threaded, "row selected");
            Ok(Some(row))
        }
        None if table.optional => Ok(None),
        None => Err(ResolveError::UnsupportedCombination {
            requested_by: format!("table `{}`", table.name),
            toolchain: input.toolchain.to_string(),
            message: format!(
                "no row of `{}` covers this toolchain ({})",
                table.name,
                if threaded { "threaded" } else { "sequential" }
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::configuration::{parse_settings, Configuration};
    use crate::core::recipe::Recipe;
    use crate::core::template::Stage;
    use crate::core::toolchain::Toolchain;
    use crate::test_support::fixtures::{sample_deps, SAMPLE_RECIPE};

    fn select(settings: &str, toolchain: &str) -> Result<Option<String>, ResolveError> {
        let recipe = Recipe::from_toml(SAMPLE_RECIPE).unwrap();
        let toolchain: Toolchain = toolchain.parse().unwrap();
        let settings = parse_settings(settings).unwrap();
        let config = Configuration::build(&recipe, None, &settings, &toolchain).unwrap();
        let deps = sample_deps();
        let stage = Stage::default();
        let input = ResolveInput {
            config: &config,
            toolchain: &toolchain,
            deps: &deps,
            stage: &stage,
        };
        let table = recipe.table("blas").unwrap();
        Ok(select_row(table, &input)?.map(|row| row.args[0].to_string()))
    }

    #[test]
    fn test_threaded_row() {
        let arg = select("+mkl +openmp", "intel").unwrap().unwrap();
        assert!(arg.contains("mkl_intel_thread"), "{}", arg);

        let arg = select("+mkl ~openmp", "intel").unwrap().unwrap();
        assert!(arg.contains("mkl_sequential"), "{}", arg);
    }

    #[test]
    fn test_fallback_row() {
        let arg = select("~mkl", "gcc").unwrap().unwrap();
        assert_eq!(arg, "--with-blas-libs={blas.libs}");
    }

    #[test]
    fn test_unsupported_combination() {
        let err = select("+mkl", "gcc").unwrap_err();
        assert_eq!(err.subject(), "table `blas`");
    }
}
