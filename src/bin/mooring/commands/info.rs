//! `mooring info` command

use anyhow::Result;

use crate::cli::InfoArgs;
use mooring::core::guard::Guard;
use mooring::core::option::OptionKind;
use mooring::util::GlobalContext;

pub fn execute(args: InfoArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let recipe = super::load_recipe(&ctx, &args.recipe)?;

    println!("{} ({})", recipe.name, recipe.build_system);
    if let Some(description) = &recipe.description {
        println!("  {}", description);
    }
    if let Some(homepage) = &recipe.homepage {
        println!("  {}", homepage);
    }

    let versions: Vec<String> = recipe.versions.iter().map(|v| v.to_string()).collect();
    println!();
    println!("Versions: {}", versions.join(", "));

    if !recipe.options.is_empty() {
        println!();
        println!("Options:");
        for opt in &recipe.options {
            let values = match &opt.kind {
                OptionKind::Bool { .. } => "on|off".to_string(),
                OptionKind::Single { values, .. } => values.join("|"),
                OptionKind::Multi { values, .. } => format!("any of {}", values.join(",")),
            };
            println!(
                "  {:<14} {:<6} default={:<8} [{}]{}",
                opt.name,
                opt.kind.name(),
                opt.default_value().to_string(),
                values,
                when(&opt.when)
            );
            if let Some(description) = &opt.description {
                println!("  {:<14} {}", "", description);
            }
        }
    }

    if !recipe.conflicts.is_empty() {
        println!();
        println!("Conflicts:");
        for rule in &recipe.conflicts {
            println!("  {:<36} when {}", rule.id, rule.when);
        }
    }

    if !recipe.dependencies.is_empty() {
        println!();
        println!("Dependencies:");
        for dep in &recipe.dependencies {
            let kinds: Vec<String> = dep.kinds.iter().map(|k| k.to_string()).collect();
            println!("  {} ({}){}", dep, kinds.join(", "), when(&dep.when));
        }
    }

    if !recipe.tables.is_empty() {
        println!();
        println!("Decision tables:");
        for table in &recipe.tables {
            let threading = table
                .threading
                .as_deref()
                .map(|t| format!(", threaded by `{}`", t))
                .unwrap_or_default();
            println!("  {} ({} rows{})", table.name, table.rows.len(), threading);
        }
    }

    Ok(())
}

fn when(guard: &Guard) -> String {
    if guard.is_always() {
        String::new()
    } else {
        format!(" when {}", guard)
    }
}
