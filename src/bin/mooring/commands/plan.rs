//! `mooring plan` command

use anyhow::Result;

use crate::cli::PlanArgs;
use mooring::builder::BuildStep;
use mooring::ops::plan_build;
use mooring::resolver::EnvAction;
use mooring::util::{GlobalContext, Shell};

pub fn execute(args: PlanArgs, shell: &Shell) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let (recipe, request) = super::build_request(&ctx, &args.request)?;

    let plan = plan_build(&recipe, &request)?;

    if shell.is_json() {
        println!("{}", plan.to_json()?);
        return Ok(());
    }

    println!("{}@{} ({})", plan.package, plan.version, plan.toolchain);
    println!();
    println!("Options:");
    for (name, value) in &plan.options {
        println!("  {}={}", name, value);
    }

    if !plan.dependencies.is_empty() {
        println!();
        println!("Dependencies:");
        for dep in &plan.dependencies {
            println!("  {}", dep);
        }
    }

    if !plan.environment.is_empty() {
        println!();
        println!("Environment:");
        for (name, action) in plan.environment.iter() {
            match action {
                EnvAction::Set(value) => println!("  {}={}", name, value),
                EnvAction::Unset => println!("  unset {}", name),
            }
        }
    }

    println!();
    println!("Steps:");
    for (i, step) in plan.steps.iter().enumerate() {
        let kind = match step {
            BuildStep::Command(_) => step.phase().as_str(),
            BuildStep::Copy(_) => "copy",
        };
        println!("  {:>2}. [{}] {}", i + 1, kind, step.describe());
    }

    Ok(())
}
