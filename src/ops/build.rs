//! Implementation of `mooring build`.

use anyhow::Result;

use crate::builder::executor::{CommandRunner, ExecutionSummary, PlanExecutor};
use crate::builder::plan::BuildPlan;
use crate::util::fs::ensure_dir;
use crate::util::shell::{Shell, Status};

/// Options for the build command.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Print the steps instead of running them
    pub dry_run: bool,
}

/// Run a build plan on this machine.
pub fn build(plan: &BuildPlan, shell: &Shell, opts: BuildOptions) -> Result<ExecutionSummary> {
    build_with(plan, shell, opts, crate::builder::executor::SystemRunner)
}

/// Run a build plan with a custom command runner.
pub fn build_with<R: CommandRunner>(
    plan: &BuildPlan,
    shell: &Shell,
    opts: BuildOptions,
    runner: R,
) -> Result<ExecutionSummary> {
    shell.status(
        Status::Resolving,
        format!("{}@{} with {}", plan.package, plan.version, plan.toolchain),
    );

    if opts.dry_run {
        for step in &plan.steps {
            shell.status(Status::Skipped, step.describe());
        }
        return Ok(ExecutionSummary {
            commands: 0,
            copies: 0,
        });
    }

    ensure_dir(&plan.dirs.build)?;
    ensure_dir(&plan.dirs.prefix)?;

    let summary = PlanExecutor::new(shell).with_runner(runner).execute(plan)?;
    shell.status(
        Status::Installed,
        format!("{} into {}", plan.package, plan.dirs.prefix.display()),
    );
    Ok(summary)
}
