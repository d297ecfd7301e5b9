//! Build plan execution with progress reporting.

use std::time::Instant;

use anyhow::{Context, Result};

use crate::builder::plan::{BuildPlan, BuildStep, CommandStep, Phase};
use crate::resolver::{EnvAction, Environment};
use crate::util::fs::copy_dir_all;
use crate::util::process::ProcessBuilder;
use crate::util::shell::{format_duration, Shell, Status};

/// Runs external commands for the executor.
pub trait CommandRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<()>;
}

/// Runs commands on the host with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<()> {
        cmd.status_and_check()
    }
}

/// Translate a plan command into a process with the build environment.
pub fn command_for(step: &CommandStep, env: &Environment) -> ProcessBuilder {
    let mut cmd = ProcessBuilder::new(&step.program)
        .args(&step.args)
        .cwd(&step.cwd);

    for (name, action) in env.iter() {
        cmd = match action {
            EnvAction::Set(value) => cmd.env(name, value),
            EnvAction::Unset => cmd.env_remove(name),
        };
    }
    cmd
}

/// Outcome of a completed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub commands: usize,
    pub copies: usize,
}

/// Build executor with progress tracking.
pub struct PlanExecutor<'a, R = SystemRunner> {
    shell: &'a Shell,
    runner: R,
}

impl<'a> PlanExecutor<'a> {
    pub fn new(shell: &'a Shell) -> Self {
        PlanExecutor {
            shell,
            runner: SystemRunner,
        }
    }
}

impl<'a, R: CommandRunner> PlanExecutor<'a, R> {
    /// Use a different command runner.
    pub fn with_runner<S: CommandRunner>(self, runner: S) -> PlanExecutor<'a, S> {
        PlanExecutor {
            shell: self.shell,
            runner,
        }
    }

    /// Execute every step of `plan` in order, stopping at the first failure.
    pub fn execute(&self, plan: &BuildPlan) -> Result<ExecutionSummary> {
        let start = Instant::now();
        let mut summary = ExecutionSummary {
            commands: 0,
            copies: 0,
        };

        for step in &plan.steps {
            let status = match step.phase() {
                Phase::Configure => Status::Configuring,
                Phase::Build => Status::Building,
                Phase::Install => Status::Installing,
            };

            match step {
                BuildStep::Command(cmd) => {
                    let process = command_for(cmd, &plan.environment);
                    let label = if self.shell.is_verbose() {
                        process.display_command()
                    } else {
                        format!("{} {}", plan.package, step.phase().as_str())
                    };

                    tracing::info!(phase = step.phase().as_str(), command = %process.display_command(), "running");
                    let spinner = self.shell.spinner(status, label);
                    self.runner
                        .run(&process)
                        .with_context(|| format!("{} step failed for `{}`", step.phase().as_str(), plan.package))?;
                    let elapsed = spinner.finish();
                    tracing::debug!(elapsed = %format_duration(elapsed), "step finished");
                    summary.commands += 1;
                }
                BuildStep::Copy(copy) => {
                    self.shell.status(status, step.describe());
                    copy_dir_all(&copy.from, &copy.to)?;
                    summary.copies += 1;
                }
            }
        }

        self.shell.status(
            Status::Finished,
            format!(
                "{}@{} in {}",
                plan.package,
                plan.version,
                format_duration(start.elapsed())
            ),
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::plan::{BuildDirs, CopyStep};
    use crate::test_support::{MockProcessOutput, MockRunner};
    use crate::util::shell::{ColorChoice, ShellMode, Verbosity};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn quiet_shell() -> Shell {
        Shell::new(ShellMode::Human {
            verbosity: Verbosity::Quiet,
            color: ColorChoice::Never,
        })
    }

    fn plan(steps: Vec<BuildStep>) -> BuildPlan {
        let mut environment = Environment::new();
        environment.set("MPICC", "mpicc");
        environment.unset("CPP");
        BuildPlan {
            package: "sample".into(),
            version: "2.1".into(),
            toolchain: "gcc".into(),
            options: BTreeMap::new(),
            dirs: BuildDirs::in_source("/src", "/opt"),
            dependencies: Vec::new(),
            environment,
            configure_args: Vec::new(),
            targets: Vec::new(),
            steps,
        }
    }

    fn command(phase: Phase, program: &str, args: &[&str]) -> BuildStep {
        BuildStep::Command(CommandStep {
            phase,
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: "/src".into(),
        })
    }

    #[test]
    fn test_command_for_applies_environment() {
        let plan = plan(vec![command(Phase::Build, "make", &["yambo"])]);
        let BuildStep::Command(step) = &plan.steps[0] else {
            unreachable!()
        };
        let cmd = command_for(step, &plan.environment);
        assert_eq!(cmd.display_command(), "make yambo");
        assert_eq!(cmd.get_envs(), vec![("MPICC", "mpicc")]);
        assert_eq!(cmd.get_env_removed(), ["CPP".to_string()]);
    }

    #[test]
    fn test_execute_runs_steps_in_order() {
        let shell = quiet_shell();
        let runner = MockRunner::new();
        let plan = plan(vec![
            command(Phase::Configure, "/src/configure", &["--enable-mpi"]),
            command(Phase::Build, "make", &["core"]),
        ]);

        let summary = PlanExecutor::new(&shell)
            .with_runner(runner.clone())
            .execute(&plan)
            .unwrap();

        assert_eq!(summary.commands, 2);
        assert_eq!(runner.history(), vec!["/src/configure --enable-mpi", "make core"]);
    }

    #[test]
    fn test_execute_stops_on_failure() {
        let shell = quiet_shell();
        let mut runner = MockRunner::new();
        runner.expect("make core", MockProcessOutput::failure(2, "no rule"));
        let plan = plan(vec![
            command(Phase::Build, "make", &["core"]),
            command(Phase::Install, "make", &["install"]),
        ]);

        let err = PlanExecutor::new(&shell)
            .with_runner(runner.clone())
            .execute(&plan)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("build step failed"));
        assert_eq!(runner.history().len(), 1);
    }

    #[test]
    fn test_execute_copies_trees() {
        let tmp = TempDir::new().unwrap();
        let bin = tmp.path().join("build/bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("yambo"), "binary").unwrap();

        let shell = quiet_shell();
        let plan = plan(vec![BuildStep::Copy(CopyStep {
            from: bin,
            to: tmp.path().join("prefix/bin"),
        })]);

        let summary = PlanExecutor::new(&shell)
            .with_runner(MockRunner::new())
            .execute(&plan)
            .unwrap();
        assert_eq!(summary.copies, 1);
        assert!(tmp.path().join("prefix/bin/yambo").exists());
    }
}
