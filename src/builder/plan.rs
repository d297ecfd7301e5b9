//! Build plan generation.
//!
//! A BuildPlan is the fully resolved recipe for one build: the configure
//! arguments, the environment, the targets, and the ordered commands that
//! configure, build and install the package. Plans are plain data and
//! serialize to JSON.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::option::OptionValue;
use crate::core::recipe::{BuildSystem, InstallMethod, Recipe};
use crate::resolver::Environment;

/// A complete build plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub package: String,
    pub version: String,
    pub toolchain: String,
    /// Option values the plan was resolved from.
    pub options: BTreeMap<String, OptionValue>,
    pub dirs: BuildDirs,
    /// Active dependency requirements, e.g. `libxc@2.0.3:3.0.0` or
    /// `hdf5 +fortran+mpi`.
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub environment: Environment,
    pub configure_args: Vec<String>,
    pub targets: Vec<String>,
    /// All steps in execution order.
    pub steps: Vec<BuildStep>,
}

/// Directories a build works in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDirs {
    pub source: PathBuf,
    pub build: PathBuf,
    pub prefix: PathBuf,
}

impl BuildDirs {
    /// Build in the source tree.
    pub fn in_source(source: impl Into<PathBuf>, prefix: impl Into<PathBuf>) -> Self {
        let source = source.into();
        BuildDirs {
            build: source.clone(),
            source,
            prefix: prefix.into(),
        }
    }
}

/// Build phase a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Configure,
    Build,
    Install,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Configure => "configure",
            Phase::Build => "build",
            Phase::Install => "install",
        }
    }
}

/// A step in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BuildStep {
    /// Run an external program
    Command(CommandStep),
    /// Copy a directory tree
    Copy(CopyStep),
}

impl BuildStep {
    pub fn phase(&self) -> Phase {
        match self {
            BuildStep::Command(cmd) => cmd.phase,
            BuildStep::Copy(_) => Phase::Install,
        }
    }

    /// One-line description for status output.
    pub fn describe(&self) -> String {
        match self {
            BuildStep::Command(cmd) => cmd.display_command(),
            BuildStep::Copy(copy) => {
                format!("{} -> {}", copy.from.display(), copy.to.display())
            }
        }
    }
}

/// An external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStep {
    pub phase: Phase,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl CommandStep {
    fn new(phase: Phase, program: impl Into<String>, cwd: &Path) -> Self {
        CommandStep {
            phase,
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().map(|a| {
            if a.contains(' ') {
                format!("'{}'", a)
            } else {
                a.clone()
            }
        }));
        parts.join(" ")
    }
}

/// A directory copy into the install prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyStep {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Tool names used when generating steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanTools {
    pub make: String,
    pub python: String,
    /// Parallel jobs passed to make; `None` lets make decide.
    pub jobs: Option<usize>,
}

impl Default for PlanTools {
    fn default() -> Self {
        PlanTools {
            make: "make".to_string(),
            python: "python3".to_string(),
            jobs: None,
        }
    }
}

/// Generate the ordered steps for `recipe`.
pub fn generate_steps(
    recipe: &Recipe,
    configure_args: &[String],
    targets: &[String],
    dirs: &BuildDirs,
    tools: &PlanTools,
) -> Vec<BuildStep> {
    let mut steps = Vec::new();

    match recipe.build_system {
        BuildSystem::Autotools => {
            let configure = dirs.source.join("configure");
            steps.push(BuildStep::Command(
                CommandStep::new(Phase::Configure, configure.display().to_string(), &dirs.build)
                    .arg(format!("--prefix={}", dirs.prefix.display()))
                    .args(configure_args.iter().cloned()),
            ));

            let mut make = CommandStep::new(Phase::Build, &tools.make, &dirs.build);
            if let (true, Some(jobs)) = (recipe.build.parallel, tools.jobs) {
                make = make.arg(format!("-j{}", jobs));
            }
            steps.push(BuildStep::Command(make.args(targets.iter().cloned())));
        }
        BuildSystem::Python => {}
    }

    match &recipe.install {
        InstallMethod::Make => steps.push(BuildStep::Command(
            CommandStep::new(Phase::Install, &tools.make, &dirs.build).arg("install"),
        )),
        InstallMethod::Copy { trees } => {
            for tree in trees {
                steps.push(BuildStep::Copy(CopyStep {
                    from: dirs.build.join(&tree.from),
                    to: dirs.prefix.join(&tree.to),
                }));
            }
        }
        InstallMethod::Pip => steps.push(BuildStep::Command(
            CommandStep::new(Phase::Install, &tools.python, &dirs.source)
                .args(["-m", "pip", "install", "--no-deps", "--prefix"])
                .arg(dirs.prefix.display().to_string())
                .arg("."),
        )),
        InstallMethod::Skip => {}
    }

    steps
}

impl BuildPlan {
    /// Commands of one phase.
    pub fn commands(&self, phase: Phase) -> impl Iterator<Item = &CommandStep> {
        self.steps.iter().filter_map(move |step| match step {
            BuildStep::Command(cmd) if cmd.phase == phase => Some(cmd),
            _ => None,
        })
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::SAMPLE_RECIPE;

    fn dirs() -> BuildDirs {
        BuildDirs::in_source("/src/sample", "/opt/sample")
    }

    #[test]
    fn test_autotools_steps() {
        let recipe = Recipe::from_toml(SAMPLE_RECIPE).unwrap();
        let tools = PlanTools {
            jobs: Some(8),
            ..PlanTools::default()
        };
        let steps = generate_steps(
            &recipe,
            &["--enable-mpi".to_string()],
            &["core".to_string()],
            &dirs(),
            &tools,
        );

        assert_eq!(steps.len(), 3);
        match &steps[0] {
            BuildStep::Command(cmd) => {
                assert_eq!(cmd.phase, Phase::Configure);
                assert_eq!(cmd.program, "/src/sample/configure");
                assert_eq!(cmd.args, vec!["--prefix=/opt/sample", "--enable-mpi"]);
            }
            other => panic!("unexpected step {:?}", other),
        }
        // The sample recipe disables parallel make.
        match &steps[1] {
            BuildStep::Command(cmd) => assert_eq!(cmd.args, vec!["core"]),
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(
            steps[2],
            BuildStep::Copy(CopyStep {
                from: PathBuf::from("/src/sample/bin"),
                to: PathBuf::from("/opt/sample/bin"),
            })
        );
    }

    #[test]
    fn test_parallel_make_uses_jobs() {
        let recipe = Recipe::from_toml(
            r#"
[package]
name = "lib"

[build]
targets = ["all"]
"#,
        )
        .unwrap();
        let tools = PlanTools {
            jobs: Some(4),
            ..PlanTools::default()
        };
        let steps = generate_steps(&recipe, &[], &["all".to_string()], &dirs(), &tools);

        let descriptions: Vec<String> = steps.iter().map(BuildStep::describe).collect();
        assert_eq!(
            descriptions,
            vec![
                "/src/sample/configure --prefix=/opt/sample",
                "make -j4 all",
                "make install",
            ]
        );
    }

    #[test]
    fn test_python_steps() {
        let recipe = Recipe::from_toml(
            r#"
[package]
name = "py-tool"
build-system = "python"

[install]
method = "pip"
"#,
        )
        .unwrap();
        let steps = generate_steps(&recipe, &[], &[], &dirs(), &PlanTools::default());

        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0].describe(),
            "python3 -m pip install --no-deps --prefix /opt/sample ."
        );
    }
}
