//! Implementation of `mooring plan`: resolve one build request end to end.

use anyhow::Result;

use crate::builder::plan::{generate_steps, BuildDirs, BuildPlan, PlanTools};
use crate::core::configuration::{Configuration, Setting};
use crate::core::dependency::DependencyTable;
use crate::core::recipe::Recipe;
use crate::core::template::Stage;
use crate::core::toolchain::Toolchain;
use crate::core::version::Version;
use crate::resolver::{Environment, ResolveInput, Resolver};

/// Everything a user asks for when building one recipe.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Option settings, e.g. from `--spec "+mpi ~openmp"`
    pub settings: Vec<Setting>,

    /// Package version (None = the recipe's preferred version)
    pub version: Option<Version>,

    pub toolchain: Toolchain,

    /// Already-resolved dependencies
    pub deps: DependencyTable,

    pub dirs: BuildDirs,

    pub tools: PlanTools,
}

impl BuildRequest {
    pub fn new(toolchain: Toolchain, dirs: BuildDirs) -> Self {
        BuildRequest {
            settings: Vec::new(),
            version: None,
            toolchain,
            deps: DependencyTable::new(),
            dirs,
            tools: PlanTools::default(),
        }
    }

    pub fn stage(&self) -> Stage {
        Stage {
            source: Some(self.dirs.source.clone()),
            build: Some(self.dirs.build.clone()),
            prefix: Some(self.dirs.prefix.clone()),
        }
    }
}

/// Build the configuration and check it against the conflict rules.
pub fn validate_request(recipe: &Recipe, request: &BuildRequest) -> Result<Configuration> {
    let config = Configuration::build(
        recipe,
        request.version.clone(),
        &request.settings,
        &request.toolchain,
    )?;
    Resolver::new(recipe).validate(&config, &request.toolchain, &request.deps)?;
    Ok(config)
}

/// Resolve only the environment of a request.
pub fn resolve_environment(recipe: &Recipe, request: &BuildRequest) -> Result<Environment> {
    let config = validate_request(recipe, request)?;
    let stage = request.stage();
    let input = ResolveInput {
        config: &config,
        toolchain: &request.toolchain,
        deps: &request.deps,
        stage: &stage,
    };
    Ok(Resolver::new(recipe).resolve_environment(&input)?)
}

/// Resolve a request into a complete build plan.
pub fn plan_build(recipe: &Recipe, request: &BuildRequest) -> Result<BuildPlan> {
    let config = validate_request(recipe, request)?;
    let stage = request.stage();
    let input = ResolveInput {
        config: &config,
        toolchain: &request.toolchain,
        deps: &request.deps,
        stage: &stage,
    };
    let resolver = Resolver::new(recipe);

    resolver.check_dependencies(&input)?;
    let dependencies = resolver
        .required_dependencies(&input)
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let environment = resolver.resolve_environment(&input)?;
    let configure_args = resolver.resolve_arguments(&input)?;
    let targets = resolver.build_targets(&input)?;
    let steps = generate_steps(recipe, &configure_args, &targets, &request.dirs, &request.tools);

    tracing::info!(
        recipe = %recipe.name,
        version = %config.version(),
        toolchain = %request.toolchain,
        steps = steps.len(),
        "build planned"
    );

    Ok(BuildPlan {
        package: recipe.name.clone(),
        version: config.version().to_string(),
        toolchain: request.toolchain.to_string(),
        options: config.values().clone(),
        dirs: request.dirs.clone(),
        dependencies,
        environment,
        configure_args,
        targets,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::plan::Phase;
    use crate::core::configuration::parse_settings;
    use crate::resolver::{EnvAction, ResolveError};
    use crate::test_support::fixtures::{sample_deps, SAMPLE_RECIPE};

    fn request(spec: &str, toolchain: &str) -> BuildRequest {
        let mut request = BuildRequest::new(
            toolchain.parse().unwrap(),
            BuildDirs::in_source("/src/sample", "/opt/sample"),
        );
        request.settings = parse_settings(spec).unwrap();
        request.deps = sample_deps();
        request
    }

    #[test]
    fn test_plan_sample() {
        let recipe = Recipe::from_toml(SAMPLE_RECIPE).unwrap();
        let plan = plan_build(&recipe, &request("profile=time,memory", "gcc@11.2.0")).unwrap();

        assert_eq!(plan.package, "sample");
        assert_eq!(plan.version, "2.1");
        assert_eq!(plan.toolchain, "gcc@11.2.0");
        assert_eq!(plan.targets, vec!["core", "memprof"]);
        assert_eq!(
            plan.environment.get("MPICC"),
            Some(&EnvAction::Set("/opt/openmpi/bin/mpicc".into()))
        );

        let configure: Vec<_> = plan.commands(Phase::Configure).collect();
        assert_eq!(configure.len(), 1);
        assert_eq!(configure[0].args[0], "--prefix=/opt/sample");
        assert!(configure[0].args.contains(&"--enable-memory".to_string()));

        let build: Vec<_> = plan.commands(Phase::Build).collect();
        assert_eq!(build[0].args, vec!["core", "memprof"]);
    }

    #[test]
    fn test_plan_rejects_conflict() {
        let recipe = Recipe::from_toml(SAMPLE_RECIPE).unwrap();
        let err = plan_build(&recipe, &request("+cuda", "gcc")).unwrap_err();
        let err = err.downcast_ref::<ResolveError>().unwrap();
        assert_eq!(err.subject(), "cuda-requires-non-gcc-compiler");
    }

    #[test]
    fn test_plan_reports_missing_dependency() {
        let recipe = Recipe::from_toml(SAMPLE_RECIPE).unwrap();
        let err = plan_build(&recipe, &request("+cuda", "nvhpc@21.9")).unwrap_err();
        let err = err.downcast_ref::<ResolveError>().unwrap();
        assert_eq!(err.subject(), "cuda");
    }

    #[test]
    fn test_environment_only() {
        let recipe = Recipe::from_toml(SAMPLE_RECIPE).unwrap();
        let env = resolve_environment(&recipe, &request("", "nvhpc")).unwrap();
        assert_eq!(env.get("MPICC"), Some(&EnvAction::Set("mpicc".into())));
        assert_eq!(env.get("CPP"), Some(&EnvAction::Unset));
    }

    #[test]
    fn test_plan_serializes() {
        let recipe = Recipe::from_toml(SAMPLE_RECIPE).unwrap();
        let plan = plan_build(&recipe, &request("", "gcc")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();
        assert_eq!(json["package"], "sample");
        assert_eq!(json["steps"][0]["type"], "command");
    }
}
