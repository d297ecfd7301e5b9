//! Command implementations

pub mod args;
pub mod build;
pub mod completions;
pub mod env;
pub mod info;
pub mod list;
pub mod plan;
pub mod toolchain;
pub mod validate;

use anyhow::{Context, Result};

use crate::cli::RequestArgs;
use mooring::builder::detect::detect_toolchain;
use mooring::builder::{BuildDirs, PlanTools};
use mooring::core::dependency::{DependencyShorthand, DependencyTable, ResolvedDependency};
use mooring::core::{parse_settings, Recipe, Toolchain};
use mooring::ops::{BuildRequest, RecipeRegistry};
use mooring::util::GlobalContext;

/// Where the toolchain of a request came from.
pub enum ToolchainSource {
    CommandLine,
    Config,
    Detected(std::path::PathBuf),
}

/// Pick the toolchain: command line, then config, then detection.
pub fn resolve_toolchain(ctx: &GlobalContext, explicit: Option<&str>) -> Result<(Toolchain, ToolchainSource)> {
    if let Some(raw) = explicit {
        let toolchain = raw.parse().with_context(|| format!("invalid --toolchain `{}`", raw))?;
        return Ok((toolchain, ToolchainSource::CommandLine));
    }

    if let Some(raw) = &ctx.config().toolchain.default {
        let toolchain = raw
            .parse()
            .with_context(|| format!("invalid `[toolchain] default` in {}", ctx.project_config_path().display()))?;
        return Ok((toolchain, ToolchainSource::Config));
    }

    let detected = detect_toolchain()?;
    tracing::info!("detected {} at {}", detected.toolchain, detected.path.display());
    Ok((detected.toolchain, ToolchainSource::Detected(detected.path)))
}

pub fn registry(ctx: &GlobalContext) -> RecipeRegistry {
    RecipeRegistry::with_search_paths(&ctx.config().recipes.paths)
}

/// Load the recipe a request names.
pub fn load_recipe(ctx: &GlobalContext, name: &str) -> Result<Recipe> {
    registry(ctx).load(name)
}

fn load_deps(ctx: &GlobalContext, args: &RequestArgs) -> Result<DependencyTable> {
    let file = args
        .deps
        .as_ref()
        .map(|p| ctx.resolve_path(p))
        .or_else(|| ctx.config().deps.file.clone());

    let mut deps = match file {
        Some(path) => DependencyTable::load(&path)?,
        None => DependencyTable::new(),
    };

    for raw in &args.dep {
        let shorthand: DependencyShorthand = raw.parse()?;
        let (name, dep): (String, ResolvedDependency) = shorthand.into();
        let dep = match dep.prefix {
            Some(ref prefix) => {
                let prefix = ctx.resolve_path(prefix);
                dep.with_prefix(prefix)
            }
            None => dep,
        };
        deps.insert(name, dep);
    }
    Ok(deps)
}

/// Turn command-line arguments into a recipe and a build request.
pub fn build_request(ctx: &GlobalContext, args: &RequestArgs) -> Result<(Recipe, BuildRequest)> {
    let recipe = load_recipe(ctx, &args.recipe)?;
    let (toolchain, _) = resolve_toolchain(ctx, args.toolchain.as_deref())?;

    let source = ctx.resolve_path(&args.source);
    let dirs = BuildDirs {
        build: args
            .build_dir
            .as_ref()
            .map(|p| ctx.resolve_path(p))
            .unwrap_or_else(|| source.clone()),
        prefix: args
            .prefix
            .as_ref()
            .map(|p| ctx.resolve_path(p))
            .unwrap_or_else(|| source.join("install")),
        source,
    };

    let config = ctx.config();
    let defaults = PlanTools::default();
    let tools = PlanTools {
        make: config.toolchain.make.clone().unwrap_or(defaults.make),
        python: config.toolchain.python.clone().unwrap_or(defaults.python),
        jobs: args.jobs.or(config.build.jobs),
    };

    let mut request = BuildRequest::new(toolchain, dirs);
    request.settings = parse_settings(&args.spec)?;
    request.version = args
        .package_version
        .as_deref()
        .map(str::parse)
        .transpose()
        .with_context(|| format!("invalid --version for `{}`", recipe.name))?;
    request.deps = load_deps(ctx, args)?;
    request.tools = tools;

    Ok((recipe, request))
}
