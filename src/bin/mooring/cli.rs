//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

/// mooring - resolve build recipes into configure arguments, environments and build plans
#[derive(Parser)]
#[command(name = "mooring")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available recipes
    List,

    /// Show a recipe's versions, options, conflicts and dependencies
    Info(InfoArgs),

    /// Check a configuration against the recipe's conflict rules
    Validate(RequestArgs),

    /// Print the configure arguments, one per line
    Args(RequestArgs),

    /// Print the build environment changes
    Env(RequestArgs),

    /// Show the full build plan
    Plan(PlanArgs),

    /// Configure, build and install a package
    Build(BuildArgs),

    /// Toolchain detection
    Toolchain(ToolchainArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InfoArgs {
    /// Recipe name or path to a recipe file
    pub recipe: String,
}

/// Arguments describing one build request.
#[derive(Args, Clone)]
pub struct RequestArgs {
    /// Recipe name or path to a recipe file
    pub recipe: String,

    /// Option settings, e.g. "+mpi ~openmp linalg=parallel"
    #[arg(short, long, default_value = "", allow_hyphen_values = true)]
    pub spec: String,

    /// Package version (defaults to the newest release)
    #[arg(long = "version", value_name = "VERSION")]
    pub package_version: Option<String>,

    /// Toolchain as family[@version], e.g. gcc@11.2.0
    #[arg(short, long, env = "MOORING_TOOLCHAIN")]
    pub toolchain: Option<String>,

    /// TOML file with the resolved dependencies
    #[arg(long)]
    pub deps: Option<PathBuf>,

    /// Resolved dependency as name=prefix (repeatable)
    #[arg(long = "dep", value_name = "NAME=PREFIX")]
    pub dep: Vec<String>,

    /// Source directory
    #[arg(long, default_value = ".")]
    pub source: PathBuf,

    /// Build directory (defaults to the source directory)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Install prefix (defaults to <source>/install)
    #[arg(long)]
    pub prefix: Option<PathBuf>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Print the steps without running them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ToolchainArgs {
    #[command(subcommand)]
    pub command: ToolchainCommands,
}

#[derive(Subcommand)]
pub enum ToolchainCommands {
    /// Show the toolchain a request would use
    Show,

    /// Detect the compiler on this machine
    Detect,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: CompletionShell,
}
