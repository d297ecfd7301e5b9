//! mooring CLI - resolve build recipes into configure arguments and build plans

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use mooring::core::ConfigurationError;
use mooring::resolver::ResolveError;
use mooring::util::diagnostic::{emit, suggestions, RecipeSourceError};
use mooring::util::shell::ColorChoice;
use mooring::util::Shell;

fn main() {
    let cli = Cli::parse();
    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let json = matches!(&cli.command, Commands::Plan(args) if args.json);
    let shell = Shell::from_flags(cli.quiet, cli.verbose, color, json);

    if let Err(e) = run(cli, &shell) {
        report(e, shell.use_color());
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    // Set up logging
    let default_filter = if cli.verbose {
        "mooring=debug"
    } else {
        "mooring=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::List => commands::list::execute(shell),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args, shell),
        Commands::Args(args) => commands::args::execute(args),
        Commands::Env(args) => commands::env::execute(args),
        Commands::Plan(args) => commands::plan::execute(args, shell),
        Commands::Build(args) => commands::build::execute(args, shell),
        Commands::Toolchain(args) => commands::toolchain::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error, with rich rendering for the errors that carry it.
fn report(err: anyhow::Error, color: bool) {
    let err = match err.downcast::<ResolveError>() {
        Ok(e) => return emit(&e.to_diagnostic(), color),
        Err(err) => err,
    };
    let err = match err.downcast::<RecipeSourceError>() {
        Ok(e) => return eprintln!("{:?}", miette::Report::new(e)),
        Err(err) => err,
    };
    let err = match err.downcast::<ConfigurationError>() {
        Ok(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return eprintln!("{}", suggestions::SHOW_OPTIONS);
        }
        Err(err) => err,
    };
    eprintln!("error: {:#}", err);
}
