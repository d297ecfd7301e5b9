//! `mooring toolchain` command

use anyhow::Result;

use super::ToolchainSource;
use crate::cli::{ToolchainArgs, ToolchainCommands};
use mooring::builder::detect::{detect_toolchain, CANDIDATES};
use mooring::util::diagnostic::suggestions;
use mooring::util::GlobalContext;

pub fn execute(args: ToolchainArgs) -> Result<()> {
    match args.command {
        ToolchainCommands::Show => show_toolchain(),
        ToolchainCommands::Detect => detect(),
    }
}

fn show_toolchain() -> Result<()> {
    let ctx = GlobalContext::new()?;
    let explicit = std::env::var("MOORING_TOOLCHAIN").ok();
    let (toolchain, source) = super::resolve_toolchain(&ctx, explicit.as_deref())?;

    println!("Toolchain: {}", toolchain);
    match source {
        ToolchainSource::CommandLine => println!("  from:     MOORING_TOOLCHAIN"),
        ToolchainSource::Config => println!("  from:     config ([toolchain] default)"),
        ToolchainSource::Detected(path) => println!("  from:     {}", path.display()),
    }

    println!();
    println!("Environment:");
    for var in ["FC", "CC", "MOORING_TOOLCHAIN"] {
        if let Ok(value) = std::env::var(var) {
            println!("  {}={}", var, value);
        }
    }

    Ok(())
}

fn detect() -> Result<()> {
    match detect_toolchain() {
        Ok(found) => {
            println!("{}", found.toolchain);
            println!("  compiler: {}", found.path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("searched: FC, CC, {}", CANDIDATES.join(", "));
            eprintln!("{}", suggestions::DETECT_TOOLCHAIN);
            Err(e)
        }
    }
}
