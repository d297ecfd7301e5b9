//! `mooring build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use mooring::ops::{build, plan_build, BuildOptions};
use mooring::util::diagnostic::suggestions;
use mooring::util::{GlobalContext, Shell};

pub fn execute(args: BuildArgs, shell: &Shell) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let (recipe, request) = super::build_request(&ctx, &args.request)?;

    let plan = plan_build(&recipe, &request)?;
    let opts = BuildOptions {
        dry_run: args.dry_run,
    };

    match build(&plan, shell, opts) {
        Ok(summary) => {
            tracing::debug!(commands = summary.commands, copies = summary.copies, "build complete");
            Ok(())
        }
        Err(e) => {
            if !shell.is_verbose() {
                eprintln!("{}", suggestions::BUILD_FAILED);
            }
            Err(e)
        }
    }
}
