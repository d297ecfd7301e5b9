//! `mooring validate` command

use anyhow::Result;

use crate::cli::RequestArgs;
use mooring::ops::validate_request;
use mooring::util::shell::Status;
use mooring::util::{GlobalContext, Shell};

pub fn execute(args: RequestArgs, shell: &Shell) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let (recipe, request) = super::build_request(&ctx, &args)?;

    let config = validate_request(&recipe, &request)?;

    for (name, value) in config.values() {
        println!("{}={}", name, value);
    }
    shell.status(
        Status::Finished,
        format!(
            "{}@{} with {} passes all {} conflict rules",
            recipe.name,
            config.version(),
            request.toolchain,
            recipe.conflicts.len()
        ),
    );
    Ok(())
}
