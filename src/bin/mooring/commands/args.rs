//! `mooring args` command

use anyhow::Result;

use crate::cli::RequestArgs;
use mooring::ops::plan_build;
use mooring::util::GlobalContext;

pub fn execute(args: RequestArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let (recipe, request) = super::build_request(&ctx, &args)?;

    let plan = plan_build(&recipe, &request)?;
    for arg in &plan.configure_args {
        println!("{}", arg);
    }
    Ok(())
}
