//! `mooring env` command
//!
//! Prints the environment changes as shell statements.

use anyhow::Result;

use crate::cli::RequestArgs;
use mooring::ops::resolve_environment;
use mooring::resolver::EnvAction;
use mooring::util::GlobalContext;

pub fn execute(args: RequestArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let (recipe, request) = super::build_request(&ctx, &args)?;

    let env = resolve_environment(&recipe, &request)?;
    for (name, action) in env.iter() {
        match action {
            EnvAction::Set(value) => println!("export {}={}", name, shell_quote(value)),
            EnvAction::Unset => println!("unset {}", name),
        }
    }
    Ok(())
}

fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c))
    {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
