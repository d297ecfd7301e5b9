//! `mooring list` command

use anyhow::Result;

use mooring::util::shell::Status;
use mooring::util::{GlobalContext, Shell};

pub fn execute(shell: &Shell) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let registry = super::registry(&ctx);

    for (name, origin) in registry.iter() {
        match registry.load(name) {
            Ok(recipe) => {
                let version = recipe
                    .preferred_version()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<14} {:<8} {}",
                    name,
                    version,
                    recipe.description.as_deref().unwrap_or("")
                );
                if shell.is_verbose() {
                    println!("{:<14} ({})", "", origin);
                }
            }
            Err(e) => shell.status(Status::Warning, format!("{} ({}): {:#}", name, origin, e)),
        }
    }

    Ok(())
}
