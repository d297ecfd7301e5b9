//! Global context for mooring operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_dir, load_config, project_config_path, Config};

/// Name of the per-project and per-user data directory.
pub const MOORING_DIR: &str = ".mooring";

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global mooring data (~/.mooring/)
    home: PathBuf,

    /// Merged global and project configuration
    config: Config,
}

impl GlobalContext {
    /// Create a context for the current directory, loading configuration.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a context rooted at `cwd`, loading configuration.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = global_config_dir().unwrap_or_else(|| PathBuf::from(MOORING_DIR));

        let mut ctx = GlobalContext {
            cwd,
            home,
            config: Config::default(),
        };
        ctx.config = load_config(&ctx.config_path(), &ctx.project_config_path());
        ctx
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the mooring home directory (~/.mooring/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// The project configuration file: the nearest `.mooring/config.toml`
    /// in the working directory or one of its ancestors.
    pub fn project_config_path(&self) -> PathBuf {
        self.find_project_root()
            .map(|root| project_config_path(&root))
            .unwrap_or_else(|| project_config_path(&self.cwd))
    }

    /// The nearest ancestor (or the working directory) holding a
    /// `.mooring` directory, other than the mooring home itself.
    pub fn find_project_root(&self) -> Option<PathBuf> {
        self.cwd
            .ancestors()
            .find(|dir| {
                let candidate = dir.join(MOORING_DIR);
                candidate.is_dir() && candidate != self.home
            })
            .map(Path::to_path_buf)
    }

    /// Resolve a path given on the command line against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_paths() {
        let ctx = GlobalContext::new().unwrap();
        assert!(ctx.cwd().is_absolute());
        assert!(ctx.home().ends_with(".mooring"));
        assert!(ctx.config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_project_config_found_upward() {
        let tmp = TempDir::new().unwrap();
        let config = project_config_path(tmp.path());
        std::fs::create_dir_all(config.parent().unwrap()).unwrap();
        std::fs::write(&config, "[build]\njobs = 3\n").unwrap();
        let nested = tmp.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested);
        assert_eq!(ctx.find_project_root().as_deref(), Some(tmp.path()));
        assert_eq!(ctx.project_config_path(), config);
        assert_eq!(ctx.config().build.jobs, Some(3));
    }

    #[test]
    fn test_resolve_path() {
        let ctx = GlobalContext::with_cwd(PathBuf::from("/work"));
        assert_eq!(ctx.resolve_path(Path::new("deps.toml")), PathBuf::from("/work/deps.toml"));
        assert_eq!(ctx.resolve_path(Path::new("/abs")), PathBuf::from("/abs"));
    }
}
