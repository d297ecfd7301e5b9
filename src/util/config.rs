//! Configuration file support for mooring.
//!
//! Two configuration file locations are read:
//! - Global: `~/.mooring/config.toml` - User-wide defaults
//! - Project: `.mooring/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Relative paths in a
//! config file are resolved against the directory holding the file's
//! `.mooring` directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// mooring configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub toolchain: ToolchainConfig,
    pub recipes: RecipesConfig,
    pub build: BuildConfig,
    pub deps: DepsConfig,
}

/// Toolchain defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Toolchain used when none is given, e.g. `nvhpc@21.9`
    pub default: Option<String>,

    /// make program (default `make`)
    pub make: Option<String>,

    /// Python interpreter for python recipes (default `python3`)
    pub python: Option<String>,
}

/// Recipe search settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipesConfig {
    /// Directories searched for `*.toml` recipes, before the built-in ones
    pub paths: Vec<PathBuf>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Default number of parallel jobs (None = let make decide)
    pub jobs: Option<usize>,
}

/// Resolved dependency table settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepsConfig {
    /// Dependency table loaded when `--deps` is not given
    pub file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        // `<root>/.mooring/config.toml` -> `<root>`
        if let Some(root) = path.parent().and_then(Path::parent) {
            config.resolve_paths(root);
        }
        Ok(config)
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    fn resolve_paths(&mut self, root: &Path) {
        for path in &mut self.recipes.paths {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        if let Some(file) = &mut self.deps.file {
            if file.is_relative() {
                *file = root.join(&*file);
            }
        }
    }

    /// Merge another config into this one (other takes precedence).
    ///
    /// Recipe search paths accumulate, with `other`'s searched first.
    pub fn merge(&mut self, other: Config) {
        if other.toolchain.default.is_some() {
            self.toolchain.default = other.toolchain.default;
        }
        if other.toolchain.make.is_some() {
            self.toolchain.make = other.toolchain.make;
        }
        if other.toolchain.python.is_some() {
            self.toolchain.python = other.toolchain.python;
        }

        if !other.recipes.paths.is_empty() {
            let mut paths = other.recipes.paths;
            paths.append(&mut self.recipes.paths);
            self.recipes.paths = paths;
        }

        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }

        if other.deps.file.is_some() {
            self.deps.file = other.deps.file;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.mooring/config.toml)
/// 2. Global config (~/.mooring/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global mooring config directory (~/.mooring).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".mooring"))
}

/// Get the project config path (.mooring/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".mooring").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(root: &Path, contents: &str) -> PathBuf {
        let path = project_config_path(root);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.toolchain.default.is_none());
        assert!(config.recipes.paths.is_empty());
        assert!(config.build.jobs.is_none());
    }

    #[test]
    fn test_config_load_resolves_paths() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[toolchain]
default = "intel@2021.4"

[recipes]
paths = ["recipes", "/abs/recipes"]

[build]
jobs = 8

[deps]
file = "deps.toml"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.toolchain.default.as_deref(), Some("intel@2021.4"));
        assert_eq!(
            config.recipes.paths,
            vec![tmp.path().join("recipes"), PathBuf::from("/abs/recipes")]
        );
        assert_eq!(config.build.jobs, Some(8));
        assert_eq!(config.deps.file, Some(tmp.path().join("deps.toml")));
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.toolchain.default = Some("gcc".to_string());
        base.build.jobs = Some(4);
        base.recipes.paths = vec![PathBuf::from("/global")];

        let mut project = Config::default();
        project.toolchain.default = Some("nvhpc".to_string());
        project.recipes.paths = vec![PathBuf::from("/project")];

        base.merge(project);

        assert_eq!(base.toolchain.default.as_deref(), Some("nvhpc"));
        assert_eq!(base.build.jobs, Some(4));
        assert_eq!(
            base.recipes.paths,
            vec![PathBuf::from("/project"), PathBuf::from("/global")]
        );
    }

    #[test]
    fn test_load_config_precedence() {
        let global = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let global_path = write_config(
            global.path(),
            "[toolchain]\ndefault = \"gcc\"\nmake = \"gmake\"\n",
        );
        let project_path = write_config(project.path(), "[toolchain]\ndefault = \"oneapi\"\n");

        let config = load_config(&global_path, &project_path);
        assert_eq!(config.toolchain.default.as_deref(), Some("oneapi"));
        assert_eq!(config.toolchain.make.as_deref(), Some("gmake"));
    }

    #[test]
    fn test_broken_config_falls_back() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[build\njobs = ");
        assert_eq!(Config::load_or_default(&path), Config::default());
    }
}
