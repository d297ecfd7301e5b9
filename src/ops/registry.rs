//! Recipe lookup.
//!
//! Built-in recipes are embedded in the binary. Directories listed in the
//! `[recipes] paths` config are searched first, so a local `yambo.toml`
//! replaces the built-in one.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::recipe::{Recipe, RecipeError};
use crate::util::diagnostic::RecipeSourceError;
use crate::util::fs::files_with_extension;

const BUILTIN: &[(&str, &str)] = &[
    ("devicexlib", include_str!("../../recipes/devicexlib.toml")),
    ("py-yambopy", include_str!("../../recipes/py-yambopy.toml")),
    ("yambo", include_str!("../../recipes/yambo.toml")),
];

/// Where a recipe comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeOrigin {
    Builtin,
    File(PathBuf),
}

impl fmt::Display for RecipeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeOrigin::Builtin => f.write_str("built-in"),
            RecipeOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Known recipes keyed by name.
#[derive(Debug, Clone, Default)]
pub struct RecipeRegistry {
    entries: BTreeMap<String, RecipeOrigin>,
}

impl RecipeRegistry {
    /// Only the built-in recipes.
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(name, _)| (name.to_string(), RecipeOrigin::Builtin))
            .collect();
        RecipeRegistry { entries }
    }

    /// Built-in recipes plus `*.toml` files under `paths`.
    ///
    /// Earlier paths win over later ones, and every path wins over the
    /// built-in recipes. Missing directories are skipped.
    pub fn with_search_paths(paths: &[PathBuf]) -> Self {
        let mut registry = RecipeRegistry::builtin();
        for dir in paths.iter().rev() {
            if !dir.is_dir() {
                tracing::debug!("recipe path {} does not exist", dir.display());
                continue;
            }
            for file in files_with_extension(dir, "toml") {
                let Some(name) = file.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                tracing::debug!(recipe = name, path = %file.display(), "found recipe");
                registry
                    .entries
                    .insert(name.to_string(), RecipeOrigin::File(file.clone()));
            }
        }
        registry
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecipeOrigin)> {
        self.entries.iter().map(|(name, origin)| (name.as_str(), origin))
    }

    pub fn origin(&self, name: &str) -> Option<&RecipeOrigin> {
        self.entries.get(name)
    }

    /// Load a recipe by name, or from a path when `name` names a file.
    pub fn load(&self, name: &str) -> Result<Recipe> {
        let path = Path::new(name);
        if path.extension().is_some_and(|e| e == "toml") && path.is_file() {
            return load_file(path);
        }

        match self.entries.get(name) {
            Some(RecipeOrigin::File(path)) => load_file(path),
            Some(RecipeOrigin::Builtin) => {
                let contents = BUILTIN
                    .iter()
                    .find(|(n, _)| *n == name)
                    .map(|(_, c)| *c)
                    .with_context(|| format!("built-in recipe `{}` is missing", name))?;
                parse(name, contents)
            }
            None => bail!(
                "no recipe named `{}`\n\
                 available recipes: {}",
                name,
                self.names().collect::<Vec<_>>().join(", ")
            ),
        }
    }
}

fn load_file(path: &Path) -> Result<Recipe> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read recipe {}", path.display()))?;
    parse(&path.display().to_string(), &contents)
}

fn parse(name: &str, contents: &str) -> Result<Recipe> {
    match Recipe::from_toml(contents) {
        Ok(recipe) => Ok(recipe),
        Err(RecipeError::Parse(err)) => Err(RecipeSourceError::from_toml(name, contents, &err).into()),
        Err(err) => Err(anyhow::Error::new(err).context(format!("failed to load recipe `{}`", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::write_sample_recipe;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_recipes_load() {
        let registry = RecipeRegistry::builtin();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["devicexlib", "py-yambopy", "yambo"]
        );
        for name in ["devicexlib", "py-yambopy", "yambo"] {
            let recipe = registry.load(name).unwrap();
            assert_eq!(recipe.name, name);
        }
    }

    #[test]
    fn test_search_path_overrides_builtin() {
        let tmp = TempDir::new().unwrap();
        let sample = write_sample_recipe(tmp.path());
        std::fs::rename(&sample, tmp.path().join("yambo.toml")).unwrap();

        let registry = RecipeRegistry::with_search_paths(&[tmp.path().to_path_buf()]);
        assert_eq!(
            registry.origin("yambo"),
            Some(&RecipeOrigin::File(tmp.path().join("yambo.toml")))
        );
        // The file declares itself as `sample`.
        assert_eq!(registry.load("yambo").unwrap().name, "sample");
    }

    #[test]
    fn test_load_by_path() {
        let tmp = TempDir::new().unwrap();
        let path = write_sample_recipe(tmp.path());
        let recipe = RecipeRegistry::builtin()
            .load(path.to_str().unwrap())
            .unwrap();
        assert_eq!(recipe.name, "sample");
    }

    #[test]
    fn test_unknown_recipe() {
        let err = RecipeRegistry::builtin().load("quantum-espresso").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("no recipe named `quantum-espresso`"));
        assert!(msg.contains("yambo"));
    }

    #[test]
    fn test_parse_error_carries_source() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.toml");
        std::fs::write(&path, "[package]\nname = \n").unwrap();

        let err = RecipeRegistry::with_search_paths(&[tmp.path().to_path_buf()])
            .load("broken")
            .unwrap_err();
        let diag = err.downcast_ref::<RecipeSourceError>().unwrap();
        assert!(diag.span.is_some());
    }
}
