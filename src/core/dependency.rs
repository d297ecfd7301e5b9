//! Dependency requirements and the resolved dependency table.
//!
//! Requirements are static recipe data. The resolved table is supplied by
//! whoever resolved the dependency graph: for every dependency it carries
//! the install prefix, link string and any extra fields templates need.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::guard::Guard;
use crate::core::version::{Version, VersionRange};

/// How a dependency is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Build,
    Link,
    Run,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKind::Build => f.write_str("build"),
            DependencyKind::Link => f.write_str("link"),
            DependencyKind::Run => f.write_str("run"),
        }
    }
}

fn default_kinds() -> Vec<DependencyKind> {
    vec![DependencyKind::Build, DependencyKind::Link]
}

/// A dependency declared by a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyRequirement {
    /// Dependency name, also the key templates use (`{name.prefix}`).
    pub name: String,

    /// Acceptable versions.
    #[serde(default)]
    pub version: Option<VersionRange>,

    /// Feature requirements forwarded verbatim to the external resolver.
    #[serde(default)]
    pub features: Option<String>,

    #[serde(default = "default_kinds")]
    pub kinds: Vec<DependencyKind>,

    #[serde(default)]
    pub when: Guard,
}

impl fmt::Display for DependencyRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(v) = &self.version {
            write!(f, "@{}", v)?;
        }
        if let Some(features) = &self.features {
            write!(f, " {}", features)?;
        }
        Ok(())
    }
}

/// A dependency as resolved by the package manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolvedDependency {
    /// Concrete package providing the dependency (`openmpi` for `mpi`).
    pub provider: Option<String>,
    pub version: Option<Version>,
    pub prefix: Option<PathBuf>,
    /// Toolkit home, when it differs from the prefix.
    pub home: Option<PathBuf>,
    /// Link string, e.g. `-L/opt/lib -lscalapack`.
    pub libs: Option<String>,
    /// Any further fields (`mpicc`, `mpifc`, ...), written next to the
    /// known ones.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ResolvedDependency {
    pub fn provided_by(provider: impl Into<String>) -> Self {
        ResolvedDependency {
            provider: Some(provider.into()),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_libs(mut self, libs: impl Into<String>) -> Self {
        self.libs = Some(libs.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Look up a template field.
    pub fn field(&self, field: &str) -> Option<String> {
        match field {
            "prefix" => self.prefix.as_ref().map(|p| p.display().to_string()),
            "home" => self
                .home
                .as_ref()
                .or(self.prefix.as_ref())
                .map(|p| p.display().to_string()),
            "libs" => self.libs.clone(),
            "version" => self.version.as_ref().map(|v| v.to_string()),
            "version.major" => self.version_component(0),
            "version.minor" => self.version_component(1),
            "version.patch" => self.version_component(2),
            "provider" => self.provider.clone(),
            other => self.extra.get(other).cloned(),
        }
    }

    fn version_component(&self, index: usize) -> Option<String> {
        self.version
            .as_ref()
            .and_then(|v| v.component(index))
            .map(|c| c.to_string())
    }
}

/// Resolved dependencies keyed by the name recipes use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyTable {
    entries: BTreeMap<String, ResolvedDependency>,
}

impl DependencyTable {
    pub fn new() -> Self {
        DependencyTable::default()
    }

    /// Load a table from a TOML file with one `[name]` table per dependency.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dependency table: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("failed to parse dependency table: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, dep: ResolvedDependency) {
        self.entries.insert(name.into(), dep);
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedDependency> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether any entry is keyed `name` or provided by `name`.
    pub fn has_provider(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|(key, dep)| key == name || dep.provider.as_deref() == Some(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResolvedDependency)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay `other`; its entries replace same-named ones.
    pub fn merge(&mut self, other: DependencyTable) {
        self.entries.extend(other.entries);
    }
}

/// A `name=prefix` shorthand from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyShorthand {
    pub name: String,
    pub prefix: PathBuf,
}

impl FromStr for DependencyShorthand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some((name, prefix)) = s.split_once('=') else {
            bail!("expected `name=prefix`, got `{}`", s);
        };
        let name = name.trim();
        if name.is_empty() || prefix.trim().is_empty() {
            bail!("expected `name=prefix`, got `{}`", s);
        }
        Ok(DependencyShorthand {
            name: name.to_string(),
            prefix: PathBuf::from(prefix.trim()),
        })
    }
}

impl From<DependencyShorthand> for (String, ResolvedDependency) {
    fn from(s: DependencyShorthand) -> Self {
        (s.name, ResolvedDependency::default().with_prefix(s.prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_table() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("deps.toml");
        std::fs::write(
            &path,
            r#"
[mpi]
provider = "openmpi"
version = "4.1.1"
prefix = "/opt/openmpi"
mpicc = "/opt/openmpi/bin/mpicc"

[scalapack]
prefix = "/opt/scalapack"
libs = "-L/opt/scalapack/lib -lscalapack"
"#,
        )
        .unwrap();

        let table = DependencyTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_provider("openmpi"));
        assert!(table.has_provider("scalapack"));
        assert!(!table.has_provider("mpich"));

        let mpi = table.get("mpi").unwrap();
        assert_eq!(mpi.field("mpicc").as_deref(), Some("/opt/openmpi/bin/mpicc"));
        assert_eq!(mpi.field("version.major").as_deref(), Some("4"));
        assert_eq!(mpi.field("home").as_deref(), Some("/opt/openmpi"));
        assert_eq!(mpi.field("libs"), None);
        assert_eq!(mpi.extra.len(), 1);
    }

    #[test]
    fn test_extra_fields_must_be_strings() {
        assert!(DependencyTable::from_toml("[mpi]
prefix = \"/opt/mpi\"
ranks = 4
").is_err());

        let table = DependencyTable::from_toml("[mpi]
prefx = \"/opt/mpi\"
").unwrap();
        let mpi = table.get("mpi").unwrap();
        assert_eq!(mpi.prefix, None);
        assert_eq!(mpi.field("prefx").as_deref(), Some("/opt/mpi"));
    }

    #[test]
    fn test_requirement_defaults() {
        let req: DependencyRequirement = toml::from_str(
            r#"
name = "libxc"
version = "2.0.3:3.0.0"
"#,
        )
        .unwrap();
        assert!(req.when.is_always());
        assert_eq!(req.kinds, vec![DependencyKind::Build, DependencyKind::Link]);
        assert_eq!(req.to_string(), "libxc@2.0.3:3.0.0");
    }

    #[test]
    fn test_shorthand() {
        let s: DependencyShorthand = "fftw=/opt/fftw".parse().unwrap();
        assert_eq!(s.name, "fftw");
        assert!("fftw".parse::<DependencyShorthand>().is_err());
        assert!("=/opt".parse::<DependencyShorthand>().is_err());
    }
}
