//! Recipe schema, loading and static validation.
//!
//! A recipe is a TOML document declaring a package's options, conflicts,
//! dependencies, configure steps, decision tables, environment rules and
//! build targets. Everything is checked once at load time so resolution
//! never meets an undeclared option or dependency.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::dependency::DependencyRequirement;
use crate::core::guard::Guard;
use crate::core::option::{FlagPair, OptionDecl, OptionKind};
use crate::core::template::{Scope, Template};
use crate::core::toolchain::ToolchainFamily;
use crate::core::version::Version;

/// Error loading a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("failed to read recipe {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse recipe: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid recipe `{recipe}`: {reason}")]
    Invalid { recipe: String, reason: String },
}

/// The external build system driving the package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    #[default]
    Autotools,
    Python,
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildSystem::Autotools => f.write_str("autotools"),
            BuildSystem::Python => f.write_str("python"),
        }
    }
}

/// A rule that makes a configuration invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConflictRule {
    pub id: String,
    pub when: Guard,
    pub message: String,
}

/// What a configure step emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// The flag tokens of a declared option.
    Option(String),
    /// Literal templates.
    Args(Vec<Template>),
    /// The selected row of a decision table.
    Table(String),
}

/// One entry of the ordered configure step list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureStep {
    pub when: Guard,
    pub action: StepAction,
}

impl ConfigureStep {
    /// Short label used in diagnostics.
    pub fn label(&self, index: usize) -> String {
        match &self.action {
            StepAction::Option(name) => format!("option `{}`", name),
            StepAction::Args(_) => format!("configure step #{}", index + 1),
            StepAction::Table(name) => format!("table `{}`", name),
        }
    }
}

/// One row of a decision table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableRow {
    /// Compiler family this row covers; any family when absent.
    #[serde(default)]
    pub family: Option<ToolchainFamily>,
    /// Threading state this row covers; either when absent.
    #[serde(default)]
    pub threaded: Option<bool>,
    #[serde(default)]
    pub when: Guard,
    pub args: Vec<Template>,
}

/// A small table keyed on toolchain family and threading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionTable {
    pub name: String,
    /// Bool option whose value decides threading.
    #[serde(default)]
    pub threading: Option<String>,
    /// Emit nothing, rather than fail, when no row matches.
    #[serde(default)]
    pub optional: bool,
    #[serde(rename = "row")]
    pub rows: Vec<TableRow>,
}

/// An environment assignment rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvRule {
    #[serde(default)]
    pub when: Guard,
    #[serde(default)]
    pub set: BTreeMap<String, Template>,
    #[serde(default)]
    pub unset: Vec<String>,
}

/// Ordered environment rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EnvironmentRules {
    /// Fail when no rule matches the toolchain.
    pub require_match: bool,
    #[serde(rename = "rule")]
    pub rules: Vec<EnvRule>,
}

/// Extra build targets selected by a guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetRule {
    pub when: Guard,
    pub targets: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Build step settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildSettings {
    /// Targets always built.
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default, rename = "target-rule")]
    pub target_rules: Vec<TargetRule>,
    /// Whether the build tool may run jobs in parallel.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            targets: Vec::new(),
            target_rules: Vec::new(),
            parallel: true,
        }
    }
}

/// A directory copied into the install prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyTree {
    /// Relative to the build directory.
    pub from: PathBuf,
    /// Relative to the install prefix.
    pub to: PathBuf,
}

/// How the package is installed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum InstallMethod {
    /// `make install`
    #[default]
    Make,
    /// Copy directories into the prefix.
    Copy { trees: Vec<CopyTree> },
    /// `pip install` into the prefix.
    Pip,
    /// Nothing to install.
    #[serde(rename = "none")]
    Skip,
}

/// A validated recipe.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub name: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub build_system: BuildSystem,
    /// Known versions, newest first.
    pub versions: Vec<Version>,
    pub options: Vec<OptionDecl>,
    pub conflicts: Vec<ConflictRule>,
    pub dependencies: Vec<DependencyRequirement>,
    pub configure: Vec<ConfigureStep>,
    pub tables: Vec<DecisionTable>,
    pub environment: EnvironmentRules,
    pub build: BuildSettings,
    pub install: InstallMethod,
}

// ---------------------------------------------------------------------------
// On-disk schema
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecipeFile {
    package: PackageSection,
    #[serde(default, rename = "option")]
    options: Vec<OptionSpec>,
    #[serde(default, rename = "conflict")]
    conflicts: Vec<ConflictRule>,
    #[serde(default, rename = "dependency")]
    dependencies: Vec<DependencyRequirement>,
    #[serde(default)]
    configure: Vec<StepSpec>,
    #[serde(default, rename = "table")]
    tables: Vec<DecisionTable>,
    #[serde(default)]
    environment: EnvironmentRules,
    #[serde(default)]
    build: BuildSettings,
    #[serde(default)]
    install: InstallMethod,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PackageSection {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    build_system: BuildSystem,
    #[serde(default)]
    versions: Vec<Version>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindSpec {
    #[default]
    Bool,
    Single,
    Multi,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FlagSpec {
    enable: String,
    disable: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptionSpec {
    name: String,
    #[serde(default)]
    kind: KindSpec,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    default: Option<toml::Value>,
    #[serde(default)]
    values: Vec<String>,
    /// Stem for `--enable-<flag>`/`--disable-<flag>` (bool options).
    #[serde(default)]
    flag: Option<String>,
    #[serde(default)]
    enable: Option<String>,
    #[serde(default)]
    disable: Option<String>,
    /// Per-member spellings (multi options).
    #[serde(default)]
    flags: BTreeMap<String, FlagSpec>,
    /// Per-value templates (single options).
    #[serde(default)]
    branches: BTreeMap<String, Vec<Template>>,
    #[serde(default)]
    when: Guard,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StepSpec {
    #[serde(default)]
    when: Guard,
    #[serde(default)]
    option: Option<String>,
    #[serde(default)]
    args: Option<Vec<Template>>,
    #[serde(default)]
    table: Option<String>,
}

impl Recipe {
    /// Parse and validate a recipe from TOML text.
    pub fn from_toml(contents: &str) -> Result<Recipe, RecipeError> {
        let file: RecipeFile = toml::from_str(contents)?;
        Recipe::from_file(file)
    }

    /// Read, parse and validate a recipe file.
    pub fn load(path: &Path) -> Result<Recipe, RecipeError> {
        let contents = std::fs::read_to_string(path).map_err(|source| RecipeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Recipe::from_toml(&contents)
    }

    /// Look up an option declaration.
    pub fn option(&self, name: &str) -> Option<&OptionDecl> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Look up a decision table.
    pub fn table(&self, name: &str) -> Option<&DecisionTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// The version built when none is requested: the newest numeric version,
    /// or the first declared one when every version is named.
    pub fn preferred_version(&self) -> Option<&Version> {
        self.versions
            .iter()
            .filter(|v| !v.is_named())
            .max()
            .or_else(|| self.versions.first())
    }

    fn from_file(file: RecipeFile) -> Result<Recipe, RecipeError> {
        let name = file.package.name.clone();
        let invalid = |reason: String| RecipeError::Invalid {
            recipe: name.clone(),
            reason,
        };

        let options = file
            .options
            .into_iter()
            .map(|spec| build_option(spec).map_err(&invalid))
            .collect::<Result<Vec<_>, _>>()?;

        let configure = file
            .configure
            .into_iter()
            .enumerate()
            .map(|(i, spec)| {
                let action = match (spec.option, spec.args, spec.table) {
                    (Some(o), None, None) => StepAction::Option(o),
                    (None, Some(a), None) => StepAction::Args(a),
                    (None, None, Some(t)) => StepAction::Table(t),
                    _ => {
                        return Err(invalid(format!(
                            "configure step #{} must set exactly one of `option`, `args`, `table`",
                            i + 1
                        )))
                    }
                };
                Ok(ConfigureStep {
                    when: spec.when,
                    action,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut versions = file.package.versions;
        versions.sort_by(|a, b| b.cmp(a));

        let recipe = Recipe {
            name: file.package.name,
            description: file.package.description,
            homepage: file.package.homepage,
            build_system: file.package.build_system,
            versions,
            options,
            conflicts: file.conflicts,
            dependencies: file.dependencies,
            configure,
            tables: file.tables,
            environment: file.environment,
            build: file.build,
            install: file.install,
        };

        recipe.check().map_err(invalid)?;
        Ok(recipe)
    }

    /// Cross-reference checks: every name a guard, template or step uses
    /// must be declared.
    fn check(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for opt in &self.options {
            if !seen.insert(opt.name.as_str()) {
                return Err(format!("option `{}` declared twice", opt.name));
            }
            if matches!(opt.name.as_str(), "options" | "toolchain" | "package" | "stage") {
                return Err(format!("option name `{}` is reserved", opt.name));
            }
        }

        let mut ids = HashSet::new();
        for rule in &self.conflicts {
            if !ids.insert(rule.id.as_str()) {
                return Err(format!("conflict `{}` declared twice", rule.id));
            }
        }

        let mut tables = HashSet::new();
        for table in &self.tables {
            if !tables.insert(table.name.as_str()) {
                return Err(format!("table `{}` declared twice", table.name));
            }
            if let Some(threading) = &table.threading {
                match self.option(threading) {
                    Some(o) if o.is_bool() => {}
                    _ => {
                        return Err(format!(
                            "table `{}`: threading option `{}` must be a declared bool option",
                            table.name, threading
                        ))
                    }
                }
            }
            for row in &table.rows {
                self.check_guard(&row.when, &format!("table `{}`", table.name))?;
                self.check_templates(&row.args, &format!("table `{}`", table.name))?;
            }
        }

        for opt in &self.options {
            let what = format!("option `{}`", opt.name);
            self.check_guard(&opt.when, &what)?;
            // Option defaults are settled before any dependency is known.
            if let Some(Guard::Provider(name)) = opt
                .when
                .atoms()
                .into_iter()
                .find(|atom| matches!(atom, Guard::Provider(_)))
            {
                return Err(format!(
                    "{}: `^{}` cannot guard an option; providers are only known after options are set",
                    what, name
                ));
            }
            if let OptionKind::Single { branches, .. } = &opt.kind {
                for templates in branches.values() {
                    self.check_templates(templates, &what)?;
                }
            }
        }

        for rule in &self.conflicts {
            self.check_guard(&rule.when, &format!("conflict `{}`", rule.id))?;
        }

        for dep in &self.dependencies {
            self.check_guard(&dep.when, &format!("dependency `{}`", dep.name))?;
        }

        for (i, step) in self.configure.iter().enumerate() {
            let what = step.label(i);
            self.check_guard(&step.when, &what)?;
            match &step.action {
                StepAction::Option(name) => {
                    if self.option(name).is_none() {
                        return Err(format!("{} is not declared", what));
                    }
                }
                StepAction::Args(templates) => self.check_templates(templates, &what)?,
                StepAction::Table(name) => {
                    if self.table(name).is_none() {
                        return Err(format!("{} is not declared", what));
                    }
                }
            }
        }

        for (i, rule) in self.environment.rules.iter().enumerate() {
            let what = format!("environment rule #{}", i + 1);
            self.check_guard(&rule.when, &what)?;
            let templates: Vec<Template> = rule.set.values().cloned().collect();
            self.check_templates(&templates, &what)?;
        }

        for rule in &self.build.target_rules {
            self.check_guard(&rule.when, "build target rule")?;
        }

        Ok(())
    }

    fn check_guard(&self, guard: &Guard, what: &str) -> Result<(), String> {
        for atom in guard.atoms() {
            match atom {
                Guard::Enabled(name) | Guard::Disabled(name) => match self.option(name) {
                    Some(o) if o.is_bool() => {}
                    Some(_) => {
                        return Err(format!(
                            "{}: `{}` is not a bool option (use `{}=<value>`)",
                            what, name, name
                        ))
                    }
                    None => return Err(format!("{}: unknown option `{}`", what, name)),
                },
                Guard::Value { option, values } => {
                    let Some(decl) = self.option(option) else {
                        return Err(format!("{}: unknown option `{}`", what, option));
                    };
                    let allowed = decl.allowed_values();
                    if let Some(bad) = values.iter().find(|v| !allowed.contains(v)) {
                        return Err(format!(
                            "{}: `{}` is not a value of option `{}`",
                            what, bad, option
                        ));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_templates(&self, templates: &[Template], what: &str) -> Result<(), String> {
        for template in templates {
            for p in template.placeholders() {
                match &p.scope {
                    Scope::Options if self.option(&p.field).is_none() => {
                        return Err(format!("{}: `{}` names an unknown option", what, p));
                    }
                    Scope::Dependency(dep)
                        if !self.dependencies.iter().any(|d| &d.name == dep) =>
                    {
                        return Err(format!("{}: `{}` names an undeclared dependency", what, p));
                    }
                    Scope::Toolchain if !matches!(p.field.as_str(), "family" | "version") => {
                        return Err(format!("{}: unknown placeholder `{}`", what, p));
                    }
                    Scope::Package if !matches!(p.field.as_str(), "name" | "version") => {
                        return Err(format!("{}: unknown placeholder `{}`", what, p));
                    }
                    Scope::Stage
                        if !matches!(p.field.as_str(), "source" | "build" | "prefix") =>
                    {
                        return Err(format!("{}: unknown placeholder `{}`", what, p));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

fn build_option(spec: OptionSpec) -> Result<OptionDecl, String> {
    let name = spec.name;
    let kind = match spec.kind {
        KindSpec::Bool => {
            let default = match spec.default {
                None => false,
                Some(toml::Value::Boolean(b)) => b,
                Some(other) => {
                    return Err(format!("option `{}`: default `{}` is not a bool", name, other))
                }
            };
            if !spec.values.is_empty() || !spec.branches.is_empty() || !spec.flags.is_empty() {
                return Err(format!(
                    "option `{}`: `values`, `branches` and `flags` need kind `single` or `multi`",
                    name
                ));
            }
            let stem = spec.flag.unwrap_or_else(|| name.clone());
            let stemmed = FlagPair::from_stem(&stem);
            OptionKind::Bool {
                default,
                flags: FlagPair {
                    enable: spec.enable.unwrap_or(stemmed.enable),
                    disable: spec.disable.unwrap_or(stemmed.disable),
                },
            }
        }
        KindSpec::Single => {
            if spec.values.is_empty() {
                return Err(format!("option `{}`: a single-choice option needs `values`", name));
            }
            let default = match spec.default {
                Some(toml::Value::String(s)) => s,
                None => spec.values[0].clone(),
                Some(other) => {
                    return Err(format!("option `{}`: default `{}` is not a string", name, other))
                }
            };
            if !spec.values.contains(&default) {
                return Err(format!("option `{}`: default `{}` is not a value", name, default));
            }
            if let Some(bad) = spec.branches.keys().find(|k| !spec.values.contains(k)) {
                return Err(format!("option `{}`: branch `{}` is not a value", name, bad));
            }
            OptionKind::Single {
                values: spec.values,
                default,
                branches: spec.branches,
            }
        }
        KindSpec::Multi => {
            if spec.values.is_empty() {
                return Err(format!("option `{}`: a multi-choice option needs `values`", name));
            }
            let default: BTreeSet<String> = match spec.default {
                None => BTreeSet::new(),
                Some(toml::Value::Array(items)) => items
                    .into_iter()
                    .map(|v| match v {
                        toml::Value::String(s) if spec.values.contains(&s) => Ok(s),
                        other => Err(format!(
                            "option `{}`: default member `{}` is not a value",
                            name, other
                        )),
                    })
                    .collect::<Result<_, _>>()?,
                Some(other) => {
                    return Err(format!("option `{}`: default `{}` is not a list", name, other))
                }
            };
            if let Some(bad) = spec.flags.keys().find(|k| !spec.values.contains(k)) {
                return Err(format!("option `{}`: flags for unknown member `{}`", name, bad));
            }
            let mut flags_by_member = spec.flags;
            let flags = spec
                .values
                .iter()
                .map(|member| match flags_by_member.remove(member) {
                    Some(f) => FlagPair {
                        enable: f.enable,
                        disable: f.disable,
                    },
                    None => FlagPair::from_stem(member),
                })
                .collect();
            OptionKind::Multi {
                values: spec.values,
                default,
                flags,
            }
        }
    };

    Ok(OptionDecl {
        name,
        description: spec.description,
        kind,
        when: spec.when,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::SAMPLE_RECIPE;

    fn invalid(toml: &str) -> String {
        match Recipe::from_toml(toml) {
            Err(RecipeError::Invalid { reason, .. }) => reason,
            other => panic!("expected invalid recipe, got {:?}", other.map(|r| r.name)),
        }
    }

    #[test]
    fn test_sample_recipe_loads() {
        let recipe = Recipe::from_toml(SAMPLE_RECIPE).unwrap();
        assert_eq!(recipe.name, "sample");
        assert_eq!(recipe.preferred_version().unwrap().as_str(), "2.1");
        assert_eq!(recipe.versions[0].as_str(), "develop");

        let openmp = recipe.option("openmp").unwrap();
        match &openmp.kind {
            OptionKind::Bool { flags, default } => {
                assert!(!default);
                assert_eq!(flags.enable, "--enable-open-mp");
            }
            other => panic!("unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn test_rejects_unknown_option_in_guard() {
        let reason = invalid(
            r#"
[package]
name = "x"
versions = ["1.0"]

[[conflict]]
id = "c"
when = "+cuda"
message = "no"
"#,
        );
        assert!(reason.contains("unknown option `cuda`"), "{}", reason);
    }

    #[test]
    fn test_rejects_provider_in_option_guard() {
        let reason = invalid(
            r#"
[package]
name = "x"

[[option]]
name = "threads"
when = "^openblas"
"#,
        );
        assert!(reason.contains("`^openblas` cannot guard an option"), "{}", reason);
    }

    #[test]
    fn test_rejects_undeclared_dependency_in_template() {
        let reason = invalid(
            r#"
[package]
name = "x"

[[configure]]
args = ["--with-fft-path={fftw.prefix}"]
"#,
        );
        assert!(reason.contains("undeclared dependency"), "{}", reason);
    }

    #[test]
    fn test_rejects_ambiguous_step() {
        let reason = invalid(
            r#"
[package]
name = "x"

[[option]]
name = "mpi"

[[configure]]
option = "mpi"
args = ["--x"]
"#,
        );
        assert!(reason.contains("exactly one"), "{}", reason);
    }

    #[test]
    fn test_rejects_bad_single_default() {
        let reason = invalid(
            r#"
[package]
name = "x"

[[option]]
name = "linalg"
kind = "single"
values = ["none", "parallel"]
default = "slepc"
"#,
        );
        assert!(reason.contains("not a value"), "{}", reason);
    }

    #[test]
    fn test_rejects_non_bool_threading_option() {
        let reason = invalid(
            r#"
[package]
name = "x"

[[option]]
name = "linalg"
kind = "single"
values = ["none"]

[[table]]
name = "blas"
threading = "linalg"
row = []
"#,
        );
        assert!(reason.contains("threading option"), "{}", reason);
    }

    #[test]
    fn test_load_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("sample.toml");
        std::fs::write(&path, SAMPLE_RECIPE).unwrap();
        assert_eq!(Recipe::load(&path).unwrap().name, "sample");
        assert!(matches!(
            Recipe::load(&tmp.path().join("missing.toml")),
            Err(RecipeError::Io { .. })
        ));
    }
}
