//! Configurations: the resolved option values for one build.
//!
//! A configuration is assembled from the recipe's defaults plus user
//! settings written in the same compact form guards use:
//! `+mpi ~openmp linalg=parallel profile=time,memory`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::guard::{Guard, GuardContext};
use crate::core::option::OptionValue;
use crate::core::recipe::Recipe;
use crate::core::toolchain::Toolchain;
use crate::core::version::Version;

/// Error building a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic)]
pub enum ConfigurationError {
    #[error("`{recipe}` has no option `{option}`")]
    #[diagnostic(code(mooring::config::unknown_option))]
    UnknownOption { recipe: String, option: String },

    #[error("invalid value `{value}` for option `{option}` (expected one of: {})", .expected.join(", "))]
    #[diagnostic(code(mooring::config::invalid_value))]
    InvalidValue {
        option: String,
        value: String,
        expected: Vec<String>,
    },

    #[error("option `{option}` is not a switch; use `{option}=<value>`")]
    #[diagnostic(code(mooring::config::not_a_switch))]
    NotASwitch { option: String },

    #[error("option `{option}` is only available when `{guard}`")]
    #[diagnostic(code(mooring::config::inactive_option))]
    InactiveOption { option: String, guard: String },

    #[error("`{recipe}` has no version `{version}`")]
    #[diagnostic(code(mooring::config::unknown_version))]
    UnknownVersion { recipe: String, version: String },

    #[error("`{recipe}` declares no versions; pass one explicitly")]
    #[diagnostic(code(mooring::config::no_version))]
    NoVersion { recipe: String },

    #[error("invalid setting `{setting}`: {reason}")]
    #[diagnostic(code(mooring::config::invalid_setting))]
    InvalidSetting { setting: String, reason: String },
}

/// One user setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting {
    Enable(String),
    Disable(String),
    Assign(String, String),
}

impl Setting {
    pub fn option(&self) -> &str {
        match self {
            Setting::Enable(name) | Setting::Disable(name) | Setting::Assign(name, _) => name,
        }
    }
}

/// Parse a settings string such as `+mpi ~openmp linalg=parallel`.
pub fn parse_settings(input: &str) -> Result<Vec<Setting>, ConfigurationError> {
    let guard = Guard::parse(input).map_err(|e| ConfigurationError::InvalidSetting {
        setting: input.to_string(),
        reason: e.reason,
    })?;

    let atoms = match guard {
        Guard::Always => return Ok(Vec::new()),
        Guard::All(atoms) => atoms,
        atom => vec![atom],
    };

    atoms
        .into_iter()
        .map(|atom| match atom {
            Guard::Enabled(name) => Ok(Setting::Enable(name)),
            Guard::Disabled(name) => Ok(Setting::Disable(name)),
            Guard::Value { option, values } => Ok(Setting::Assign(option, values.join(","))),
            other => Err(ConfigurationError::InvalidSetting {
                setting: other.to_string(),
                reason: "only `+name`, `~name` and `name=value` are allowed here".into(),
            }),
        })
        .collect()
}

/// The package version plus the value of every active option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    version: Version,
    values: BTreeMap<String, OptionValue>,
}

impl Configuration {
    /// An empty configuration for `version`.
    pub fn new(version: Version) -> Self {
        Configuration {
            version,
            values: BTreeMap::new(),
        }
    }

    /// Build the configuration of `recipe` from defaults and `settings`.
    ///
    /// Options are visited in declaration order. An option whose guard does
    /// not hold against the options visited so far is inactive and left out;
    /// setting an inactive option explicitly is an error. Later settings of
    /// the same option replace earlier ones.
    pub fn build(
        recipe: &Recipe,
        version: Option<Version>,
        settings: &[Setting],
        toolchain: &Toolchain,
    ) -> Result<Configuration, ConfigurationError> {
        let version = match version {
            Some(v) => {
                if !recipe.versions.is_empty() && !recipe.versions.contains(&v) {
                    return Err(ConfigurationError::UnknownVersion {
                        recipe: recipe.name.clone(),
                        version: v.to_string(),
                    });
                }
                v
            }
            None => recipe
                .preferred_version()
                .cloned()
                .ok_or_else(|| ConfigurationError::NoVersion {
                    recipe: recipe.name.clone(),
                })?,
        };

        let mut explicit: HashMap<&str, OptionValue> = HashMap::new();
        for setting in settings {
            let decl = recipe.option(setting.option()).ok_or_else(|| {
                ConfigurationError::UnknownOption {
                    recipe: recipe.name.clone(),
                    option: setting.option().to_string(),
                }
            })?;

            let value = match setting {
                Setting::Enable(_) | Setting::Disable(_) if !decl.is_bool() => {
                    return Err(ConfigurationError::NotASwitch {
                        option: decl.name.clone(),
                    });
                }
                Setting::Enable(_) => OptionValue::Bool(true),
                Setting::Disable(_) => OptionValue::Bool(false),
                Setting::Assign(_, raw) => decl.parse_value(raw)?,
            };
            explicit.insert(decl.name.as_str(), value);
        }

        let mut config = Configuration::new(version);
        for decl in &recipe.options {
            let active = decl
                .when
                .eval(&GuardContext::new(&config, toolchain));

            match (active, explicit.remove(decl.name.as_str())) {
                (true, Some(value)) => config.set(decl.name.clone(), value),
                (true, None) => config.set(decl.name.clone(), decl.default_value()),
                (false, Some(_)) => {
                    return Err(ConfigurationError::InactiveOption {
                        option: decl.name.clone(),
                        guard: decl.when.to_string(),
                    });
                }
                (false, None) => {
                    tracing::debug!(option = %decl.name, guard = %decl.when, "option inactive");
                }
            }
        }

        Ok(config)
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    /// Whether a bool option is active and enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(OptionValue::Bool(true)))
    }

    pub fn set(&mut self, name: impl Into<String>, value: OptionValue) {
        self.values.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.values.remove(name)
    }

    pub fn values(&self) -> &BTreeMap<String, OptionValue> {
        &self.values
    }
}
