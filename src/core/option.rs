//! Option declarations and values.
//!
//! An option is a named build feature declared once per recipe. Three kinds
//! exist: boolean switches, a single choice from an enumerated set, and a
//! set of choices.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::configuration::ConfigurationError;
use crate::core::guard::Guard;
use crate::core::template::Template;

/// A resolved option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Choice(String),
    Set(BTreeSet<String>),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Choice(c) => f.write_str(c),
            OptionValue::Set(members) => {
                let joined: Vec<&str> = members.iter().map(String::as_str).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

/// The enable/disable spellings of a switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagPair {
    pub enable: String,
    pub disable: String,
}

impl FlagPair {
    /// `--enable-<stem>` / `--disable-<stem>`.
    pub fn from_stem(stem: &str) -> Self {
        FlagPair {
            enable: format!("--enable-{}", stem),
            disable: format!("--disable-{}", stem),
        }
    }

    /// The token for the given state.
    pub fn token(&self, enabled: bool) -> &str {
        if enabled {
            &self.enable
        } else {
            &self.disable
        }
    }
}

/// The kind of an option, with its kind-specific data.
#[derive(Debug, Clone)]
pub enum OptionKind {
    Bool {
        default: bool,
        flags: FlagPair,
    },
    Single {
        values: Vec<String>,
        default: String,
        /// Templates emitted when the option holds the key value.
        branches: BTreeMap<String, Vec<Template>>,
    },
    Multi {
        values: Vec<String>,
        default: BTreeSet<String>,
        /// Per-member switch spellings, in `values` order.
        flags: Vec<FlagPair>,
    },
}

impl OptionKind {
    pub fn name(&self) -> &'static str {
        match self {
            OptionKind::Bool { .. } => "bool",
            OptionKind::Single { .. } => "single",
            OptionKind::Multi { .. } => "multi",
        }
    }
}

/// A declared option.
#[derive(Debug, Clone)]
pub struct OptionDecl {
    pub name: String,
    pub description: Option<String>,
    pub kind: OptionKind,
    /// The option only exists when this guard holds.
    pub when: Guard,
}

impl OptionDecl {
    /// The default value.
    pub fn default_value(&self) -> OptionValue {
        match &self.kind {
            OptionKind::Bool { default, .. } => OptionValue::Bool(*default),
            OptionKind::Single { default, .. } => OptionValue::Choice(default.clone()),
            OptionKind::Multi { default, .. } => OptionValue::Set(default.clone()),
        }
    }

    /// Allowed values for choice and set options; `true`/`false` for switches.
    pub fn allowed_values(&self) -> Vec<String> {
        match &self.kind {
            OptionKind::Bool { .. } => vec!["true".into(), "false".into()],
            OptionKind::Single { values, .. } | OptionKind::Multi { values, .. } => values.clone(),
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind, OptionKind::Bool { .. })
    }

    /// Parse a `name=value` assignment for this option.
    ///
    /// Set options take a comma-separated list; `none` or an empty string
    /// selects no members unless `none` is itself a declared member.
    pub fn parse_value(&self, raw: &str) -> Result<OptionValue, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidValue {
            option: self.name.clone(),
            value: raw.to_string(),
            expected: self.allowed_values(),
        };

        match &self.kind {
            OptionKind::Bool { .. } => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Ok(OptionValue::Bool(true)),
                "false" | "no" | "off" => Ok(OptionValue::Bool(false)),
                _ => Err(invalid()),
            },
            OptionKind::Single { values, .. } => {
                let raw = raw.trim();
                if values.iter().any(|v| v == raw) {
                    Ok(OptionValue::Choice(raw.to_string()))
                } else {
                    Err(invalid())
                }
            }
            OptionKind::Multi { values, .. } => {
                let raw = raw.trim();
                if raw.is_empty() || (raw == "none" && !values.iter().any(|v| v == "none")) {
                    return Ok(OptionValue::Set(BTreeSet::new()));
                }
                let mut chosen = BTreeSet::new();
                for member in raw.split(',').map(str::trim) {
                    if !values.iter().any(|v| v == member) {
                        return Err(invalid());
                    }
                    chosen.insert(member.to_string());
                }
                Ok(OptionValue::Set(chosen))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi() -> OptionDecl {
        OptionDecl {
            name: "profile".into(),
            description: None,
            kind: OptionKind::Multi {
                values: vec!["time".into(), "memory".into()],
                default: BTreeSet::new(),
                flags: vec![FlagPair::from_stem("time"), FlagPair::from_stem("memory")],
            },
            when: Guard::Always,
        }
    }

    #[test]
    fn test_flag_pair_from_stem() {
        let flags = FlagPair::from_stem("open-mp");
        assert_eq!(flags.token(true), "--enable-open-mp");
        assert_eq!(flags.token(false), "--disable-open-mp");
    }

    #[test]
    fn test_parse_multi_value() {
        let opt = multi();
        let value = opt.parse_value("memory,time").unwrap();
        assert_eq!(value.to_string(), "memory,time");
        assert_eq!(opt.parse_value("none").unwrap(), OptionValue::Set(BTreeSet::new()));
        assert!(matches!(
            opt.parse_value("time,disk"),
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_bool_value() {
        let opt = OptionDecl {
            name: "mpi".into(),
            description: None,
            kind: OptionKind::Bool {
                default: true,
                flags: FlagPair::from_stem("mpi"),
            },
            when: Guard::Always,
        };
        assert_eq!(opt.parse_value("off").unwrap(), OptionValue::Bool(false));
        assert!(opt.parse_value("maybe").is_err());
        assert_eq!(opt.default_value(), OptionValue::Bool(true));
    }
}
