//! Guard expressions.
//!
//! A guard is a predicate over a configuration, a toolchain, the package
//! version and (optionally) the resolved dependency table. Recipes write
//! guards in a compact textual form:
//!
//! ```text
//! +cuda %gcc            cuda enabled and building with gcc
//! linalg=parallel ~mpi  parallel linear algebra without MPI
//! @:4.5.3               package version 4.5.3 or older
//! %gcc@9.0.0:           gcc 9.0.0 or newer
//! ^openmpi              some dependency is provided by openmpi
//! !%nvhpc               not building with nvhpc
//! +cuda %intel | +cuda %oneapi
//! ```
//!
//! Atoms separated by whitespace (or simply concatenated) must all hold;
//! `|` separates alternatives. The empty guard always holds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::configuration::Configuration;
use crate::core::dependency::DependencyTable;
use crate::core::option::OptionValue;
use crate::core::toolchain::{Toolchain, ToolchainFamily};
use crate::core::version::VersionRange;

/// Error parsing a guard expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid guard `{input}`: {reason}")]
pub struct GuardParseError {
    pub input: String,
    pub reason: String,
}

/// A predicate gating an option, rule or configure step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Guard {
    /// Holds unconditionally.
    Always,
    /// A bool option is active and enabled.
    Enabled(String),
    /// A bool option is active and disabled.
    Disabled(String),
    /// A choice option holds one of `values`, or a set option contains all of them.
    Value { option: String, values: Vec<String> },
    /// The toolchain belongs to `family`, optionally within a version range.
    Toolchain {
        family: ToolchainFamily,
        range: Option<VersionRange>,
    },
    /// The package version lies in the range.
    Version(VersionRange),
    /// A resolved dependency is keyed or provided under this name.
    Provider(String),
    Not(Box<Guard>),
    All(Vec<Guard>),
    Any(Vec<Guard>),
}

/// Everything a guard can look at.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    pub config: &'a Configuration,
    pub toolchain: &'a Toolchain,
    pub deps: Option<&'a DependencyTable>,
}

impl<'a> GuardContext<'a> {
    pub fn new(config: &'a Configuration, toolchain: &'a Toolchain) -> Self {
        GuardContext {
            config,
            toolchain,
            deps: None,
        }
    }

    pub fn with_deps(mut self, deps: &'a DependencyTable) -> Self {
        self.deps = Some(deps);
        self
    }
}

impl Guard {
    /// Parse a guard from its textual form.
    pub fn parse(input: &str) -> Result<Guard, GuardParseError> {
        Parser::new(input).parse()
    }

    /// Whether this guard holds unconditionally.
    pub fn is_always(&self) -> bool {
        matches!(self, Guard::Always)
    }

    /// Evaluate the guard.
    pub fn eval(&self, ctx: &GuardContext<'_>) -> bool {
        match self {
            Guard::Always => true,
            Guard::Enabled(name) => matches!(ctx.config.get(name), Some(OptionValue::Bool(true))),
            Guard::Disabled(name) => {
                matches!(ctx.config.get(name), Some(OptionValue::Bool(false)))
            }
            Guard::Value { option, values } => match ctx.config.get(option) {
                Some(OptionValue::Choice(chosen)) => values.iter().any(|v| v == chosen),
                Some(OptionValue::Set(members)) => values.iter().all(|v| members.contains(v)),
                Some(OptionValue::Bool(b)) => {
                    values.len() == 1 && values[0].parse::<bool>().ok() == Some(*b)
                }
                None => false,
            },
            Guard::Toolchain { family, range } => {
                if ctx.toolchain.family != *family {
                    return false;
                }
                match range {
                    Some(range) => ctx
                        .toolchain
                        .version
                        .as_ref()
                        .is_some_and(|v| range.contains(v)),
                    None => true,
                }
            }
            Guard::Version(range) => range.contains(ctx.config.version()),
            Guard::Provider(name) => ctx.deps.is_some_and(|d| d.has_provider(name)),
            Guard::Not(inner) => !inner.eval(ctx),
            Guard::All(guards) => guards.iter().all(|g| g.eval(ctx)),
            Guard::Any(guards) => guards.iter().any(|g| g.eval(ctx)),
        }
    }

    /// Visit every atom (non-combinator node) of the guard.
    pub fn atoms(&self) -> Vec<&Guard> {
        let mut out = Vec::new();
        self.collect_atoms(&mut out);
        out
    }

    fn collect_atoms<'g>(&'g self, out: &mut Vec<&'g Guard>) {
        match self {
            Guard::Not(inner) => inner.collect_atoms(out),
            Guard::All(guards) | Guard::Any(guards) => {
                for g in guards {
                    g.collect_atoms(out);
                }
            }
            Guard::Always => {}
            atom => out.push(atom),
        }
    }
}

impl Default for Guard {
    fn default() -> Self {
        Guard::Always
    }
}

impl FromStr for Guard {
    type Err = GuardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Guard::parse(s)
    }
}

impl TryFrom<String> for Guard {
    type Error = GuardParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Guard::parse(&value)
    }
}

impl From<Guard> for String {
    fn from(g: Guard) -> Self {
        g.to_string()
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Always => Ok(()),
            Guard::Enabled(name) => write!(f, "+{}", name),
            Guard::Disabled(name) => write!(f, "~{}", name),
            Guard::Value { option, values } => write!(f, "{}={}", option, values.join(",")),
            Guard::Toolchain { family, range } => match range {
                Some(r) => write!(f, "%{}@{}", family, r),
                None => write!(f, "%{}", family),
            },
            Guard::Version(range) => write!(f, "@{}", range),
            Guard::Provider(name) => write!(f, "^{}", name),
            Guard::Not(inner) => write!(f, "!{}", inner),
            Guard::All(guards) => {
                let parts: Vec<String> = guards.iter().map(|g| g.to_string()).collect();
                f.write_str(&parts.join(" "))
            }
            Guard::Any(guards) => {
                let parts: Vec<String> = guards.iter().map(|g| g.to_string()).collect();
                f.write_str(&parts.join(" | "))
            }
        }
    }
}

/// Characters that begin a new atom.
const ATOM_SIGILS: &[char] = &['+', '~', '%', '@', '^', '!', '|'];

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> GuardParseError {
        GuardParseError {
            input: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse(mut self) -> Result<Guard, GuardParseError> {
        let mut clauses = Vec::new();
        loop {
            clauses.push(self.parse_clause()?);
            self.skip_ws();
            match self.peek() {
                Some('|') => self.pos += 1,
                None => break,
                Some(c) => return Err(self.error(format!("unexpected `{}`", c))),
            }
        }

        if clauses.len() > 1 && clauses.iter().any(Guard::is_always) {
            return Err(self.error("empty alternative"));
        }

        Ok(match clauses.len() {
            1 => clauses.remove(0),
            _ => Guard::Any(clauses),
        })
    }

    fn parse_clause(&mut self) -> Result<Guard, GuardParseError> {
        let mut atoms = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None | Some('|') => break,
                _ => atoms.push(self.parse_atom()?),
            }
        }

        Ok(match atoms.len() {
            0 => Guard::Always,
            1 => atoms.remove(0),
            _ => Guard::All(atoms),
        })
    }

    fn parse_atom(&mut self) -> Result<Guard, GuardParseError> {
        let Some(c) = self.peek() else {
            return Err(self.error("unexpected end of input"));
        };

        match c {
            '!' => {
                self.pos += 1;
                self.skip_ws();
                Ok(Guard::Not(Box::new(self.parse_atom()?)))
            }
            '+' => {
                self.pos += 1;
                Ok(Guard::Enabled(self.read_name("option name after `+`")?))
            }
            '~' => {
                self.pos += 1;
                Ok(Guard::Disabled(self.read_name("option name after `~`")?))
            }
            '^' => {
                self.pos += 1;
                Ok(Guard::Provider(self.read_name("dependency name after `^`")?))
            }
            '@' => {
                self.pos += 1;
                Ok(Guard::Version(self.read_range()?))
            }
            '%' => {
                self.pos += 1;
                let name = self.read_name("compiler family after `%`")?;
                let family = name.parse().map_err(|e| self.error(format!("{}", e)))?;
                let range = if self.peek() == Some('@') {
                    self.pos += 1;
                    Some(self.read_range()?)
                } else {
                    None
                };
                Ok(Guard::Toolchain { family, range })
            }
            c if is_name_char(c) => {
                let option = self.read_name("option name")?;
                if self.peek() != Some('=') {
                    return Err(self.error(format!(
                        "expected `=` after `{}` (use `+{}` for a switch)",
                        option, option
                    )));
                }
                self.pos += 1;
                let raw = self.read_while(|c| is_name_char(c) || c == ',' || c == '.');
                let values: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
                    .collect();
                if values.is_empty() {
                    return Err(self.error(format!("missing value for `{}`", option)));
                }
                Ok(Guard::Value { option, values })
            }
            c => Err(self.error(format!("unexpected `{}`", c))),
        }
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn read_name(&mut self, what: &str) -> Result<String, GuardParseError> {
        let name = self.read_while(is_name_char);
        if name.is_empty() {
            return Err(self.error(format!("expected {}", what)));
        }
        Ok(name)
    }

    fn read_range(&mut self) -> Result<VersionRange, GuardParseError> {
        let raw = self.read_while(|c| !c.is_whitespace() && !ATOM_SIGILS.contains(&c));
        raw.parse()
            .map_err(|e| self.error(format!("{}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::Version;

    fn config(pairs: &[(&str, OptionValue)]) -> Configuration {
        let mut config = Configuration::new("5.0.4".parse::<Version>().unwrap());
        for (name, value) in pairs {
            config.set(*name, value.clone());
        }
        config
    }

    fn eval(guard: &str, config: &Configuration, toolchain: &str) -> bool {
        let toolchain: Toolchain = toolchain.parse().unwrap();
        Guard::parse(guard)
            .unwrap()
            .eval(&GuardContext::new(config, &toolchain))
    }

    #[test]
    fn test_parse_conjunction() {
        let g = Guard::parse("+cuda %gcc").unwrap();
        assert_eq!(
            g,
            Guard::All(vec![
                Guard::Enabled("cuda".into()),
                Guard::Toolchain {
                    family: ToolchainFamily::Gcc,
                    range: None
                },
            ])
        );
    }

    #[test]
    fn test_parse_concatenated_atoms() {
        let g = Guard::parse("linalg=slepc +mpi+dp~cuda").unwrap();
        assert_eq!(g.atoms().len(), 4);
        assert_eq!(g.to_string(), "linalg=slepc +mpi +dp ~cuda");
    }

    #[test]
    fn test_parse_alternatives_and_negation() {
        let g = Guard::parse("+cuda %intel | +cuda %oneapi").unwrap();
        assert!(matches!(g, Guard::Any(ref c) if c.len() == 2));

        let g = Guard::parse("!%gcc@10:").unwrap();
        assert_eq!(g.to_string(), "!%gcc@10:");
    }

    #[test]
    fn test_parse_errors() {
        assert!(Guard::parse("mpi").is_err());
        assert!(Guard::parse("+").is_err());
        assert!(Guard::parse("%msvc").is_err());
        assert!(Guard::parse("+a |").is_err());
        assert!(Guard::parse("cc=").is_err());
    }

    #[test]
    fn test_empty_guard_always_holds() {
        let g = Guard::parse("   ").unwrap();
        assert!(g.is_always());
        assert!(g.eval(&GuardContext::new(&config(&[]), &"gcc".parse().unwrap())));
    }

    #[test]
    fn test_eval_switches() {
        let c = config(&[
            ("mpi", OptionValue::Bool(true)),
            ("openmp", OptionValue::Bool(false)),
        ]);
        assert!(eval("+mpi ~openmp", &c, "gcc"));
        assert!(!eval("+openmp", &c, "gcc"));
        // Absent options satisfy neither form.
        assert!(!eval("+cuda", &c, "gcc"));
        assert!(!eval("~cuda", &c, "gcc"));
        assert!(eval("mpi=true", &c, "gcc"));
    }

    #[test]
    fn test_eval_choices_and_sets() {
        let c = config(&[
            ("linalg", OptionValue::Choice("parallel".into())),
            (
                "profile",
                OptionValue::Set(["time".to_string()].into_iter().collect()),
            ),
        ]);
        assert!(eval("linalg=parallel", &c, "gcc"));
        assert!(eval("linalg=slepc,parallel", &c, "gcc"));
        assert!(eval("profile=time", &c, "gcc"));
        assert!(!eval("profile=time,memory", &c, "gcc"));
    }

    #[test]
    fn test_eval_toolchain_and_version() {
        let c = config(&[]);
        assert!(eval("%gcc@9.0.0:", &c, "gcc@11.2.0"));
        assert!(!eval("%gcc@9.0.0:", &c, "gcc@8.5.0"));
        // A version-constrained atom never matches an unversioned toolchain.
        assert!(!eval("%gcc@9:", &c, "gcc"));
        assert!(eval("@5:", &c, "gcc"));
        assert!(!eval("@:4.5.3", &c, "gcc"));
    }

    #[test]
    fn test_eval_provider_requires_dependency_table() {
        let c = config(&[]);
        let tc: Toolchain = "gcc".parse().unwrap();
        let g = Guard::parse("^openmpi").unwrap();
        assert!(!g.eval(&GuardContext::new(&c, &tc)));

        let mut deps = DependencyTable::new();
        deps.insert("mpi", crate::core::dependency::ResolvedDependency::provided_by("openmpi"));
        assert!(g.eval(&GuardContext::new(&c, &tc).with_deps(&deps)));
    }
}
