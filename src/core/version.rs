//! Package and toolchain version handling.
//!
//! Versions are dotted numeric components (`5.0.4`, `21.9`, `2021.4.0`) or
//! a bare name (`develop`). Ranges use the `lo:hi` form found in recipe
//! guards, where both ends are inclusive and a bound also admits every
//! version it is a component prefix of.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Names that rank above every numeric version.
const DEVELOPMENT_NAMES: &[&str] = &["develop", "main", "master", "head", "trunk"];

/// Error parsing a version or version range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("empty version string")]
    Empty,

    #[error("invalid version `{0}`")]
    Invalid(String),

    #[error("invalid version range `{0}`")]
    InvalidRange(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum VersionKind {
    Numeric(Vec<u64>),
    Named(String),
}

/// A dotted version number or a named version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    raw: String,
    kind: VersionKind,
}

impl Version {
    /// Numeric components, empty for named versions.
    pub fn components(&self) -> &[u64] {
        match &self.kind {
            VersionKind::Numeric(parts) => parts,
            VersionKind::Named(_) => &[],
        }
    }

    /// Component at `index`, if the version has one.
    pub fn component(&self, index: usize) -> Option<u64> {
        self.components().get(index).copied()
    }

    /// Whether this is a named version such as `develop`.
    pub fn is_named(&self) -> bool {
        matches!(self.kind, VersionKind::Named(_))
    }

    /// The version as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `self` is a component-wise prefix of `other`.
    ///
    /// `4.5` is a prefix of `4.5.3`; every version is a prefix of itself.
    pub fn is_prefix_of(&self, other: &Version) -> bool {
        match (&self.kind, &other.kind) {
            (VersionKind::Numeric(a), VersionKind::Numeric(b)) => {
                a.len() <= b.len() && a.iter().zip(b).all(|(x, y)| x == y)
            }
            (VersionKind::Named(a), VersionKind::Named(b)) => a == b,
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match &self.kind {
            VersionKind::Named(name) if DEVELOPMENT_NAMES.contains(&name.as_str()) => 2,
            VersionKind::Numeric(_) => 1,
            VersionKind::Named(_) => 0,
        }
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        if s.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            let parts = s
                .split('.')
                .map(|p| p.parse::<u64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| VersionParseError::Invalid(s.to_string()))?;
            return Ok(Version {
                raw: s.to_string(),
                kind: VersionKind::Numeric(parts),
            });
        }

        if s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Ok(Version {
                raw: s.to_string(),
                kind: VersionKind::Named(s.to_string()),
            });
        }

        Err(VersionParseError::Invalid(s.to_string()))
    }
}

impl TryFrom<String> for Version {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.raw
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.rank().cmp(&other.rank()) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match (&self.kind, &other.kind) {
            (VersionKind::Numeric(a), VersionKind::Numeric(b)) => a.cmp(b),
            (VersionKind::Named(a), VersionKind::Named(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// An inclusive version range: `lo:hi`, `lo:`, `:hi`, `:` or a single version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    low: Option<Version>,
    high: Option<Version>,
    /// A single version written without a colon.
    exact: bool,
}

impl VersionRange {
    /// The range that admits every version.
    pub fn any() -> Self {
        VersionRange {
            low: None,
            high: None,
            exact: false,
        }
    }

    /// Whether `version` falls inside the range.
    pub fn contains(&self, version: &Version) -> bool {
        if self.exact {
            return match &self.low {
                Some(v) => v.is_prefix_of(version),
                None => true,
            };
        }

        let above_low = match &self.low {
            Some(low) => version >= low,
            None => true,
        };
        let below_high = match &self.high {
            Some(high) => version <= high || high.is_prefix_of(version),
            None => true,
        };

        above_low && below_high
    }
}

impl FromStr for VersionRange {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bound = |part: &str| -> Result<Option<Version>, VersionParseError> {
            if part.is_empty() {
                Ok(None)
            } else {
                part.parse()
                    .map(Some)
                    .map_err(|_| VersionParseError::InvalidRange(s.to_string()))
            }
        };

        match s.split_once(':') {
            Some((lo, hi)) => {
                if hi.contains(':') {
                    return Err(VersionParseError::InvalidRange(s.to_string()));
                }
                Ok(VersionRange {
                    low: bound(lo)?,
                    high: bound(hi)?,
                    exact: false,
                })
            }
            None => {
                if s.is_empty() {
                    return Err(VersionParseError::Empty);
                }
                Ok(VersionRange {
                    low: bound(s)?,
                    high: None,
                    exact: true,
                })
            }
        }
    }
}

impl TryFrom<String> for VersionRange {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionRange> for String {
    fn from(r: VersionRange) -> Self {
        r.to_string()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exact {
            if let Some(v) = &self.low {
                return write!(f, "{}", v);
            }
        }
        if let Some(lo) = &self.low {
            write!(f, "{}", lo)?;
        }
        f.write_str(":")?;
        if let Some(hi) = &self.high {
            write!(f, "{}", hi)?;
        }
        Ok(())
    }
}
