//! Toolchain descriptors.
//!
//! A toolchain is the compiler family driving a build plus its version,
//! written `family[@version]` (e.g. `gcc@11.2.0`, `nvhpc@21.9`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::version::Version;

/// Error parsing a toolchain descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolchainParseError {
    #[error("unknown compiler family `{0}` (expected one of: {families})", families = ToolchainFamily::names().join(", "))]
    UnknownFamily(String),

    #[error("invalid compiler version in `{0}`")]
    InvalidVersion(String),
}

/// The compiler family of a toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolchainFamily {
    /// GNU Compiler Collection
    Gcc,
    /// Clang/LLVM
    Clang,
    /// Apple Clang (macOS)
    AppleClang,
    /// Intel classic compilers (icc/ifort)
    Intel,
    /// Intel oneAPI compilers (icx/ifx)
    Oneapi,
    /// NVIDIA HPC SDK (nvc/nvfortran)
    Nvhpc,
    /// PGI compilers
    Pgi,
    /// Cray Compiling Environment
    Cce,
}

impl ToolchainFamily {
    /// Every known family, in declaration order.
    pub const ALL: [ToolchainFamily; 8] = [
        ToolchainFamily::Gcc,
        ToolchainFamily::Clang,
        ToolchainFamily::AppleClang,
        ToolchainFamily::Intel,
        ToolchainFamily::Oneapi,
        ToolchainFamily::Nvhpc,
        ToolchainFamily::Pgi,
        ToolchainFamily::Cce,
    ];

    /// Get the family name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainFamily::Gcc => "gcc",
            ToolchainFamily::Clang => "clang",
            ToolchainFamily::AppleClang => "apple-clang",
            ToolchainFamily::Intel => "intel",
            ToolchainFamily::Oneapi => "oneapi",
            ToolchainFamily::Nvhpc => "nvhpc",
            ToolchainFamily::Pgi => "pgi",
            ToolchainFamily::Cce => "cce",
        }
    }

    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.as_str()).collect()
    }
}

impl FromStr for ToolchainFamily {
    type Err = ToolchainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == lower)
            .ok_or_else(|| ToolchainParseError::UnknownFamily(s.to_string()))
    }
}

impl fmt::Display for ToolchainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiler family plus optional version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Toolchain {
    pub family: ToolchainFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

impl Toolchain {
    /// Create a toolchain without a known version.
    pub fn new(family: ToolchainFamily) -> Self {
        Toolchain {
            family,
            version: None,
        }
    }

    /// Attach a version.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }
}

impl FromStr for Toolchain {
    type Err = ToolchainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('@') {
            Some((family, version)) => {
                let family = family.parse()?;
                let version = version
                    .parse()
                    .map_err(|_| ToolchainParseError::InvalidVersion(s.to_string()))?;
                Ok(Toolchain::new(family).with_version(version))
            }
            None => Ok(Toolchain::new(s.parse()?)),
        }
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{}", self.family, v),
            None => write!(f, "{}", self.family),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_family_and_version() {
        let tc: Toolchain = "gcc@11.2.0".parse().unwrap();
        assert_eq!(tc.family, ToolchainFamily::Gcc);
        assert_eq!(tc.version.unwrap().components(), &[11, 2, 0]);

        let tc: Toolchain = "NVHPC".parse().unwrap();
        assert_eq!(tc.family, ToolchainFamily::Nvhpc);
        assert!(tc.version.is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "msvc".parse::<Toolchain>(),
            Err(ToolchainParseError::UnknownFamily(_))
        ));
        assert!(matches!(
            "gcc@".parse::<Toolchain>(),
            Err(ToolchainParseError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_display_round_trips() {
        assert_eq!("apple-clang@15.0".parse::<Toolchain>().unwrap().to_string(), "apple-clang@15.0");
        assert_eq!(ToolchainFamily::Oneapi.to_string(), "oneapi");
    }
}
