//! Toolchain detection.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{bail, Result};
use regex::Regex;
use which::which;

use crate::core::toolchain::{Toolchain, ToolchainFamily};
use crate::util::process::ProcessBuilder;

/// Compilers searched on `PATH`, in order, when `FC` and `CC` are unset.
pub const CANDIDATES: [&str; 6] = ["nvfortran", "ifx", "ifort", "gfortran", "gcc", "clang"];

static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+(?:\.\d+)+)").expect("version regex is valid"));

/// A compiler found on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCompiler {
    pub path: PathBuf,
    pub toolchain: Toolchain,
}

/// Detect the toolchain.
///
/// Tries, in order:
/// 1. `FC` and `CC` environment variables
/// 2. The first of [`CANDIDATES`] found on `PATH`
pub fn detect_toolchain() -> Result<DetectedCompiler> {
    for var in ["FC", "CC"] {
        let Ok(value) = std::env::var(var) else {
            continue;
        };
        let path = PathBuf::from(&value);
        let path = if path.is_absolute() {
            path
        } else {
            match which(&value) {
                Ok(p) => p,
                Err(_) => {
                    tracing::warn!("{} is set to `{}` but it was not found", var, value);
                    continue;
                }
            }
        };
        match identify(&path) {
            Ok(toolchain) => return Ok(DetectedCompiler { path, toolchain }),
            Err(e) => tracing::warn!("ignoring {}={}: {:#}", var, value, e),
        }
    }

    for name in CANDIDATES {
        let Ok(path) = which(name) else {
            continue;
        };
        match identify(&path) {
            Ok(toolchain) => return Ok(DetectedCompiler { path, toolchain }),
            Err(e) => tracing::debug!("skipping {}: {:#}", path.display(), e),
        }
    }

    bail!(
        "no compiler found\n\
         \n\
         Searched FC, CC and PATH for: {}.\n\
         Pass `--toolchain <family[@version]>` or set `[toolchain] default` in the config.",
        CANDIDATES.join(", ")
    )
}

/// Run `<compiler> --version` and identify the toolchain.
pub fn identify(compiler: &Path) -> Result<Toolchain> {
    let output = ProcessBuilder::new(compiler).arg("--version").exec()?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    // Some compilers print their banner on stderr.
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    let name = compiler
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    match parse_version_output(name, &text) {
        Some(toolchain) => {
            tracing::debug!(compiler = %compiler.display(), %toolchain, "identified compiler");
            Ok(toolchain)
        }
        None => bail!("could not identify `{}` from its --version output", compiler.display()),
    }
}

/// Identify a compiler family and version from `--version` output.
///
/// `name` is the executable name and breaks ties when the banner is
/// ambiguous.
pub fn parse_version_output(name: &str, output: &str) -> Option<Toolchain> {
    let banner = output.lines().find(|l| !l.trim().is_empty())?;
    let lower = banner.to_lowercase();
    let name = name.to_lowercase();

    let family = if lower.contains("nvfortran") || lower.contains("nvc") || name.starts_with("nv") {
        ToolchainFamily::Nvhpc
    } else if lower.contains("pgfortran") || lower.contains("pgcc") || name.starts_with("pg") {
        ToolchainFamily::Pgi
    } else if lower.contains("ifx") || lower.contains("icx") || lower.contains("oneapi") {
        ToolchainFamily::Oneapi
    } else if lower.contains("ifort") || lower.contains("icc") || lower.contains("intel") {
        ToolchainFamily::Intel
    } else if lower.contains("cray") {
        ToolchainFamily::Cce
    } else if lower.contains("apple clang") {
        ToolchainFamily::AppleClang
    } else if lower.contains("clang") {
        ToolchainFamily::Clang
    } else if lower.contains("gcc") || lower.contains("gnu fortran") || name.contains("gfortran") {
        ToolchainFamily::Gcc
    } else {
        return None;
    };

    let toolchain = Toolchain::new(family);
    let version = VERSION
        .captures(banner)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok());

    Some(match version {
        Some(v) => toolchain.with_version(v),
        None => toolchain,
    })
}
