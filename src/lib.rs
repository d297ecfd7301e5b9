//! mooring - a variant resolver for scientific software build recipes
//!
//! A recipe declares the options, conflicts, dependencies and configure
//! steps of one package. Given a recipe, a set of option settings, a
//! compiler toolchain and the already-resolved dependencies, mooring
//! produces the `configure` arguments, the build environment and a build
//! plan that can be executed.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities and mocks for mooring unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recipe fixture and a mock command runner.
#[cfg(test)]
pub mod test_support;

pub use core::{Configuration, DependencyTable, Recipe, Toolchain};
pub use resolver::{ResolveError, ResolveInput, Resolver};
pub use util::context::GlobalContext;
