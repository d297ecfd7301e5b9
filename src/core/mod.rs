//! Core data structures for mooring.
//!
//! This module contains the foundational types used throughout mooring:
//! - Versions, version ranges and toolchain descriptors
//! - Guards, options and configurations
//! - Dependency requirements and the resolved dependency table
//! - Templates and recipes

pub mod configuration;
pub mod dependency;
pub mod guard;
pub mod option;
pub mod recipe;
pub mod template;
pub mod toolchain;
pub mod version;

pub use configuration::{parse_settings, Configuration, ConfigurationError, Setting};
pub use dependency::{DependencyRequirement, DependencyTable, ResolvedDependency};
pub use guard::{Guard, GuardContext};
pub use option::{OptionDecl, OptionKind, OptionValue};
pub use recipe::{Recipe, RecipeError};
pub use template::{Stage, Template};
pub use toolchain::{Toolchain, ToolchainFamily};
pub use version::{Version, VersionRange};
