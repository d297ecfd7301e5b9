//! High-level operations.
//!
//! This module contains the implementation of mooring commands.

pub mod build;
pub mod plan;
pub mod registry;

pub use build::{build, BuildOptions};
pub use plan::{plan_build, resolve_environment, validate_request, BuildRequest};
pub use registry::{RecipeOrigin, RecipeRegistry};
