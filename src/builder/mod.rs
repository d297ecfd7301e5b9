//! Build planning and execution.
//!
//! Turns resolved configure arguments, environment and targets into an
//! ordered list of external commands, and runs them.

pub mod detect;
pub mod executor;
pub mod plan;

pub use detect::{detect_toolchain, DetectedCompiler};
pub use executor::{CommandRunner, ExecutionSummary, PlanExecutor, SystemRunner};
pub use plan::{BuildDirs, BuildPlan, BuildStep, Phase, PlanTools};
