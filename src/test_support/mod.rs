//! Test utilities and mocks for mooring unit tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use mooring::test_support::{MockRunner, MockProcessOutput};
//!
//! #[test]
//! fn test_example() {
//!     let mut runner = MockRunner::new();
//!     runner.expect("make install", MockProcessOutput::failure(2, "no rule"));
//!
//!     // Hand `runner.clone()` to a PlanExecutor, then inspect `runner.history()`.
//! }
//! ```

pub mod fixtures;

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};

use crate::builder::executor::CommandRunner;
use crate::util::process::ProcessBuilder;

pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    pub stderr: String,
}

impl MockProcessOutput {
    pub fn success() -> Self {
        MockProcessOutput {
            status: 0,
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stderr: stderr.into(),
        }
    }

    pub fn success_status(&self) -> bool {
        self.status == 0
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success()
    }
}

/// Pattern for matching commands in MockRunner.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
}

impl CommandPattern {
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
        }
    }
}

#[derive(Debug, Default)]
struct RunnerState {
    expectations: Vec<(CommandPattern, MockProcessOutput)>,
    calls: Vec<ProcessBuilder>,
}

/// Mock command runner that records every command it is asked to run.
///
/// Commands without a matching expectation succeed. Clones share state, so
/// a clone can be handed to an executor and inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    state: Arc<Mutex<RunnerState>>,
}

impl MockRunner {
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&mut self, cmd: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandPattern::Exact(cmd.to_string()), output)
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&mut self, prefix: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandPattern::StartsWith(prefix.to_string()), output)
    }

    pub fn expect_pattern(&mut self, pattern: CommandPattern, output: MockProcessOutput) -> &mut Self {
        if let Ok(mut state) = self.state.lock() {
            state.expectations.push((pattern, output));
        }
        self
    }

    /// Command lines run so far.
    pub fn history(&self) -> Vec<String> {
        self.calls().iter().map(ProcessBuilder::display_command).collect()
    }

    /// Full process descriptions run so far.
    pub fn calls(&self) -> Vec<ProcessBuilder> {
        self.state
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<()> {
        let line = cmd.display_command();
        let Ok(mut state) = self.state.lock() else {
            bail!("mock runner state poisoned");
        };
        state.calls.push(cmd.clone());

        let output = state
            .expectations
            .iter()
            .find(|(pattern, _)| pattern.matches(&line))
            .map(|(_, output)| output.clone())
            .unwrap_or_default();

        if !output.success_status() {
            bail!(
                "`{}` failed with exit code {}\n{}",
                line,
                output.status,
                output.stderr
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_records_calls() {
        let mut runner = MockRunner::new();
        runner.expect_prefix("make install", MockProcessOutput::failure(1, "denied"));

        let shared = runner.clone();
        assert!(shared.run(&ProcessBuilder::new("make").arg("yambo")).is_ok());
        let err = shared
            .run(&ProcessBuilder::new("make").arg("install"))
            .unwrap_err();
        assert!(err.to_string().contains("denied"));

        assert_eq!(runner.history(), vec!["make yambo", "make install"]);
    }

    #[test]
    fn test_command_pattern() {
        assert!(CommandPattern::Exact("make".into()).matches("make"));
        assert!(!CommandPattern::Exact("make".into()).matches("make -j4"));
        assert!(CommandPattern::Contains("pip".into()).matches("python3 -m pip install"));
    }
}
