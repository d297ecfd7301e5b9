//! Resolution error types and diagnostics.

use thiserror::Error;

use crate::core::template::RenderError;
use crate::util::diagnostic::Diagnostic;

/// Error while validating or resolving a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic)]
pub enum ResolveError {
    #[error("conflict `{rule}`: {message}")]
    #[diagnostic(code(mooring::resolve::conflict))]
    Conflict { rule: String, message: String },

    #[error("dependency `{dependency}` is required by {requested_by} but was not provided")]
    #[diagnostic(code(mooring::resolve::missing_dependency))]
    MissingDependency {
        dependency: String,
        /// Missing field, when the dependency itself was provided.
        field: Option<String>,
        requested_by: String,
    },

    #[error("{requested_by} needs `{{{placeholder}}}`, which has no value")]
    #[diagnostic(code(mooring::resolve::missing_value))]
    MissingValue {
        placeholder: String,
        requested_by: String,
    },

    #[error("{requested_by} has no entry for toolchain `{toolchain}`")]
    #[diagnostic(code(mooring::resolve::unsupported_combination))]
    UnsupportedCombination {
        requested_by: String,
        toolchain: String,
        message: String,
    },

    #[error("dependency `{dependency}` version {found} does not satisfy `{required}`")]
    #[diagnostic(code(mooring::resolve::dependency_version))]
    DependencyVersion {
        dependency: String,
        required: String,
        found: String,
    },
}

impl ResolveError {
    /// Attach the requesting step to a template rendering failure.
    pub fn from_render(err: RenderError, requested_by: impl Into<String>) -> Self {
        let requested_by = requested_by.into();
        match err {
            RenderError::MissingDependency { dependency } => ResolveError::MissingDependency {
                dependency,
                field: None,
                requested_by,
            },
            RenderError::MissingField { dependency, field } => ResolveError::MissingDependency {
                dependency,
                field: Some(field),
                requested_by,
            },
            RenderError::MissingValue { placeholder } => ResolveError::MissingValue {
                placeholder,
                requested_by,
            },
        }
    }

    /// The identifier of the rule, option or dependency responsible.
    pub fn subject(&self) -> &str {
        match self {
            ResolveError::Conflict { rule, .. } => rule,
            ResolveError::MissingDependency { dependency, .. }
            | ResolveError::DependencyVersion { dependency, .. } => dependency,
            ResolveError::MissingValue { placeholder, .. } => placeholder,
            ResolveError::UnsupportedCombination { requested_by, .. } => requested_by,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::Conflict { rule, message } => {
                Diagnostic::error(format!("configuration rejected by rule `{}`", rule))
                    .with_context(message.clone())
                    .with_suggestion("Change the options or toolchain named by the rule")
            }

            ResolveError::MissingDependency {
                dependency,
                field,
                requested_by,
            } => {
                let mut diag = match field {
                    Some(field) => Diagnostic::error(format!(
                        "dependency `{}` was provided without `{}`",
                        dependency, field
                    )),
                    None => Diagnostic::error(format!(
                        "dependency `{}` was not provided",
                        dependency
                    )),
                };
                diag = diag.with_context(format!("required by {}", requested_by));
                diag.with_suggestion(format!(
                    "Add a `[{}]` table to the dependency file or pass `--dep {}=<prefix>`",
                    dependency, dependency
                ))
            }

            ResolveError::MissingValue {
                placeholder,
                requested_by,
            } => Diagnostic::error(format!("no value for `{{{}}}`", placeholder))
                .with_context(format!("required by {}", requested_by))
                .with_suggestion("Pass the staging directories (--source, --prefix) or a versioned toolchain"),

            ResolveError::UnsupportedCombination {
                requested_by,
                toolchain,
                message,
            } => Diagnostic::error(format!(
                "{} does not support toolchain `{}`",
                requested_by, toolchain
            ))
            .with_context(message.clone())
            .with_suggestion("Build with a supported compiler family"),

            ResolveError::DependencyVersion {
                dependency,
                required,
                found,
            } => Diagnostic::error(format!("incompatible version of `{}`", dependency))
                .with_context(format!("required: {}", required))
                .with_context(format!("provided: {}", found))
                .with_suggestion(format!("Provide a build of `{}` matching `{}`", dependency, required)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_diagnostic() {
        let err = ResolveError::Conflict {
            rule: "parallel-linalg-requires-mpi".to_string(),
            message: "Parallel linear algebra available only with +mpi".to_string(),
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("parallel-linalg-requires-mpi"));
        assert!(output.contains("only with +mpi"));
        assert_eq!(err.subject(), "parallel-linalg-requires-mpi");
    }

    #[test]
    fn test_missing_dependency_from_render() {
        let err = ResolveError::from_render(
            RenderError::MissingDependency {
                dependency: "scalapack".to_string(),
            },
            "option `linalg`",
        );

        assert_eq!(err.subject(), "scalapack");
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("`scalapack` was not provided"));
        assert!(output.contains("option `linalg`"));
        assert!(output.contains("--dep scalapack=<prefix>"));
    }
}
