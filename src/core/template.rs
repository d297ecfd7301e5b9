//! Argument and environment templates.
//!
//! A template is a string with `{scope.field}` placeholders, e.g.
//! `--with-scalapack-libs={scalapack.libs}` or
//! `--enable-cuda=cuda{cuda.version},cc{options.cc}`. Templates are parsed
//! when a recipe is loaded and rendered once per resolution.

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::configuration::Configuration;
use crate::core::dependency::DependencyTable;
use crate::core::toolchain::Toolchain;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z0-9_-]+)\.([A-Za-z0-9_.-]+)\}").expect("placeholder regex is valid")
});

/// Error parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid template `{template}`: {reason}")]
pub struct TemplateParseError {
    pub template: String,
    pub reason: String,
}

/// Error rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("dependency `{dependency}` was not provided")]
    MissingDependency { dependency: String },

    #[error("dependency `{dependency}` has no `{field}`")]
    MissingField { dependency: String, field: String },

    #[error("no value for `{{{placeholder}}}`")]
    MissingValue { placeholder: String },
}

/// Where a placeholder takes its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Options,
    Toolchain,
    Package,
    Stage,
    Dependency(String),
}

impl Scope {
    fn from_name(name: &str) -> Scope {
        match name {
            "options" => Scope::Options,
            "toolchain" => Scope::Toolchain,
            "package" => Scope::Package,
            "stage" => Scope::Stage,
            dep => Scope::Dependency(dep.to_string()),
        }
    }
}

/// A `{scope.field}` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub scope: Scope,
    pub field: String,
    raw: String,
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Template {
    raw: String,
    segments: Vec<Segment>,
}

/// Staging directories supplied with a build request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub source: Option<PathBuf>,
    pub build: Option<PathBuf>,
    pub prefix: Option<PathBuf>,
}

/// Values available while rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub package: &'a str,
    pub config: &'a Configuration,
    pub toolchain: &'a Toolchain,
    pub deps: &'a DependencyTable,
    pub stage: &'a Stage,
}

impl Template {
    pub fn parse(raw: &str) -> Result<Template, TemplateParseError> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(raw) {
            let whole = caps.get(0).expect("capture 0 always exists");
            if whole.start() > last {
                segments.push(Segment::Literal(raw[last..whole.start()].to_string()));
            }
            segments.push(Segment::Placeholder(Placeholder {
                scope: Scope::from_name(&caps[1]),
                field: caps[2].to_string(),
                raw: whole.as_str().to_string(),
            }));
            last = whole.end();
        }
        if last < raw.len() {
            segments.push(Segment::Literal(raw[last..].to_string()));
        }

        for segment in &segments {
            if let Segment::Literal(text) = segment {
                if text.contains('{') || text.contains('}') {
                    return Err(TemplateParseError {
                        template: raw.to_string(),
                        reason: "braces must enclose a `{scope.field}` placeholder".into(),
                    });
                }
            }
        }

        Ok(Template {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Every placeholder, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(p) => Some(p),
            Segment::Literal(_) => None,
        })
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(p) => out.push_str(&lookup(p, ctx)?),
            }
        }
        Ok(out)
    }
}

fn lookup(p: &Placeholder, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
    let missing = || RenderError::MissingValue {
        placeholder: format!("{}.{}", scope_name(&p.scope), p.field),
    };

    match &p.scope {
        Scope::Options => ctx
            .config
            .get(&p.field)
            .map(|v| v.to_string())
            .ok_or_else(missing),
        Scope::Toolchain => match p.field.as_str() {
            "family" => Ok(ctx.toolchain.family.to_string()),
            "version" => ctx
                .toolchain
                .version
                .as_ref()
                .map(|v| v.to_string())
                .ok_or_else(missing),
            _ => Err(missing()),
        },
        Scope::Package => match p.field.as_str() {
            "name" => Ok(ctx.package.to_string()),
            "version" => Ok(ctx.config.version().to_string()),
            _ => Err(missing()),
        },
        Scope::Stage => {
            let path = match p.field.as_str() {
                "source" => ctx.stage.source.as_ref(),
                "build" => ctx.stage.build.as_ref(),
                "prefix" => ctx.stage.prefix.as_ref(),
                _ => None,
            };
            path.map(|p| p.display().to_string()).ok_or_else(missing)
        }
        Scope::Dependency(name) => {
            let dep = ctx
                .deps
                .get(name)
                .ok_or_else(|| RenderError::MissingDependency {
                    dependency: name.clone(),
                })?;
            dep.field(&p.field).ok_or_else(|| RenderError::MissingField {
                dependency: name.clone(),
                field: p.field.clone(),
            })
        }
    }
}

fn scope_name(scope: &Scope) -> &str {
    match scope {
        Scope::Options => "options",
        Scope::Toolchain => "toolchain",
        Scope::Package => "package",
        Scope::Stage => "stage",
        Scope::Dependency(name) => name,
    }
}

impl TryFrom<String> for Template {
    type Error = TemplateParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Template::parse(&value)
    }
}

impl From<Template> for String {
    fn from(t: Template) -> Self {
        t.raw
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
