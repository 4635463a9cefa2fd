//! Problems collected while building a model.
//!
//! Every stage of the build pipeline reports into a [`ProblemCollector`]
//! instead of failing eagerly. `Fatal` problems abort the current phase
//! immediately; `Error` problems abort at the next phase boundary; `Warning`
//! problems are informational. Each problem carries the validation gate at
//! which it applies, the id of the model it was reported against, and an
//! optional source location.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::location::InputLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

/// Validation levels, usable both as a request's level and as a problem's
/// gate. A check gated at a level only applies when the request's level is
/// at least that new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    /// Structural checks only; used for parent and import sub-builds.
    Minimal,
    Maven20,
    Maven30,
    Maven31,
    Maven37,
    Strict,
}

impl ValidationLevel {
    /// The base gate: checks that apply at every level.
    pub const BASE: ValidationLevel = ValidationLevel::Minimal;
}

impl Default for ValidationLevel {
    fn default() -> Self {
        ValidationLevel::Strict
    }
}

/// A single diagnostic reported during a build.
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    pub severity: Severity,
    pub gate: ValidationLevel,
    /// Model id (or source location string) this problem was reported against.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<InputLocation>,
    pub message: String,
    /// Rendered cause chain of an underlying error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Already recovered from; exempt from the failure gates.
    #[serde(skip)]
    recovered: bool,
}

impl Problem {
    pub fn new(severity: Severity, gate: ValidationLevel, message: impl Into<String>) -> Self {
        Self {
            severity,
            gate,
            source: String::new(),
            location: None,
            message: message.into(),
            cause: None,
            recovered: false,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_location(mut self, location: Option<InputLocation>) -> Self {
        self.location = location;
        self
    }

    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.severity)?;
        if !self.source.is_empty() {
            write!(f, "{}: ", self.source)?;
        }
        f.write_str(&self.message)?;
        if let Some(location) = &self.location {
            write!(f, " @ {}", location)?;
        }
        Ok(())
    }
}

/// Accumulates problems for one build request.
///
/// Collection is monotonic: problems are only ever appended. The collector
/// tracks the "current" source id so pipeline stages do not have to thread
/// it through every call.
#[derive(Debug, Default)]
pub struct ProblemCollector {
    problems: Vec<Problem>,
    source: Option<String>,
    root_model_id: Option<String>,
    has_error: bool,
    has_fatal: bool,
}

impl ProblemCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the id all subsequently added problems are attributed to, unless
    /// they carry their own.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    pub fn set_root_model_id(&mut self, id: impl Into<String>) {
        self.root_model_id = Some(id.into());
    }

    pub fn root_model_id(&self) -> Option<&str> {
        self.root_model_id.as_deref()
    }

    pub fn add(&mut self, mut problem: Problem) {
        if problem.source.is_empty()
            && let Some(source) = &self.source
        {
            problem.source = source.clone();
        }
        if !problem.recovered {
            match problem.severity {
                Severity::Fatal => self.has_fatal = true,
                Severity::Error => self.has_error = true,
                Severity::Warning => {}
            }
        }
        self.problems.push(problem);
    }

    /// Append a diagnostic that the pipeline has already recovered from.
    /// It keeps its severity for reporting but does not trip the
    /// phase-boundary failure gates, not even when carried into a later
    /// phase.
    pub fn add_recovered(&mut self, mut problem: Problem) {
        problem.recovered = true;
        self.add(problem);
    }

    pub fn add_all(&mut self, problems: impl IntoIterator<Item = Problem>) {
        for problem in problems {
            self.add(problem);
        }
    }

    /// True when any problem is ERROR or FATAL.
    pub fn has_errors(&self) -> bool {
        self.has_error || self.has_fatal
    }

    pub fn has_fatal_errors(&self) -> bool {
        self.has_fatal
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
    }
}

/// The error surfaced to callers when a build cannot produce an effective
/// model. Carries everything the collector accumulated.
#[derive(Debug, Error)]
#[error("{} problem(s) encountered while building the effective model for {model_id}", problems.len())]
pub struct ModelBuildError {
    pub model_id: String,
    pub problems: Vec<Problem>,
}

impl ModelBuildError {
    pub fn new(model_id: impl Into<String>, problems: Vec<Problem>) -> Self {
        Self {
            model_id: model_id.into(),
            problems,
        }
    }
}
