//! Validation Results
//!
//! Per-parameter outcomes of a phase, plus the resolved values handed to
//! the executor and to downstream alias propagation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ParameterError};
use crate::params::schema::Direction;

/// Validation phase that produced a result.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Prevalidate,
    ValidateInputs,
    ValidateOutputs,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Prevalidate => write!(f, "prevalidation"),
            Phase::ValidateInputs => write!(f, "input validation"),
            Phase::ValidateOutputs => write!(f, "output validation"),
        }
    }
}

/// Outcome for a single parameter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ParameterOutcome {
    pub name: String,
    pub direction: Direction,
    pub passed: bool,
    /// Paths (or plain values) used for this phase
    pub resolved_value: Vec<String>,
    /// True if `resolved_value` came from a glob expansion
    pub from_glob: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ParameterError>,
}

impl ParameterOutcome {
    pub fn pass(
        name: impl Into<String>,
        direction: Direction,
        resolved_value: Vec<String>,
        from_glob: bool,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            passed: true,
            resolved_value,
            from_glob,
            error: None,
        }
    }

    pub fn fail(
        name: impl Into<String>,
        direction: Direction,
        resolved_value: Vec<String>,
        from_glob: bool,
        error: ParameterError,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            passed: false,
            resolved_value,
            from_glob,
            error: Some(error),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

/// Result of one validation phase for one step.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ValidationResult {
    pub step: String,
    pub phase: Phase,
    pub parameters: Vec<ParameterOutcome>,
    pub checked_at: DateTime<Utc>,
}

impl ValidationResult {
    pub fn new(step: impl Into<String>, phase: Phase) -> Self {
        Self {
            step: step.into(),
            phase,
            parameters: Vec::new(),
            checked_at: Utc::now(),
        }
    }

    pub fn push(&mut self, outcome: ParameterOutcome) {
        self.parameters.push(outcome);
    }

    /// True only if every parameter passed.
    pub fn passed(&self) -> bool {
        self.parameters.iter().all(|p| p.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ParameterOutcome> {
        self.parameters.iter().filter(|p| !p.passed)
    }

    pub fn get(&self, name: &str) -> Option<&ParameterOutcome> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Resolved value of every parameter, passed or not.
    pub fn resolved(&self) -> BTreeMap<String, Vec<String>> {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.resolved_value.clone()))
            .collect()
    }

    /// Resolved values of glob-tagged outputs, for alias propagation.
    pub fn resolved_outputs(&self) -> BTreeMap<String, Vec<String>> {
        self.parameters
            .iter()
            .filter(|p| p.direction == Direction::Output && p.from_glob && p.passed)
            .map(|p| (p.name.clone(), p.resolved_value.clone()))
            .collect()
    }

    /// One line per failure, for logs and error messages.
    pub fn failure_summary(&self) -> String {
        self.failures()
            .map(|p| match &p.error {
                Some(err) => format!("{}.{}: {}", self.step, p.name, err),
                None => format!("{}.{}: failed", self.step, p.name),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
