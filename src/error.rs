//! Error Types
//!
//! Fatal errors are returned as `Err`; per-parameter failures are collected
//! into [`ParameterError`] values so sibling parameters are still checked.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a parameter failure, reported alongside its message.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed glob syntax
    InvalidPattern,
    /// Glob matched nothing while at least one match was required
    NoMatches,
    /// Glob operation on a literal, or literal operation on a glob
    MarkerMismatch,
    /// Step was never declared
    SnapshotMissing,
    /// Declared path does not exist
    Missing,
    /// Path has the wrong type or multiplicity
    TypeMismatch,
    /// Required parameter has no value
    Required,
    /// Value is not one of the allowed choices
    InvalidChoice,
    /// Glob has no expansion available from prevalidation
    Unresolved,
    /// Filesystem error while checking or expanding
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidPattern => "invalid pattern",
            Self::NoMatches => "no matches",
            Self::MarkerMismatch => "marker mismatch",
            Self::SnapshotMissing => "snapshot missing",
            Self::Missing => "missing",
            Self::TypeMismatch => "type mismatch",
            Self::Required => "required",
            Self::InvalidChoice => "invalid choice",
            Self::Unresolved => "unresolved glob",
            Self::Io => "i/o error",
        };
        f.write_str(name)
    }
}

/// A single parameter's failure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ParameterError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ParameterError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Failures of the glob marker and expander.
#[derive(Debug, Error)]
pub enum ExpansionError {
    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("glob pattern '{pattern}' matched no files")]
    NoMatches { pattern: String },

    #[error("expected a {expected} value, found a {found}")]
    MarkerMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("error reading '{}' while expanding '{pattern}': {source}", .path.display())]
    Io {
        pattern: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExpansionError {
    /// Returns the reporting category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPattern { .. } => ErrorKind::InvalidPattern,
            Self::NoMatches { .. } => ErrorKind::NoMatches,
            Self::MarkerMismatch { .. } => ErrorKind::MarkerMismatch,
            Self::Io { .. } => ErrorKind::Io,
        }
    }
}

impl From<ExpansionError> for ParameterError {
    fn from(err: ExpansionError) -> Self {
        ParameterError::new(err.kind(), err.to_string())
    }
}

/// Fatal errors aborting a whole validation phase.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhaseError {
    #[error("step '{step}' was never declared: no parameter snapshot available")]
    SnapshotMissing { step: String },

    #[error("step '{step}': cannot {action} while {state}")]
    Lifecycle {
        step: String,
        action: &'static str,
        state: String,
    },
}

impl PhaseError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::SnapshotMissing { .. } => Some(ErrorKind::SnapshotMissing),
            Self::Lifecycle { .. } => None,
        }
    }
}

/// Problems with a step's declaration itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("step '{step}' is already declared")]
    AlreadyDeclared { step: String },

    #[error("step '{step}': value supplied for unknown parameter '{name}'")]
    UnknownParameter { step: String, name: String },

    #[error("step '{step}': parameter '{name}' is declared as both input and output")]
    DuplicateParameter { step: String, name: String },
}
